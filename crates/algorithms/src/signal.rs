//! Temporal forest-signal cleaning
//!
//! A signal is one pixel's yearly forestry-class series. Cleaning
//! removes one-year spikes between the two informative states and fills
//! uncertain years from their neighbors, so that change detection only
//! ever sees not-forest/forest runs.

use eoforest_core::{Error, Result};

/// No observation for the year
pub const NO_DATA: u8 = 0;
pub const NOT_FOREST: u8 = 1;
/// Mixed evidence, resolved during cleaning
pub const POSSIBLE_FOREST: u8 = 2;
pub const FOREST: u8 = 3;

/// Legacy fill value remapped to not-forest on entry
const LEGACY_FILL: u8 = 15;

fn informative(v: u8) -> bool {
    v == NOT_FOREST || v == FOREST
}

fn uncertain(v: u8) -> bool {
    v == NO_DATA || v == POSSIBLE_FOREST
}

/// Clean a signal in place.
///
/// Spikes are single years that contradict an identical neighbor pair;
/// they are smoothed before and after gap filling. Gap filling repeats
/// until every uncertain year is resolved; a pass that resolves nothing
/// aborts with [`Error::SignalUnresolved`] rather than spinning.
pub fn clean_signal(signal: &mut [u8]) -> Result<()> {
    for v in signal.iter_mut() {
        if *v == LEGACY_FILL {
            *v = NOT_FOREST;
        }
    }
    if signal.len() >= 4 {
        smooth_spikes(signal);
    }
    fill_gaps(signal)?;
    if signal.len() >= 4 {
        smooth_spikes(signal);
    }
    Ok(())
}

fn find_spikes(signal: &[u8]) -> Vec<usize> {
    (1..signal.len() - 1)
        .filter(|&i| {
            informative(signal[i])
                && informative(signal[i - 1])
                && signal[i] != signal[i - 1]
                && signal[i - 1] == signal[i + 1]
        })
        .collect()
}

/// One spike-smoothing pass. Spikes are located up front; resolution
/// then reads the signal as it mutates, matching the cascade of
/// neighbor checks the decision rules were tuned on.
fn smooth_spikes(signal: &mut [u8]) {
    let len = signal.len();
    for i in find_spikes(signal) {
        if i == 1 {
            signal[i] = if signal[i + 1] == signal[i + 2] {
                signal[i + 1]
            } else {
                FOREST
            };
        } else if i < len - 2 && signal[i - 1] == signal[i - 2] && signal[i + 1] == signal[i + 2] {
            signal[i] = signal[i - 1];
        }
        if i > 1 && i < len - 2 {
            if signal[i - 2] == signal[i - 1] || signal[i + 1] == signal[i + 2] {
                signal[i] = signal[i - 1];
            } else if informative(signal[i - 2]) || informative(signal[i + 2]) {
                signal[i] = FOREST;
            }
        } else if i == len - 2 {
            signal[i] = if signal[i - 1] == signal[i - 2] {
                signal[i - 1]
            } else {
                FOREST
            };
        }
    }
}

/// Fill uncertain years from informative neighbors, repeating until
/// none remain. Each pass works from the positions found at its start,
/// so a fill can cascade into the next pass.
fn fill_gaps(signal: &mut [u8]) -> Result<()> {
    let len = signal.len();
    if len < 2 {
        let remaining = signal.iter().filter(|&&v| uncertain(v)).count();
        if remaining > 0 {
            return Err(Error::SignalUnresolved { remaining });
        }
        return Ok(());
    }

    let mut pending: Vec<usize> = (0..len).filter(|&i| uncertain(signal[i])).collect();
    while !pending.is_empty() {
        for &i in &pending {
            if i == 0 {
                if informative(signal[1]) {
                    signal[0] = signal[1];
                }
            } else if i == 1 {
                if informative(signal[0]) {
                    signal[1] = signal[0];
                } else if len > 2 && informative(signal[2]) {
                    signal[1] = signal[2];
                }
            } else if i < len - 2 {
                let (prev, next) = (signal[i - 1], signal[i + 1]);
                if prev == next && prev != signal[i] && informative(prev) {
                    signal[i] = prev;
                } else if uncertain(signal[i]) && (prev == FOREST || next == FOREST) {
                    signal[i] = FOREST;
                } else if uncertain(signal[i]) && (prev == NOT_FOREST || next == NOT_FOREST) {
                    signal[i] = NOT_FOREST;
                }
            } else if i == len - 2 {
                if signal[len - 3] == FOREST || signal[len - 1] == FOREST {
                    signal[len - 2] = FOREST;
                } else if signal[len - 3] == NOT_FOREST || signal[len - 1] == NOT_FOREST {
                    signal[len - 2] = NOT_FOREST;
                }
            } else if informative(signal[len - 2]) {
                signal[len - 1] = signal[len - 2];
            }
        }
        let remaining: Vec<usize> = (0..len).filter(|&i| uncertain(signal[i])).collect();
        if remaining.len() == pending.len() {
            return Err(Error::SignalUnresolved {
                remaining: remaining.len(),
            });
        }
        pending = remaining;
    }
    Ok(())
}
