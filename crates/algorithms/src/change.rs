//! Forest-change detection over yearly class signals
//!
//! Given one pixel's cleaned forestry-class series, works out when it
//! was afforested, clearcut or reforested and summarizes the history
//! into a status code.

use crate::signal::{self, FOREST, NOT_FOREST};
use eoforest_core::{Error, Result};

/// Per-pixel change summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    NoData = 0,
    Unforested = 1,
    /// Forested for the whole series
    Forested = 2,
    /// Clearcut at least 10 years before the series end
    Deforestation = 3,
    /// Clearcut 5 to 9 years before the series end
    PossibleDeforestation = 4,
    /// Clearcut within the last 5 years
    RecentClearcut = 5,
    Reforestation = 6,
    Afforestation = 7,
}

impl ChangeStatus {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Detected change events for one pixel. Event years are 0 when the
/// event never happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRecord {
    pub start_class: u8,
    pub end_class: u8,
    pub afforested: i32,
    pub clearcut: i32,
    pub reforested: i32,
    pub status: ChangeStatus,
    pub status_year: i32,
}

impl Default for ChangeRecord {
    fn default() -> Self {
        Self {
            start_class: 0,
            end_class: 0,
            afforested: 0,
            clearcut: 0,
            reforested: 0,
            status: ChangeStatus::NoData,
            status_year: 0,
        }
    }
}

/// Number of years since a clearcut below which it counts as recent
const RECENT_CUT_YEARS: i32 = 5;
/// Years since a clearcut beyond which it is confirmed deforestation
const DEFORESTED_YEARS: i32 = 10;

/// Analyse one pixel's yearly class series.
///
/// The signal is cleaned first if it mixes informative and uncertain
/// years. The most recent clearcut and the most recent forest
/// establishment are found by scanning backwards; a clearcut later
/// than the last establishment decides the deforestation statuses.
pub fn detect_change(signal: &[u8], years: &[i32], end_year: i32) -> Result<ChangeRecord> {
    if signal.len() != years.len() {
        return Err(Error::SignalLengthMismatch {
            signal: signal.len(),
            years: years.len(),
        });
    }
    if signal.is_empty() {
        return Ok(ChangeRecord::default());
    }

    let mut series = signal.to_vec();
    let has_informative = series.iter().any(|&v| v == NOT_FOREST || v == FOREST);
    let has_uncertain = series
        .iter()
        .any(|&v| v == signal::NO_DATA || v == signal::POSSIBLE_FOREST);
    if has_informative && has_uncertain {
        signal::clean_signal(&mut series)?;
    }

    let mut record = ChangeRecord {
        start_class: series[0],
        end_class: series[series.len() - 1],
        ..ChangeRecord::default()
    };

    let has_forest = series.contains(&FOREST);
    let has_clear = series.contains(&NOT_FOREST);

    if has_forest && has_clear {
        if series[0] == NOT_FOREST {
            // Safe: has_forest
            if let Some(idx) = series.iter().position(|&v| v == FOREST) {
                record.afforested = years[idx];
            }
        }

        let mut cut = false;
        let mut refor = false;
        for i in (1..series.len()).rev() {
            if series[i] == FOREST && series[i - 1] == NOT_FOREST {
                let year = years[i];
                if year > record.afforested
                    && (record.afforested > 0 || series[0] == FOREST)
                    && !refor
                {
                    record.reforested = year;
                    refor = true;
                }
            } else if series[i] == NOT_FOREST && series[i - 1] == FOREST {
                record.clearcut = years[i];
                cut = true;
            }
            if refor && cut {
                break;
            }
        }

        let last_forest = record.reforested.max(record.afforested);
        if record.clearcut > last_forest {
            let age = end_year - record.clearcut;
            record.status = if age < RECENT_CUT_YEARS {
                ChangeStatus::RecentClearcut
            } else if age < DEFORESTED_YEARS {
                ChangeStatus::PossibleDeforestation
            } else {
                ChangeStatus::Deforestation
            };
            record.status_year = record.clearcut;
        } else if record.reforested > record.afforested {
            record.status = ChangeStatus::Reforestation;
            record.status_year = record.reforested;
        } else if record.afforested > 0 {
            record.status = ChangeStatus::Afforestation;
            record.status_year = record.afforested;
        }
    } else if has_forest && !series.contains(&signal::NO_DATA) {
        record.status = ChangeStatus::Forested;
    } else if has_clear && !series.contains(&signal::NO_DATA) {
        record.status = ChangeStatus::Unforested;
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn years(start: i32, len: usize) -> Vec<i32> {
        (0..len as i32).map(|i| start + i).collect()
    }

    #[test]
    fn test_uniform_forest() {
        let signal = [3u8; 10];
        let r = detect_change(&signal, &years(1990, 10), 1999).unwrap();
        assert_eq!(r.status, ChangeStatus::Forested);
        assert_eq!(r.start_class, 3);
        assert_eq!(r.end_class, 3);
        assert_eq!(r.status_year, 0);
    }

    #[test]
    fn test_uniform_not_forest() {
        let signal = [1u8; 10];
        let r = detect_change(&signal, &years(1990, 10), 1999).unwrap();
        assert_eq!(r.status, ChangeStatus::Unforested);
    }

    #[test]
    fn test_afforestation() {
        let signal = [1, 1, 1, 1, 3, 3, 3, 3, 3, 3];
        let r = detect_change(&signal, &years(1990, 10), 1999).unwrap();
        assert_eq!(r.status, ChangeStatus::Afforestation);
        assert_eq!(r.afforested, 1994);
        assert_eq!(r.status_year, 1994);
        assert_eq!(r.clearcut, 0);
        assert_eq!(r.reforested, 0);
    }

    #[test]
    fn test_old_clearcut_is_deforestation() {
        // Cut in 1993, series ends 2009
        let signal = [3, 3, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1];
        let r = detect_change(&signal, &years(1990, 20), 2009).unwrap();
        assert_eq!(r.status, ChangeStatus::Deforestation);
        assert_eq!(r.clearcut, 1993);
        assert_eq!(r.status_year, 1993);
    }

    #[test]
    fn test_recent_clearcut_grades_by_age() {
        let signal = [3, 3, 3, 3, 3, 3, 3, 3, 1, 1];
        // Cut in 1998, end 1999: one year ago
        let r = detect_change(&signal, &years(1990, 10), 1999).unwrap();
        assert_eq!(r.status, ChangeStatus::RecentClearcut);
        assert_eq!(r.clearcut, 1998);

        // Same cut viewed 7 years later
        let r = detect_change(&signal, &years(1990, 10), 2005).unwrap();
        assert_eq!(r.status, ChangeStatus::PossibleDeforestation);
    }

    #[test]
    fn test_reforestation_after_cut() {
        // Forest, cut in 1994, regrown from 1997
        let signal = [3, 3, 3, 3, 1, 1, 1, 3, 3, 3];
        let r = detect_change(&signal, &years(1990, 10), 1999).unwrap();
        assert_eq!(r.status, ChangeStatus::Reforestation);
        assert_eq!(r.clearcut, 1994);
        assert_eq!(r.reforested, 1997);
        assert_eq!(r.status_year, 1997);
    }

    #[test]
    fn test_afforested_then_cut() {
        // Planted 1993, cut 1997 and never regrown: clearcut wins
        let signal = [1, 1, 1, 3, 3, 3, 3, 1, 1, 1];
        let r = detect_change(&signal, &years(1990, 10), 1999).unwrap();
        assert_eq!(r.afforested, 1993);
        assert_eq!(r.clearcut, 1997);
        assert_eq!(r.reforested, 0);
        assert_eq!(r.status, ChangeStatus::RecentClearcut);
        assert_eq!(r.status_year, 1997);
    }

    #[test]
    fn test_uncertain_years_cleaned_before_analysis() {
        // Missing years inside the forest run do not break detection
        let signal = [3, 3, 0, 3, 3, 3, 3, 3, 1, 1];
        let r = detect_change(&signal, &years(1990, 10), 1999).unwrap();
        assert_eq!(r.status, ChangeStatus::RecentClearcut);
        assert_eq!(r.clearcut, 1998);
    }

    #[test]
    fn test_all_no_data() {
        let signal = [0u8; 10];
        let r = detect_change(&signal, &years(1990, 10), 1999).unwrap();
        assert_eq!(r.status, ChangeStatus::NoData);
        assert_eq!(r.start_class, 0);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(detect_change(&[3, 3], &[1990], 1999).is_err());
    }
}
