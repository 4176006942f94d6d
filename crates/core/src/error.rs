//! Error types for the eoforest pipeline

use thiserror::Error;

/// Main error type for eoforest operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Invalid scene identifier: {0}")]
    BadSceneId(String),

    #[error("Unknown sensor prefix: {0}")]
    UnknownSensor(String),

    #[error("Header parse error in {path}: {reason}")]
    HeaderParse { path: String, reason: String },

    #[error("Header data type {found} does not match requested element type {expected}")]
    DataTypeMismatch { expected: u8, found: u8 },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Signal/year length mismatch: {signal} values for {years} years")]
    SignalLengthMismatch { signal: usize, years: usize },

    #[error("Temporal signal could not be repaired: {remaining} uncertain values left")]
    SignalUnresolved { remaining: usize },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
