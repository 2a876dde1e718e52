use thiserror::Error;

// ---------------------------------------------------------------------------
// Configuration errors – surfaced at call time, never retried
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("epsilon must be a finite value > 0, got {0}")]
    InvalidEpsilon(f64),
    #[error("sensitivity must be a finite value > 0, got {0}")]
    InvalidSensitivity(f64),
    #[error("control fraction must lie strictly between 0 and 1, got {0}")]
    InvalidFraction(f64),
    #[error("attack budget must be at least 1")]
    ZeroAttacks,
}

// ---------------------------------------------------------------------------
// Pixel matrix errors – contained per row by the transform
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PixelError {
    #[error("malformed pixel text: {0}")]
    Parse(String),
    #[error("ragged pixel matrix: {0}")]
    Shape(String),
    #[error("non-numeric pixel value `{0}`")]
    NotNumeric(String),
    #[error("non-finite value at element {0}")]
    NonFinite(usize),
}

// ---------------------------------------------------------------------------
// Structural data errors – fatal to the invocation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("input must contain a '{0}' column")]
    MissingColumn(String),
}

// ---------------------------------------------------------------------------
// Evaluator errors – isolated per risk dimension
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluatorError {
    #[error("column '{column}' is missing from the {partition} partition")]
    MissingColumn { column: String, partition: &'static str },
    #[error("{partition} partition has {rows} rows, need at least {needed}")]
    InsufficientRows {
        partition: &'static str,
        rows: usize,
        needed: usize,
    },
    #[error("invalid evaluator configuration: {0}")]
    InvalidConfig(String),
    #[error("evaluator panicked: {0}")]
    Panicked(String),
    #[error("evaluator returned risk {0}, expected a value in [0, 1]")]
    RiskOutOfRange(f64),
}
