use rust_decimal::Decimal;
use thiserror::Error;

/// Unified error type for the entire tfsa-tracker-core library.
/// Every public fallible function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Storage / File ──────────────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIo(String),

    /// File exists but its contents could not be understood.
    /// Distinct from file-absent, which loaders treat as "empty".
    #[error("Malformed file {path}: {reason}")]
    MalformedFile { path: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Ledger / Holdings ───────────────────────────────────────────
    /// Sell exceeds the held quantity, or sell of a never-held instrument.
    /// Raised by the full-replay path. Fatal to the single operation.
    #[error("Insufficient position in {instrument}: sell of {requested} exceeds held {held}")]
    InsufficientPosition {
        instrument: String,
        requested: Decimal,
        held: Decimal,
    },

    /// Same family as `InsufficientPosition`, raised by the incremental
    /// trade applier before anything is mutated.
    #[error("Oversell on {instrument}: {requested} requested, {held} held")]
    Oversell {
        instrument: String,
        requested: Decimal,
        held: Decimal,
    },

    /// Buying into an existing position in a different currency would mix
    /// currency lots under one average cost.
    #[error("Currency mismatch for {instrument}: position is {held}, trade is {trade}")]
    CurrencyMismatch {
        instrument: String,
        held: String,
        trade: String,
    },

    /// Executed fills do not reconcile against the planned trades.
    #[error("Fill mismatch for {instrument}: {reason}")]
    FillMismatch { instrument: String, reason: String },

    // ── Validation ──────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    // ── Undo ────────────────────────────────────────────────────────
    #[error("Nothing to undo: {0}")]
    NothingToUndo(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIo(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<csv::Error> for CoreError {
    fn from(e: csv::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}
