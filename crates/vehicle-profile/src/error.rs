//! Profile Error Types

use mode21_codec::FormulaError;
use thiserror::Error;

/// Errors loading or validating a vehicle profile
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Profile file could not be read
    #[error("failed to read profile file: {0}")]
    Io(#[from] std::io::Error),

    /// Profile JSON failed to deserialize
    #[error("failed to parse profile JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A PID's decode formula was rejected by the expression parser
    #[error("invalid formula for PID '{pid}': {source}")]
    InvalidFormula {
        pid: String,
        #[source]
        source: FormulaError,
    },

    /// Two PID entries share the same id
    #[error("duplicate PID id '{0}' in profile")]
    DuplicatePid(String),

    /// Requested builtin profile does not exist
    #[error("unknown builtin profile '{0}'")]
    UnknownBuiltin(String),
}
