//! Error types for the crld crate

use thiserror::Error;

/// Main error type for the crld crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("transition tensor rows must sum to 1 (state {state}, joint action {joint_action} sums to {sum})")]
    InvalidTransitionTensor {
        state: usize,
        joint_action: usize,
        sum: f64,
    },

    #[error("observation tensor rows must sum to 1 (agent {agent}, state {state} sums to {sum})")]
    InvalidObservationTensor { agent: usize, state: usize, sum: f64 },

    #[error("partially observable learning with final states is not defined")]
    FinalStatesUnsupported,

    #[error("shape mismatch for {tensor}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        tensor: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("parameter '{name}' has {got} entries but there are {expected} agents")]
    ParameterLength {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("parameter '{name}' value {value} is out of range ({expected})")]
    ParameterOutOfRange {
        name: String,
        value: f64,
        expected: String,
    },

    #[error("invalid policy: {message}")]
    InvalidPolicy { message: String },

    #[error("value equations are singular for agent {agent}")]
    SingularSystem { agent: usize },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("trajectory has no policies")]
    EmptyTrajectory,

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
