use std::fmt;

/// Result type for deepq operations
pub type Result<T> = std::result::Result<T, DqnError>;

/// Main error type for the deepq library
#[derive(Debug, Clone, PartialEq)]
pub enum DqnError {
    /// Sampling requested more experiences than the buffer holds
    InsufficientData {
        requested: usize,
        available: usize,
    },

    /// Online and target estimators differ in parameter count or shape
    StructuralMismatch {
        expected: String,
        actual: String,
    },

    /// Loss or gradient became NaN or infinite
    NonFiniteValue(String),

    /// Invalid dimensions for operations
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid parameter value
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Invalid action
    InvalidAction {
        action: usize,
        max_actions: usize,
    },

    /// Training error
    TrainingError(String),

    /// IO errors (config files)
    IoError(String),

    /// Serialization/deserialization errors
    SerializationError(String),
}

impl fmt::Display for DqnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DqnError::InsufficientData { requested, available } => {
                write!(f, "Insufficient data: requested {} experiences, buffer holds {}", requested, available)
            }
            DqnError::StructuralMismatch { expected, actual } => {
                write!(f, "Structural mismatch between estimators: expected {}, got {}", expected, actual)
            }
            DqnError::NonFiniteValue(msg) => write!(f, "Non-finite value: {}", msg),
            DqnError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            DqnError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            DqnError::InvalidAction { action, max_actions } => {
                write!(f, "Invalid action {}: must be less than {}", action, max_actions)
            }
            DqnError::TrainingError(msg) => write!(f, "Training error: {}", msg),
            DqnError::IoError(msg) => write!(f, "IO error: {}", msg),
            DqnError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for DqnError {}

impl From<std::io::Error> for DqnError {
    fn from(err: std::io::Error) -> Self {
        DqnError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for DqnError {
    fn from(err: serde_json::Error) -> Self {
        DqnError::SerializationError(err.to_string())
    }
}

// Helper functions for common error patterns
impl DqnError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        DqnError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        DqnError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn structural_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        DqnError::StructuralMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
