use crate::parameters::{BoundsError, ExpressionError, ParameterError};
use thiserror::Error;

/// Error types for the specfit-rs library.
#[derive(Error, Debug)]
pub enum SpecFitError {
    /// The expression could not be parsed, evaluated, or differentiated.
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    /// Error for parameter-related problems.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// Error for boundary constraint violations.
    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),

    /// The parameter under test does not occur in the expression.
    #[error("Symbol '{symbol}' does not occur in expression '{expression}'")]
    UnknownSymbol { symbol: String, expression: String },

    /// Parameter not found.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// Component not found in a model.
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// A linear solver was requested for a model with non-linear free parameters.
    #[error("Model is not linear in its free parameters: {}", .parameters.join(", "))]
    NonLinearModel { parameters: Vec<String> },

    /// Mismatched lengths of parameter vectors or data arrays.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for specfit-rs operations.
pub type Result<T> = std::result::Result<T, SpecFitError>;
