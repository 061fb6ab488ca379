use thiserror::Error;

use crate::ValidationError;

/// Errors that can occur during execution of a tool.
///
/// A lookup failure ([`ToolExecutionError::ToolNotFound`]) is kept apart from
/// argument problems ([`ToolExecutionError::Validation`]) so callers can tell
/// "doesn't exist" from "exists but called wrong".
#[derive(Debug, Error)]
pub enum ToolExecutionError {
    /// The requested tool is not registered.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),
    /// The arguments did not satisfy the tool's schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The tool ran and failed.
    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),
}

impl ToolExecutionError {
    pub fn failed<T: std::fmt::Display>(reason: T) -> Self {
        ToolExecutionError::ExecutionFailed(reason.to_string())
    }

    pub fn is_lookup(&self) -> bool {
        matches!(self, ToolExecutionError::ToolNotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ToolExecutionError::Validation(_))
    }
}

/// Problems detected while assembling a [`Tool`](crate::Tool).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolBuilderError {
    #[error("Function name is required.")]
    MissingFunctionName,
    #[error("Function description is required.")]
    MissingFunctionDescription,
    #[error("Executor function is required for the tool.")]
    MissingExecutor,
    #[error("Required parameter '{0}' is not declared in properties.")]
    UndeclaredRequiredProperty(String),
    #[error("Invalid declaration for parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
}
