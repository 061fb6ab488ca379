use thiserror::Error;

/// Failures surfaced by a [`Transport`](crate::Transport) while talking to the model server.
#[derive(Debug, Error)]
pub enum ModelClientError {
    /// The server could not be reached.
    #[error("Request Error: {0}")]
    Request(String),
    /// The server answered, but reported an error (non-2xx status or an `error` field).
    #[error("API Error: {0}")]
    Api(String),
    /// The body was not valid JSON, or did not have the expected shape.
    #[error("Serialization Error: {0}")]
    Serialization(String),
    /// The client was configured with unusable settings.
    #[error("Config Error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ModelClientError {
    fn from(err: reqwest::Error) -> Self {
        ModelClientError::Request(err.to_string())
    }
}

/// Input that was rejected before anything was executed or sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid role '{0}'. Must be one of: system, user, assistant, tool")]
    InvalidRole(String),
    #[error("Tool messages require a tool_call_id")]
    MissingToolCallId,
    #[error("Only tool messages may carry a tool_call_id (role was '{role}')")]
    UnexpectedToolCallId { role: String },
    #[error("Missing required parameter '{parameter}' for tool '{tool}'")]
    MissingParameter { tool: String, parameter: String },
    #[error("Parameter '{parameter}' of tool '{tool}' must be of type {expected}, got {actual}")]
    WrongType {
        tool: String,
        parameter: String,
        expected: String,
        actual: String,
    },
    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },
    #[error("Malformed message record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },
}
