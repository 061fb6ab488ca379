use thiserror::Error;

use crate::{
    conversation::LogError,
    services::llm::{ModelClientError, ValidationError},
    ToolBuilderError, ToolExecutionError,
};

/// Errors that can occur while running a [`Chat`](crate::Chat).
#[derive(Debug, Error)]
pub enum ChatError {
    /// Failure inside the transport.
    #[error("Model client error: {0}")]
    ModelClient(#[from] ModelClientError),
    /// Bad input, caught before anything was sent.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    /// Manual tool dispatch failed.
    #[error("Tool error: {0}")]
    Tool(#[from] ToolExecutionError),
    #[error("Tool definition error: {0}")]
    ToolBuild(#[from] ToolBuilderError),
    #[error("Conversation log error: {0}")]
    Log(#[from] LogError),
    /// A tool was requested but the chat has no registry.
    #[error("No tool registry configured")]
    NoToolRegistry,
    /// The model kept asking for tools past the iteration cap.
    #[error("Maximum tool call iterations ({0}) exceeded")]
    MaxIterations(usize),
    /// The reply did not deserialize into the requested type.
    #[error("Deserialize error: {0}")]
    Deserialization(#[from] serde_json::Error),
    #[error("Chat build error: {0}")]
    Build(#[from] ChatBuildError),
}

/// Errors that can occur while building a [`Chat`](crate::Chat).
#[derive(Debug, Error)]
pub enum ChatBuildError {
    /// Provided JSON schema for the response format could not be parsed.
    #[error("Invalid JSON schema provided: {0}")]
    InvalidJsonSchema(String),
    #[error("Model not set.")]
    ModelNotSet,
    /// The default HTTP transport could not be created.
    #[error("Model client error: {0}")]
    ModelClient(#[from] ModelClientError),
}
