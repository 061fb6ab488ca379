pub mod chat;
pub mod conversation;
pub(crate) mod services;
pub mod tools;

pub use chat::*;
pub use conversation::{ChatMessages, ConversationStats, LogError};
pub use tools::*;

pub use serde_json::{json, Value};
pub use services::llm::models::base::{encode_image, Message, MessageRecord, Role, ToolCall, ToolCallFunction};
pub use services::llm::models::chat::{ChatRequest, ChatResponse, ResponseMetrics};
pub use services::llm::models::errors::{ModelClientError, ValidationError};
pub use services::llm::models::options::ModelOptions;
pub use services::llm::{ClientConfig, OllamaClient, Transport, TransportFuture, DEFAULT_BASE_URL};
pub use services::logging::init_default_tracing;
