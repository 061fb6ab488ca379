use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ModelOptions;

pub const DEFAULT_KEEP_ALIVE: &str = "5m";

/// Model-level settings of a [`Chat`](crate::Chat), without its log,
/// tools or transport.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Identifier or name of the model to use.
    pub model: String,
    /// Sampling and runtime parameters; only set fields are sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ModelOptions>,
    /// Output constraint: `"json"` or a JSON schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
    #[serde(default)]
    pub stream: bool,
    /// How long the server keeps the model loaded after a request.
    #[serde(default = "default_keep_alive")]
    pub keep_alive: String,
}

fn default_keep_alive() -> String {
    DEFAULT_KEEP_ALIVE.to_string()
}

impl ChatConfig {
    pub fn new<T: Into<String>>(model: T) -> Self {
        Self {
            model: model.into(),
            options: None,
            format: None,
            stream: false,
            keep_alive: default_keep_alive(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}
