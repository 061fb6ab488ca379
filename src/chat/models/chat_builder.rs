use std::sync::Arc;

use schemars::{schema_for, JsonSchema};
use serde_json::Value;

use super::{
    configs::{ChatConfig, DEFAULT_KEEP_ALIVE},
    error::ChatBuildError,
    Chat,
};
use crate::{
    services::llm::{ClientConfig, ModelOptions, Transport},
    Tool, ToolRegistry,
};

/// A builder for [`Chat`].
///
/// All methods take `self` and return `Self`, so you can chain calls.
///
/// # Examples
///
/// ```rust,no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use ollama_chat::{ChatBuilder, ModelOptions};
///
/// let mut chat = ChatBuilder::default()
///     .set_model("llama3.2")
///     .set_system_prompt("Be concise")
///     .set_options(ModelOptions::new().temperature(0.2))
///     .with_common_tools()
///     .build()?;
///
/// let reply = chat.send_with_tools("What is 17 * 23?").await?;
/// println!("{}", reply.content());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ChatBuilder {
    model: Option<String>,
    client_config: Option<ClientConfig>,
    transport: Option<Arc<dyn Transport>>,
    system_prompt: Option<String>,
    options: Option<ModelOptions>,
    response_format: Option<Value>,
    response_format_raw: Option<String>,
    format_error: Option<String>,
    stream: Option<bool>,
    keep_alive: Option<String>,
    tool_registry: Option<Arc<ToolRegistry>>,
    tools: Vec<Tool>,
    common_tools: bool,
    auto_execute_tools: Option<bool>,
}

impl ChatBuilder {
    /// Select the underlying model name. (Required)
    pub fn set_model<T: Into<String>>(mut self, model: T) -> Self {
        self.model = Some(model.into());
        self
    }

    /// URL of the Ollama server. Defaults to `OLLAMA_HOST`, then `http://localhost:11434`.
    pub fn set_base_url<T: Into<String>>(mut self, url: T) -> Self {
        let cfg = self.client_config.take().unwrap_or_else(ClientConfig::from_env);
        self.client_config = Some(cfg.base_url(url));
        self
    }

    pub fn set_client_config(mut self, cfg: ClientConfig) -> Self {
        self.client_config = Some(cfg);
        self
    }

    /// Use a custom transport instead of HTTP. Takes precedence over any client config.
    pub fn set_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// System prompt placed first in the conversation log.
    pub fn set_system_prompt<T: Into<String>>(mut self, prompt: T) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn set_options(mut self, options: ModelOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Ask the server for any valid JSON.
    pub fn set_json_format(mut self) -> Self {
        self.response_format = Some(Value::String("json".into()));
        self
    }

    // A string of JSON Schema
    pub fn set_response_format_str(mut self, schema_json: &str) -> Self {
        self.response_format_raw = Some(schema_json.to_owned());
        self
    }

    // A ready-made serde_json::Value
    pub fn set_response_format_value(mut self, schema: Value) -> Self {
        self.response_format = Some(schema);
        self
    }

    // From a Rust type via schemars
    pub fn set_response_format_from<T: JsonSchema>(mut self) -> Self {
        match serde_json::to_value(schema_for!(T)) {
            Ok(v) => self.response_format = Some(v),
            Err(e) => self.format_error = Some(format!("Failed to serialize schema: {e}")),
        }
        self
    }

    pub fn set_stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    /// How long the server keeps the model loaded, e.g. `"5m"` or `"1h"`.
    pub fn set_keep_alive<T: Into<String>>(mut self, keep_alive: T) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }

    /// Use `registry` for tool calls. Pass an `Arc` to share it between chats.
    pub fn set_tool_registry<R: Into<Arc<ToolRegistry>>>(mut self, registry: R) -> Self {
        self.tool_registry = Some(registry.into());
        self
    }

    /// Add a local tool.
    pub fn add_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Seed the registry with the built-in tools.
    pub fn with_common_tools(mut self) -> Self {
        self.common_tools = true;
        self
    }

    pub fn set_auto_execute_tools(mut self, enabled: bool) -> Self {
        self.auto_execute_tools = Some(enabled);
        self
    }

    /// Take model, options, format, stream and keep-alive from `config`.
    pub fn import_config(mut self, config: ChatConfig) -> Self {
        self.model = Some(config.model);
        self.options = config.options;
        self.response_format = config.format;
        self.response_format_raw = None;
        self.stream = Some(config.stream);
        self.keep_alive = Some(config.keep_alive);
        self
    }

    /// Finalize all settings and produce a [`Chat`], or an error if required fields are missing or invalid.
    pub fn build(self) -> Result<Chat, ChatBuildError> {
        let model = self.model.ok_or(ChatBuildError::ModelNotSet)?;

        if let Some(e) = self.format_error {
            return Err(ChatBuildError::InvalidJsonSchema(e));
        }

        if self.response_format.is_some() && self.response_format_raw.is_some() {
            return Err(ChatBuildError::InvalidJsonSchema(
                "Both a typed format and set_response_format_str were given. Use only one source.".into(),
            ));
        }

        let format = match self.response_format_raw {
            Some(raw) => Some(serde_json::from_str::<Value>(raw.trim()).map_err(|e| {
                ChatBuildError::InvalidJsonSchema(format!("Failed to parse JSON schema: {e}"))
            })?),
            None => self.response_format,
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(self.client_config.unwrap_or_else(ClientConfig::from_env).build()?),
        };

        let mut registry = self.tool_registry;
        if self.common_tools || !self.tools.is_empty() {
            let registry = Arc::make_mut(registry.get_or_insert_with(Default::default));
            if self.common_tools {
                registry.register_common_tools();
            }
            for tool in self.tools {
                registry.register(tool);
            }
        }

        let config = ChatConfig {
            model,
            options: self.options,
            format,
            stream: self.stream.unwrap_or(false),
            keep_alive: self.keep_alive.unwrap_or_else(|| DEFAULT_KEEP_ALIVE.to_string()),
        };

        let mut chat = Chat::from_config(config, transport);
        chat.tool_registry = registry;
        chat.auto_execute_tools = self.auto_execute_tools.unwrap_or(true);
        if let Some(prompt) = self.system_prompt {
            chat.system(prompt);
        }
        Ok(chat)
    }
}
