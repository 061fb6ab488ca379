use core::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;

use super::{
    configs::ChatConfig,
    error::{ChatBuildError, ChatError},
    ChatBuilder,
};
use crate::{
    chat::util::{compaction, invocations},
    conversation::{summary::DEFAULT_SUMMARY_PROMPT, ChatMessages, ConversationStats},
    services::llm::{ChatRequest, ChatResponse, MessageRecord, ModelOptions, Transport},
    AsyncToolFn, Tool, ToolOutput, ToolRegistry,
};

/// Upper bound on model round-trips in one [`Chat::send_with_tools`] call.
pub const MAX_TOOL_ITERATIONS: usize = 10;

/// One conversation with one model.
///
/// A `Chat` owns its message log exclusively. The tool registry may be
/// shared between chats; treat a shared registry as read-only while any of
/// them is dispatching.
#[derive(Clone)]
pub struct Chat {
    pub model: String,
    pub options: Option<ModelOptions>,
    pub format: Option<Value>,
    pub stream: bool,
    pub keep_alive: String,
    pub auto_execute_tools: bool,
    pub(crate) messages: ChatMessages,
    pub(crate) tool_registry: Option<Arc<ToolRegistry>>,
    pub(crate) transport: Arc<dyn Transport>,
}

impl Chat {
    /// A chat with default settings talking through `transport`.
    pub fn new<T: Into<String>>(model: T, transport: Arc<dyn Transport>) -> Self {
        Self::from_config(ChatConfig::new(model), transport)
    }

    pub fn from_config(config: ChatConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            model: config.model,
            options: config.options,
            format: config.format,
            stream: config.stream,
            keep_alive: config.keep_alive,
            auto_execute_tools: true,
            messages: ChatMessages::new(),
            tool_registry: None,
            transport,
        }
    }

    pub fn builder() -> ChatBuilder {
        ChatBuilder::default()
    }

    /// Chat over HTTP whose log starts with a system prompt.
    pub fn with_system<M, P>(model: M, system_prompt: P, base_url: Option<&str>) -> Result<Self, ChatBuildError>
    where
        M: Into<String>,
        P: Into<String>,
    {
        let mut builder = ChatBuilder::default()
            .set_model(model)
            .set_system_prompt(system_prompt);
        if let Some(url) = base_url {
            builder = builder.set_base_url(url);
        }
        builder.build()
    }

    /// One-shot question over HTTP, no history kept.
    pub async fn quick<M, T>(model: M, message: T, base_url: Option<&str>) -> Result<ChatResponse, ChatError>
    where
        M: Into<String>,
        T: Into<String>,
    {
        let mut builder = ChatBuilder::default().set_model(model);
        if let Some(url) = base_url {
            builder = builder.set_base_url(url);
        }
        let mut chat = builder.build()?;
        chat.send(message).await
    }

    /// Model-level settings, e.g. to start an independent chat with the same model.
    pub fn config(&self) -> ChatConfig {
        ChatConfig {
            model: self.model.clone(),
            options: self.options.clone(),
            format: self.format.clone(),
            stream: self.stream,
            keep_alive: self.keep_alive.clone(),
        }
    }

    pub fn set_options(&mut self, options: ModelOptions) -> &mut Self {
        self.options = Some(options);
        self
    }

    pub fn set_format(&mut self, format: Option<Value>) -> &mut Self {
        self.format = format;
        self
    }

    pub fn set_keep_alive<T: Into<String>>(&mut self, keep_alive: T) -> &mut Self {
        self.keep_alive = keep_alive.into();
        self
    }

    pub fn system<T: Into<String>>(&mut self, content: T) -> &mut Self {
        self.messages.add_system(content);
        self
    }

    pub fn user<T: Into<String>>(&mut self, content: T) -> &mut Self {
        self.messages.add_user(content);
        self
    }

    pub fn user_with_images<T: Into<String>>(&mut self, content: T, images: Vec<String>) -> &mut Self {
        self.messages.add_user_with_images(content, images);
        self
    }

    pub fn assistant<T: Into<String>>(&mut self, content: T) -> &mut Self {
        self.messages.add_assistant(content);
        self
    }

    pub fn tool<S: Into<String>, T: Into<String>>(&mut self, tool_call_id: S, content: T) -> &mut Self {
        self.messages.add_tool(tool_call_id, content);
        self
    }

    pub fn messages(&self) -> &ChatMessages {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut ChatMessages {
        &mut self.messages
    }

    pub fn clear(&mut self) -> &mut Self {
        self.messages.clear();
        self
    }

    /// Replace the log with `records`; on error the log is unchanged.
    pub fn load_messages<I>(&mut self, records: I) -> Result<&mut Self, ChatError>
    where
        I: IntoIterator<Item = MessageRecord>,
    {
        self.messages.load_from(records)?;
        Ok(self)
    }

    pub fn export_messages(&self) -> Vec<MessageRecord> {
        self.messages.to_export()
    }

    pub fn conversation_stats(&self) -> ConversationStats {
        self.messages.stats()
    }

    /// The exact payload the next [`chat`](Self::chat) call would send.
    pub fn build_request(&self) -> ChatRequest {
        self.into()
    }

    /// Append a user message and run one round-trip.
    #[instrument(level = "debug", skip(self, text), fields(model = %self.model))]
    pub async fn send<T: Into<String>>(&mut self, text: T) -> Result<ChatResponse, ChatError> {
        self.messages.add_user(text);
        self.chat().await
    }

    pub async fn send_with_images<T: Into<String>>(
        &mut self,
        text: T,
        images: Vec<String>,
    ) -> Result<ChatResponse, ChatError> {
        self.messages.add_user_with_images(text, images);
        self.chat().await
    }

    /// Send the current log as is and append the reply.
    #[instrument(level = "debug", skip(self), fields(model = %self.model))]
    pub async fn chat(&mut self) -> Result<ChatResponse, ChatError> {
        invocations::invoke(self).await
    }

    /// Send `text` and let the model call tools until it answers in plain text.
    ///
    /// Each requested call is run through the registry in order and its
    /// result (or error text) appended as a tool message before the log is
    /// resubmitted. Fails with [`ChatError::MaxIterations`] after
    /// [`MAX_TOOL_ITERATIONS`] round-trips that all asked for tools. With no
    /// registry, or with auto-execution off, the first reply is returned as is.
    #[instrument(level = "debug", skip(self, text), fields(model = %self.model))]
    pub async fn send_with_tools<T: Into<String>>(&mut self, text: T) -> Result<ChatResponse, ChatError> {
        self.messages.add_user(text);
        invocations::invoke_with_tool_loop(self).await
    }

    pub async fn send_with_tools_and_images<T: Into<String>>(
        &mut self,
        text: T,
        images: Vec<String>,
    ) -> Result<ChatResponse, ChatError> {
        self.messages.add_user_with_images(text, images);
        invocations::invoke_with_tool_loop(self).await
    }

    /// Send `text` and parse the reply content as JSON into `T`.
    ///
    /// Pair with a `format` constraint so the model actually answers in JSON.
    pub async fn send_structured<T, P>(&mut self, text: P) -> Result<T, ChatError>
    where
        T: DeserializeOwned,
        P: Into<String>,
    {
        let response = self.send(text).await?;
        Ok(serde_json::from_str(response.content())?)
    }

    pub fn set_tool_registry<R: Into<Arc<ToolRegistry>>>(&mut self, registry: R) -> &mut Self {
        self.tool_registry = Some(registry.into());
        self
    }

    pub fn tool_registry(&self) -> Option<&ToolRegistry> {
        self.tool_registry.as_deref()
    }

    /// Register on this chat's registry, creating one if needed. A registry
    /// shared with other chats is copied first, so they are unaffected.
    pub fn register_tool(&mut self, tool: Tool) -> &mut Self {
        let registry = self.tool_registry.get_or_insert_with(Default::default);
        Arc::make_mut(registry).register(tool);
        self
    }

    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        executor: AsyncToolFn,
    ) -> Result<&mut Self, ChatError> {
        let registry = self.tool_registry.get_or_insert_with(Default::default);
        Arc::make_mut(registry).register_function(name, description, parameters, executor)?;
        Ok(self)
    }

    pub fn set_auto_execute_tools(&mut self, enabled: bool) -> &mut Self {
        self.auto_execute_tools = enabled;
        self
    }

    pub fn is_auto_execute_tools_enabled(&self) -> bool {
        self.auto_execute_tools
    }

    /// Run one tool by hand, e.g. after a reply returned with auto-execution off.
    pub async fn execute_tool(&self, name: &str, args: &Value) -> Result<ToolOutput, ChatError> {
        let registry = self.tool_registry.as_ref().ok_or(ChatError::NoToolRegistry)?;
        Ok(registry.execute(name, args).await?)
    }

    /// Replace everything but the last `keep_recent` messages (and a leading
    /// system message) with a model-written summary.
    ///
    /// Returns `false` without contacting the model when the log holds no
    /// more than `keep_recent + 2` messages. The summary is produced by a
    /// separate chat with the same model and options, so the live log never
    /// sees the summary request.
    #[instrument(level = "debug", skip(self, prompt), fields(model = %self.model))]
    pub async fn summarize_conversation(
        &mut self,
        keep_recent: usize,
        prompt: Option<&str>,
    ) -> Result<bool, ChatError> {
        compaction::summarize(self, keep_recent, prompt.unwrap_or(DEFAULT_SUMMARY_PROMPT)).await
    }

    /// Compact when the estimated token count exceeds `max_tokens`.
    /// Returns whether the log was actually compacted.
    pub async fn auto_summarize_if_needed(
        &mut self,
        max_tokens: usize,
        keep_recent: usize,
    ) -> Result<bool, ChatError> {
        if self.conversation_stats().estimated_tokens <= max_tokens {
            return Ok(false);
        }
        self.summarize_conversation(keep_recent, None).await
    }
}

impl From<&Chat> for ChatRequest {
    fn from(chat: &Chat) -> Self {
        ChatRequest {
            model: chat.model.clone(),
            messages: chat.messages.as_slice().to_vec(),
            stream: chat.stream,
            keep_alive: chat.keep_alive.clone(),
            format: chat.format.clone(),
            options: chat.options.clone().filter(|o| !o.is_empty()),
            tools: chat
                .tool_registry
                .as_ref()
                .filter(|r| !r.is_empty())
                .map(|r| r.tool_schemas()),
        }
    }
}

impl fmt::Debug for Chat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chat")
            .field("model", &self.model)
            .field("messages", &self.messages)
            .field("options", &self.options)
            .field("format", &self.format)
            .field("stream", &self.stream)
            .field("keep_alive", &self.keep_alive)
            .field("tool_registry", &self.tool_registry)
            .field("auto_execute_tools", &self.auto_execute_tools)
            .field("transport", &self.transport)
            .finish()
    }
}
