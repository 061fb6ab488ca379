use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    chat::models::{Chat, ChatError, MAX_TOOL_ITERATIONS},
    services::llm::{ChatRequest, ChatResponse, ModelClientError},
    Message, ToolCall, ToolRegistry,
};

pub const CHAT_ENDPOINT: &str = "/api/chat";

/// Send the chat's current state to the model and append the reply.
///
/// Tool calls that arrive without an id get one before the reply is
/// logged, so later tool messages can always point back at their call.
pub async fn invoke(chat: &mut Chat) -> Result<ChatResponse, ChatError> {
    let request: ChatRequest = (&*chat).into();
    let mut response = call_model(chat, &request).await?;
    response.message.assign_missing_tool_call_ids();
    chat.messages.append(response.message.clone());
    Ok(response)
}

/// [`invoke`], then run requested tools and resubmit until the model stops
/// asking, at most [`MAX_TOOL_ITERATIONS`] times.
pub async fn invoke_with_tool_loop(chat: &mut Chat) -> Result<ChatResponse, ChatError> {
    for iteration in 1..=MAX_TOOL_ITERATIONS {
        let response = invoke(chat).await?;

        if !response.message.has_tool_calls() || !chat.auto_execute_tools {
            return Ok(response);
        }
        let Some(registry) = chat.tool_registry.clone() else {
            return Ok(response);
        };

        debug!(iteration, calls = response.message.tool_calls().len(), "dispatching tool calls");
        let results = call_tools(&registry, response.message.tool_calls()).await;
        chat.messages.extend(results);
    }

    error!(max = MAX_TOOL_ITERATIONS, "tool call loop did not settle");
    Err(ChatError::MaxIterations(MAX_TOOL_ITERATIONS))
}

async fn call_model(chat: &Chat, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
    let payload = serde_json::to_value(request)
        .map_err(|e| ModelClientError::Serialization(format!("Failed to encode chat request: {e}")))?;

    let raw: Value = chat.transport.post(CHAT_ENDPOINT, payload).await.map_err(|e| {
        error!(error = %e, "chat request failed");
        e
    })?;

    let response = serde_json::from_value::<ChatResponse>(raw).map_err(|e| {
        ModelClientError::Serialization(format!("Unexpected response shape from {CHAT_ENDPOINT}: {e}"))
    })?;
    Ok(response)
}

/// Run each call through `registry` in the order given.
///
/// Every call yields exactly one tool message: the JSON-encoded output on
/// success, `Error: ...` otherwise. A failing call never stops the batch.
pub async fn call_tools(registry: &ToolRegistry, tool_calls: &[ToolCall]) -> Vec<Message> {
    let mut results = Vec::with_capacity(tool_calls.len());

    for call in tool_calls {
        let id = call.id.clone().unwrap_or_else(|| call.function.name.clone());
        info!(
            target: "tool",
            tool = %call.function.name,
            id = %id,
            args = %call.function.arguments,
            "executing tool call",
        );

        match registry.execute(&call.function.name, &call.function.arguments).await {
            Ok(output) => results.push(Message::tool(id, output.to_content())),
            Err(e) => {
                warn!(target: "tool", tool = %call.function.name, error = %e, "tool call failed");
                results.push(Message::tool(id, format!("Error: {e}")));
            }
        }
    }

    results
}
