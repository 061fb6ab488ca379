use std::{fmt, str::FromStr};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::ValidationError;

/// Speaker tag of a conversation entry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::System, Role::User, Role::Assistant, Role::Tool];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    /// Capitalized label used when rendering a transcript ("User", "Assistant", ...).
    pub fn label(&self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::Tool => "Tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "tool" => Ok(Role::Tool),
            other => Err(ValidationError::InvalidRole(other.to_string())),
        }
    }
}

/// Represents a tool call requested by the model.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Correlation id. Ollama frequently omits it; the chat controller fills one in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub function: ToolCallFunction,
}

impl ToolCall {
    pub fn new<N: Into<String>>(id: Option<String>, name: N, arguments: Value) -> Self {
        Self {
            id,
            function: ToolCallFunction {
                name: name.into(),
                arguments,
            },
        }
    }
}

/// Contains the name and arguments for a function call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolCallFunction {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Plain record form of a [`Message`]. This is the wire and snapshot shape:
/// `images`, `tool_calls` and `tool_call_id` only appear when non-empty.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessageRecord {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// A single conversation entry.
///
/// The role is fixed at construction and `tool_call_id` is present exactly
/// when the role is [`Role::Tool`]. Both rules are checked by every
/// constructor, including deserialization.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "MessageRecord", into = "MessageRecord")]
pub struct Message {
    role: Role,
    content: String,
    images: Vec<String>,
    tool_calls: Vec<ToolCall>,
    tool_call_id: Option<String>,
}

impl Message {
    /// Build a message from a textual role, validating both message invariants.
    pub fn new<R, C>(
        role: R,
        content: C,
        images: Vec<String>,
        tool_calls: Vec<ToolCall>,
        tool_call_id: Option<String>,
    ) -> Result<Self, ValidationError>
    where
        R: AsRef<str>,
        C: Into<String>,
    {
        let role: Role = role.as_ref().parse()?;
        Self::with_role(role, content.into(), images, tool_calls, tool_call_id)
    }

    fn with_role(
        role: Role,
        content: String,
        images: Vec<String>,
        tool_calls: Vec<ToolCall>,
        tool_call_id: Option<String>,
    ) -> Result<Self, ValidationError> {
        match (role, &tool_call_id) {
            (Role::Tool, None) => return Err(ValidationError::MissingToolCallId),
            (Role::Tool, Some(_)) | (_, None) => {}
            (other, Some(_)) => {
                return Err(ValidationError::UnexpectedToolCallId {
                    role: other.to_string(),
                })
            }
        }
        Ok(Self {
            role,
            content,
            images,
            tool_calls,
            tool_call_id,
        })
    }

    fn plain(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            images: Vec::new(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system<T: Into<String>>(content: T) -> Self {
        Self::plain(Role::System, content.into())
    }

    pub fn user<T: Into<String>>(content: T) -> Self {
        Self::plain(Role::User, content.into())
    }

    /// User message carrying base64-encoded images for multimodal models.
    pub fn user_with_images<T: Into<String>>(content: T, images: Vec<String>) -> Self {
        Self {
            images,
            ..Self::plain(Role::User, content.into())
        }
    }

    pub fn assistant<T: Into<String>>(content: T) -> Self {
        Self::plain(Role::Assistant, content.into())
    }

    pub fn assistant_with_tool_calls<T: Into<String>>(content: T, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::plain(Role::Assistant, content.into())
        }
    }

    pub fn tool<S, T>(tool_call_id: S, content: T) -> Self
    where
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::plain(Role::Tool, content.into())
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }

    pub fn tool_call_id(&self) -> Option<&str> {
        self.tool_call_id.as_deref()
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Give every tool call without an id a fresh one.
    pub(crate) fn assign_missing_tool_call_ids(&mut self) {
        for call in self.tool_calls.iter_mut().filter(|c| c.id.is_none()) {
            call.id = Some(format!("call_{}", uuid::Uuid::new_v4().simple()));
        }
    }

    pub fn to_record(&self) -> MessageRecord {
        self.clone().into()
    }
}

impl TryFrom<MessageRecord> for Message {
    type Error = ValidationError;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        Message::new(
            &record.role,
            record.content,
            record.images,
            record.tool_calls,
            record.tool_call_id,
        )
    }
}

impl From<Message> for MessageRecord {
    fn from(message: Message) -> Self {
        MessageRecord {
            role: message.role.to_string(),
            content: message.content,
            images: message.images,
            tool_calls: message.tool_calls,
            tool_call_id: message.tool_call_id,
        }
    }
}

/// Encode raw image bytes into the form carried in [`Message::images`].
pub fn encode_image<B: AsRef<[u8]>>(bytes: B) -> String {
    STANDARD.encode(bytes)
}
