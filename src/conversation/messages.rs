use std::{fs, ops::Index, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{errors::LogError, stats::ConversationStats};
use crate::{Message, MessageRecord, ToolCall, ValidationError};

/// Ordered conversation log.
///
/// Insertion order is conversation order and is replayed verbatim to the
/// model; nothing here reorders or deduplicates.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct ChatMessages {
    messages: Vec<Message>,
}

impl ChatMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) -> &mut Self {
        self.messages.push(message);
        self
    }

    pub fn add_system<T: Into<String>>(&mut self, content: T) -> &mut Self {
        self.append(Message::system(content))
    }

    pub fn add_user<T: Into<String>>(&mut self, content: T) -> &mut Self {
        self.append(Message::user(content))
    }

    pub fn add_user_with_images<T: Into<String>>(&mut self, content: T, images: Vec<String>) -> &mut Self {
        self.append(Message::user_with_images(content, images))
    }

    pub fn add_assistant<T: Into<String>>(&mut self, content: T) -> &mut Self {
        self.append(Message::assistant(content))
    }

    pub fn add_assistant_with_tool_calls<T: Into<String>>(
        &mut self,
        content: T,
        tool_calls: Vec<ToolCall>,
    ) -> &mut Self {
        self.append(Message::assistant_with_tool_calls(content, tool_calls))
    }

    pub fn add_tool<S: Into<String>, T: Into<String>>(&mut self, tool_call_id: S, content: T) -> &mut Self {
        self.append(Message::tool(tool_call_id, content))
    }

    /// Append a message whose role arrives as text. Tool messages need
    /// `tool_call_id`; every other role must leave it `None`.
    pub fn add_message<R: AsRef<str>, T: Into<String>>(
        &mut self,
        role: R,
        content: T,
        images: Vec<String>,
        tool_calls: Vec<ToolCall>,
        tool_call_id: Option<String>,
    ) -> Result<&mut Self, ValidationError> {
        let message = Message::new(role, content, images, tool_calls, tool_call_id)?;
        Ok(self.append(message))
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn first(&self) -> Option<&Message> {
        self.messages.first()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Same as [`len`](Self::len).
    pub fn count(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Message, LogError> {
        self.messages.get(index).ok_or(LogError::IndexOutOfRange {
            index,
            len: self.messages.len(),
        })
    }

    /// Replace the message at an occupied index.
    pub fn set(&mut self, index: usize, message: Message) -> Result<(), LogError> {
        let len = self.messages.len();
        let slot = self
            .messages
            .get_mut(index)
            .ok_or(LogError::IndexOutOfRange { index, len })?;
        *slot = message;
        Ok(())
    }

    /// Like [`set`](Self::set), validating a plain record first.
    pub fn set_record(&mut self, index: usize, record: MessageRecord) -> Result<(), LogError> {
        let message = Message::try_from(record)?;
        self.set(index, message)
    }

    pub fn remove(&mut self, index: usize) -> Result<Message, LogError> {
        if index >= self.messages.len() {
            return Err(LogError::IndexOutOfRange {
                index,
                len: self.messages.len(),
            });
        }
        Ok(self.messages.remove(index))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn stats(&self) -> ConversationStats {
        ConversationStats::from_messages(&self.messages)
    }

    pub fn to_export(&self) -> Vec<MessageRecord> {
        self.messages.iter().map(Message::to_record).collect()
    }

    /// Replace the whole log with `records`.
    ///
    /// Every record is validated before anything changes: on error the log
    /// is left exactly as it was.
    pub fn load_from<I>(&mut self, records: I) -> Result<(), LogError>
    where
        I: IntoIterator<Item = MessageRecord>,
    {
        let messages = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                Message::try_from(record).map_err(|e| ValidationError::MalformedRecord {
                    index,
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.messages = messages;
        Ok(())
    }

    /// [`load_from`](Self::load_from) for untyped JSON, e.g. a snapshot read
    /// from elsewhere. The value must be an array of message objects.
    pub fn load_from_value(&mut self, value: Value) -> Result<(), LogError> {
        let Value::Array(items) = value else {
            return Err(ValidationError::MalformedRecord {
                index: 0,
                reason: "expected an array of messages".into(),
            }
            .into());
        };
        let records = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value::<MessageRecord>(item).map_err(|e| ValidationError::MalformedRecord {
                    index,
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.load_from(records)
    }

    /// Write the exported log as pretty JSON.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), LogError> {
        let json_string = serde_json::to_string_pretty(&self.to_export())?;
        fs::write(path, json_string)?;
        Ok(())
    }

    pub fn load_from_path<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LogError> {
        let raw = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&raw)?;
        self.load_from_value(value)
    }
}

impl From<Vec<Message>> for ChatMessages {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl FromIterator<Message> for ChatMessages {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

impl Extend<Message> for ChatMessages {
    fn extend<I: IntoIterator<Item = Message>>(&mut self, iter: I) {
        self.messages.extend(iter);
    }
}

impl Index<usize> for ChatMessages {
    type Output = Message;

    fn index(&self, index: usize) -> &Message {
        &self.messages[index]
    }
}

impl IntoIterator for ChatMessages {
    type Item = Message;
    type IntoIter = std::vec::IntoIter<Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChatMessages {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use serde_json::json;

    fn sample_log() -> ChatMessages {
        let mut log = ChatMessages::new();
        log.add_system("You are terse.")
            .add_user_with_images("What is this?", vec!["aGk=".into()])
            .add_assistant_with_tool_calls(
                "",
                vec![ToolCall::new(Some("call_1".into()), "string_length", json!({"text": "hi"}))],
            )
            .add_tool("call_1", "2")
            .add_assistant("It has length 2.");
        log
    }

    #[test]
    fn first_last_and_empty() {
        let mut log = ChatMessages::new();
        assert!(log.first().is_none());
        assert!(log.last().is_none());
        assert!(log.is_empty());

        log.add_user("a").add_assistant("b");
        assert_eq!(log.first().unwrap().content(), "a");
        assert_eq!(log.last().unwrap().content(), "b");
        assert_eq!(log.count(), 2);
    }

    #[test]
    fn get_and_set_are_bounds_checked() {
        let mut log = sample_log();
        assert_eq!(log.get(1).unwrap().role(), Role::User);
        assert!(matches!(
            log.get(5),
            Err(LogError::IndexOutOfRange { index: 5, len: 5 })
        ));

        log.set(0, Message::system("Be verbose.")).unwrap();
        assert_eq!(log[0].content(), "Be verbose.");
        assert!(log.set(9, Message::user("x")).is_err());
    }

    #[test]
    fn set_record_validates() {
        let mut log = sample_log();
        let bad = MessageRecord {
            role: "narrator".into(),
            content: "x".into(),
            images: vec![],
            tool_calls: vec![],
            tool_call_id: None,
        };
        assert!(matches!(
            log.set_record(0, bad),
            Err(LogError::Validation(ValidationError::InvalidRole(_)))
        ));
        assert_eq!(log[0].content(), "You are terse.");
    }

    #[test]
    fn add_message_checks_role_and_correlation_id() {
        let mut log = ChatMessages::new();
        assert!(log.add_message("user", "hi", vec![], vec![], None).is_ok());
        assert!(log.add_message("robot", "hi", vec![], vec![], None).is_err());
        assert!(log.add_message("tool", "42", vec![], vec![], None).is_err());
        assert!(log
            .add_message("tool", "42", vec![], vec![], Some("call_9".into()))
            .is_ok());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn remove_keeps_order() {
        let mut log = sample_log();
        let removed = log.remove(1).unwrap();
        assert_eq!(removed.role(), Role::User);
        let roles: Vec<_> = log.iter().map(Message::role).collect();
        assert_eq!(roles, vec![Role::System, Role::Assistant, Role::Tool, Role::Assistant]);
        assert!(log.remove(4).is_err());
    }

    #[test]
    fn export_omits_empty_fields() {
        let export = serde_json::to_value(sample_log().to_export()).unwrap();
        assert_eq!(export[0], json!({"role": "system", "content": "You are terse."}));
        assert_eq!(export[1]["images"], json!(["aGk="]));
        assert_eq!(export[2]["tool_calls"][0]["id"], "call_1");
        assert_eq!(export[3], json!({"role": "tool", "content": "2", "tool_call_id": "call_1"}));
    }

    #[test]
    fn export_load_round_trip() {
        let log = sample_log();
        let exported = log.to_export();

        let mut reloaded = ChatMessages::new();
        reloaded.add_user("stale");
        reloaded.load_from(exported.clone()).unwrap();

        assert_eq!(reloaded.to_export(), exported);
        assert_eq!(reloaded, log);
    }

    #[test]
    fn load_from_is_all_or_nothing() {
        let mut log = sample_log();
        let before = log.clone();
        let mut records = log.to_export();
        records[3].tool_call_id = None;

        let err = log.load_from(records).unwrap_err();
        assert!(matches!(
            err,
            LogError::Validation(ValidationError::MalformedRecord { index: 3, .. })
        ));
        assert_eq!(log, before);
    }

    #[test]
    fn load_from_value_applies_defaults() {
        let mut log = ChatMessages::new();
        log.load_from_value(json!([{"role": "user"}, {"role": "assistant", "content": "ok"}]))
            .unwrap();
        assert_eq!(log[0].content(), "");
        assert!(log[0].images().is_empty());

        let err = log.load_from_value(json!([{"content": "no role"}])).unwrap_err();
        assert!(matches!(
            err,
            LogError::Validation(ValidationError::MalformedRecord { index: 0, .. })
        ));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn snapshot_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let log = sample_log();
        log.save_to_path(&path).unwrap();

        let mut restored = ChatMessages::new();
        restored.load_from_path(&path).unwrap();
        assert_eq!(restored, log);

        assert!(matches!(
            restored.load_from_path(dir.path().join("missing.json")),
            Err(LogError::Io(_))
        ));
    }
}
