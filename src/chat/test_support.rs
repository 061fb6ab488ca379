use std::{collections::VecDeque, sync::Mutex};

use serde_json::{json, Value};

use crate::services::llm::{ModelClientError, Transport, TransportFuture};

/// In-memory [`Transport`] that plays back canned replies and records
/// every request it receives.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Value>>,
    repeat: Option<Value>,
    failure: Option<String>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Value>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    /// Answers every request with `reply`.
    pub fn repeating(reply: Value) -> Self {
        Self {
            repeat: Some(reply),
            ..Default::default()
        }
    }

    /// Fails every request as if the server were unreachable.
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Default::default()
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> (String, Value) {
        self.requests.lock().unwrap()[index].clone()
    }
}

impl Transport for ScriptedTransport {
    fn post<'a>(&'a self, endpoint: &'a str, payload: Value) -> TransportFuture<'a> {
        self.requests
            .lock()
            .unwrap()
            .push((endpoint.to_string(), payload));

        let result = match (&self.failure, self.replies.lock().unwrap().pop_front()) {
            (Some(reason), _) => Err(ModelClientError::Request(reason.clone())),
            (None, Some(reply)) => Ok(reply),
            (None, None) => self
                .repeat
                .clone()
                .ok_or_else(|| ModelClientError::Api("script exhausted".into())),
        };
        Box::pin(async move { result })
    }
}

pub(crate) fn assistant_reply(content: &str) -> Value {
    json!({
        "model": "llama3.2",
        "created_at": "2024-06-01T12:00:00Z",
        "message": {"role": "assistant", "content": content},
        "done": true,
        "eval_count": 10,
        "eval_duration": 500_000_000u64
    })
}

pub(crate) fn tool_call_reply(tool_calls: Value) -> Value {
    json!({
        "model": "llama3.2",
        "created_at": "2024-06-01T12:00:00Z",
        "message": {"role": "assistant", "content": "", "tool_calls": tool_calls},
        "done": true
    })
}
