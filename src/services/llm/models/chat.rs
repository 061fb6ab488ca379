use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{base::Message, options::ModelOptions};
use crate::tools::ToolDefinition;

/// Outbound payload for `POST /api/chat`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
    pub keep_alive: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ModelOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
}

/// Inbound (non-streaming) reply from `POST /api/chat`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub model: String,
    pub created_at: String,
    pub message: Message,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_duration: Option<u64>,
}

/// Timing figures reported by the server; durations are in nanoseconds.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct ResponseMetrics {
    pub total_duration: Option<u64>,
    pub load_duration: Option<u64>,
    pub prompt_eval_count: Option<u64>,
    pub prompt_eval_duration: Option<u64>,
    pub eval_count: Option<u64>,
    pub eval_duration: Option<u64>,
    pub tokens_per_second: Option<f64>,
}

impl ChatResponse {
    pub fn content(&self) -> &str {
        self.message.content()
    }

    /// Generation throughput, `eval_count / eval_duration` in seconds.
    pub fn tokens_per_second(&self) -> Option<f64> {
        match (self.eval_count, self.eval_duration) {
            (Some(count), Some(duration)) if duration > 0 => {
                Some(count as f64 / (duration as f64 / 1_000_000_000.0))
            }
            _ => None,
        }
    }

    pub fn metrics(&self) -> ResponseMetrics {
        ResponseMetrics {
            total_duration: self.total_duration,
            load_duration: self.load_duration,
            prompt_eval_count: self.prompt_eval_count,
            prompt_eval_duration: self.prompt_eval_duration,
            eval_count: self.eval_count,
            eval_duration: self.eval_duration,
            tokens_per_second: self.tokens_per_second(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use serde_json::json;

    fn response(eval_count: Option<u64>, eval_duration: Option<u64>) -> ChatResponse {
        let mut value = json!({
            "model": "llama3.2",
            "created_at": "2024-01-01T00:00:00Z",
            "message": {"role": "assistant", "content": "Hi"},
            "done": true,
        });
        if let Some(c) = eval_count {
            value["eval_count"] = json!(c);
        }
        if let Some(d) = eval_duration {
            value["eval_duration"] = json!(d);
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn parses_minimal_response() {
        let resp = response(None, None);
        assert_eq!(resp.content(), "Hi");
        assert_eq!(resp.message.role(), Role::Assistant);
        assert_eq!(resp.total_duration, None);
    }

    #[test]
    fn throughput_requires_count_and_nonzero_duration() {
        assert_eq!(response(Some(50), Some(2_000_000_000)).tokens_per_second(), Some(25.0));
        assert_eq!(response(Some(50), Some(0)).tokens_per_second(), None);
        assert_eq!(response(Some(50), None).tokens_per_second(), None);
        assert_eq!(response(None, Some(10)).metrics().tokens_per_second, None);
    }

    #[test]
    fn request_omits_unset_optional_sections() {
        let req = ChatRequest {
            model: "m".into(),
            messages: vec![Message::user("hello")],
            stream: false,
            keep_alive: "5m".into(),
            format: None,
            options: None,
            tools: None,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "model": "m",
                "messages": [{"role": "user", "content": "hello"}],
                "stream": false,
                "keep_alive": "5m",
            })
        );
    }
}
