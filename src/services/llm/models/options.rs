use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Model parameters sent as the `options` object of a chat request.
///
/// Every field is optional; only the ones that were set are serialized.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ModelOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_keep: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typical_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_last_n: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirostat: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirostat_tau: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirostat_eta: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penalize_newline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numa: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_batch: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_gpu: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_gpu: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_vram: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vocab_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_mmap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_mlock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_thread: Option<u32>,
}

impl ModelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, v: f32) -> Self {
        self.temperature = Some(v);
        self
    }

    pub fn top_p(mut self, v: f32) -> Self {
        self.top_p = Some(v);
        self
    }

    pub fn top_k(mut self, v: u32) -> Self {
        self.top_k = Some(v);
        self
    }

    pub fn seed(mut self, v: i32) -> Self {
        self.seed = Some(v);
        self
    }

    pub fn num_ctx(mut self, v: u32) -> Self {
        self.num_ctx = Some(v);
        self
    }

    pub fn num_predict(mut self, v: i32) -> Self {
        self.num_predict = Some(v);
        self
    }

    pub fn repeat_penalty(mut self, v: f32) -> Self {
        self.repeat_penalty = Some(v);
        self
    }

    pub fn add_stop<T: Into<String>>(mut self, v: T) -> Self {
        self.stop.get_or_insert_with(Vec::new).push(v.into());
        self
    }

    /// The set fields, keyed by parameter name.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_map().is_empty()
    }

    /// Render the set fields as Modelfile `PARAMETER` lines.
    ///
    /// Lines are sorted by parameter name. A parameter holding a list (only
    /// `stop`) yields one line per entry.
    pub fn to_modelfile(&self) -> String {
        let mut entries: Vec<(String, Value)> = self.to_map().into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut out = String::new();
        for (name, value) in entries {
            match value {
                Value::Array(items) => {
                    for item in items {
                        out.push_str(&format!("PARAMETER {name} {}\n", render_scalar(&item)));
                    }
                }
                other => out.push_str(&format!("PARAMETER {name} {}\n", render_scalar(&other))),
            }
        }
        out
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}
