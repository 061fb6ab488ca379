use std::{fmt, sync::Arc};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::errors::ToolExecutionError;
use crate::ValidationError;

/// Defines the type of tool available. Currently, only 'function' is supported.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    #[default]
    Function,
}

/// Signature for an asynchronous tool executor.
///
/// Receives the arguments already resolved into the tool's declared
/// parameter order and produces a [`ToolOutput`].
pub type AsyncToolFn = Arc<
    dyn Fn(BoundArguments) -> BoxFuture<'static, Result<ToolOutput, ToolExecutionError>>
        + Send
        + Sync,
>;

/// A named capability the model may call: schema plus executor.
#[derive(Serialize, Clone)]
pub struct Tool {
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    pub function: Function,
    #[serde(skip)]
    pub(crate) bindings: Arc<[ParamBinding]>,
    #[serde(skip)]
    pub(crate) executor: AsyncToolFn,
}

/// A formal parameter of the executor, in call order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParamBinding {
    pub name: String,
    pub default: Option<Value>,
}

/// The schema half of a tool, exactly as it is embedded in a chat request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    pub function: Function,
}

/// Defines a function, its description, and its arguments.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub description: String,
    pub parameters: FunctionParameters,
}

/// Defines the arguments for a function using a JSON schema-like structure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FunctionParameters {
    #[serde(rename = "type")]
    pub param_type: String,
    pub properties: IndexMap<String, Property>,
    pub required: Vec<String>,
}

/// Defines a single property within function arguments.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Property {
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Any further schema keywords (`enum`, `items`, ...) passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("tool_type", &self.tool_type)
            .field("function", &self.function)
            .field("executor", &"<async_fn>")
            .finish()
    }
}

impl Tool {
    /// Gets the name of the tool from its function definition.
    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn description(&self) -> &str {
        &self.function.description
    }

    pub fn parameters(&self) -> &FunctionParameters {
        &self.function.parameters
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            tool_type: self.tool_type,
            function: self.function.clone(),
        }
    }

    /// Validate then invoke; the path the registry and the chat loop take.
    pub async fn execute(&self, args: &Value) -> Result<ToolOutput, ToolExecutionError> {
        let args = self.argument_map(args)?;
        self.validate_arguments(&args)?;
        self.invoke(&args).await
    }

    /// Check `args` against the declared schema.
    ///
    /// Every required parameter must be present (a JSON `null` counts as
    /// absent) and every supplied parameter with a declared type must match
    /// it. Undeclared keys and unknown type names pass.
    pub fn validate_arguments(&self, args: &Map<String, Value>) -> Result<(), ValidationError> {
        let params = &self.function.parameters;

        for name in &params.required {
            if !is_present(args.get(name)) {
                return Err(ValidationError::MissingParameter {
                    tool: self.name().to_string(),
                    parameter: name.clone(),
                });
            }
        }

        for (key, value) in args {
            if value.is_null() {
                continue;
            }
            if let Some(prop) = params.properties.get(key) {
                if !value_matches_type(value, &prop.property_type) {
                    return Err(ValidationError::WrongType {
                        tool: self.name().to_string(),
                        parameter: key.clone(),
                        expected: prop.property_type.clone(),
                        actual: json_type_name(value).to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Bind named arguments to the executor's parameters and call it.
    ///
    /// Each declared parameter takes the supplied value, else its declared
    /// default; when neither exists the call fails before the executor runs.
    pub async fn invoke(&self, args: &Map<String, Value>) -> Result<ToolOutput, ToolExecutionError> {
        let bound = self.bind(args)?;
        (self.executor)(bound).await.map_err(|e| match e {
            ToolExecutionError::ExecutionFailed(reason) => {
                ToolExecutionError::ExecutionFailed(format!("{}: {reason}", self.name()))
            }
            other => other,
        })
    }

    fn bind(&self, args: &Map<String, Value>) -> Result<BoundArguments, ValidationError> {
        let mut values = Vec::with_capacity(self.bindings.len());
        for binding in self.bindings.iter() {
            let value = match args.get(&binding.name) {
                Some(v) if !v.is_null() => v.clone(),
                _ => match &binding.default {
                    Some(default) => default.clone(),
                    None => {
                        return Err(ValidationError::MissingParameter {
                            tool: self.name().to_string(),
                            parameter: binding.name.clone(),
                        })
                    }
                },
            };
            values.push((binding.name.clone(), value));
        }
        Ok(BoundArguments {
            tool: self.name().to_string(),
            values,
        })
    }

    /// Normalize call arguments into an object. Some models send the
    /// arguments as a JSON-encoded string; `null` means "no arguments".
    fn argument_map(&self, args: &Value) -> Result<Map<String, Value>, ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidArguments {
            tool: self.name().to_string(),
            reason,
        };
        match args {
            Value::Object(map) => Ok(map.clone()),
            Value::Null => Ok(Map::new()),
            Value::String(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(other) => Err(invalid(format!("expected an object, got {}", json_type_name(&other)))),
                Err(e) => Err(invalid(format!("arguments string is not JSON: {e}"))),
            },
            other => Err(invalid(format!("expected an object, got {}", json_type_name(other)))),
        }
    }
}

fn is_present(value: Option<&Value>) -> bool {
    matches!(value, Some(v) if !v.is_null())
}

fn value_matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number() || value.as_str().is_some_and(|s| s.trim().parse::<f64>().is_ok()),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object() || value.is_array(),
        _ => true,
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Arguments resolved into a tool's declared parameter order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArguments {
    tool: String,
    values: Vec<(String, Value)>,
}

impl BoundArguments {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values.into_iter().map(|(_, v)| v).collect()
    }

    pub fn value(&self, index: usize) -> Result<&Value, ToolExecutionError> {
        self.values.get(index).map(|(_, v)| v).ok_or_else(|| {
            ToolExecutionError::failed(format!(
                "no parameter at position {index} ({} bound)",
                self.values.len()
            ))
        })
    }

    pub fn str(&self, index: usize) -> Result<&str, ToolExecutionError> {
        let value = self.value(index)?;
        value.as_str().ok_or_else(|| self.wrong_type(index, "string", value))
    }

    pub fn f64(&self, index: usize) -> Result<f64, ToolExecutionError> {
        let value = self.value(index)?;
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| self.wrong_type(index, "number", value))
    }

    pub fn i64(&self, index: usize) -> Result<i64, ToolExecutionError> {
        let value = self.value(index)?;
        value.as_i64().ok_or_else(|| self.wrong_type(index, "integer", value))
    }

    pub fn bool(&self, index: usize) -> Result<bool, ToolExecutionError> {
        let value = self.value(index)?;
        value.as_bool().ok_or_else(|| self.wrong_type(index, "boolean", value))
    }

    fn wrong_type(&self, index: usize, expected: &str, value: &Value) -> ToolExecutionError {
        ValidationError::WrongType {
            tool: self.tool.clone(),
            parameter: self.values[index].0.clone(),
            expected: expected.to_string(),
            actual: json_type_name(value).to_string(),
        }
        .into()
    }
}

/// What a tool produced. Only ever serialized, never inspected.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Record(Value),
}

impl ToolOutput {
    pub fn to_json(&self) -> Value {
        match self {
            ToolOutput::Text(s) => json!(s),
            ToolOutput::Integer(i) => json!(i),
            ToolOutput::Float(f) => json!(f),
            ToolOutput::Boolean(b) => json!(b),
            ToolOutput::Record(v) => v.clone(),
        }
    }

    /// JSON text placed in the content of a tool message.
    pub fn to_content(&self) -> String {
        self.to_json().to_string()
    }
}

impl From<String> for ToolOutput {
    fn from(v: String) -> Self {
        ToolOutput::Text(v)
    }
}

impl From<&str> for ToolOutput {
    fn from(v: &str) -> Self {
        ToolOutput::Text(v.to_string())
    }
}

impl From<i64> for ToolOutput {
    fn from(v: i64) -> Self {
        ToolOutput::Integer(v)
    }
}

impl From<f64> for ToolOutput {
    fn from(v: f64) -> Self {
        ToolOutput::Float(v)
    }
}

impl From<bool> for ToolOutput {
    fn from(v: bool) -> Self {
        ToolOutput::Boolean(v)
    }
}

impl From<Value> for ToolOutput {
    fn from(v: Value) -> Self {
        ToolOutput::Record(v)
    }
}
