use std::{future::Future, sync::Arc};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{
    errors::{ToolBuilderError, ToolExecutionError},
    tool::{AsyncToolFn, BoundArguments, Function, FunctionParameters, ParamBinding, Property, Tool, ToolOutput, ToolType},
};

/// A parameter declaration in either of the two accepted forms.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamDecl {
    /// Shorthand: just a type name. Always required.
    Type(String),
    /// Full property. Required unless `required` is explicitly `false`.
    Detailed(Property),
}

impl From<&str> for ParamDecl {
    fn from(v: &str) -> Self {
        ParamDecl::Type(v.to_string())
    }
}

impl From<String> for ParamDecl {
    fn from(v: String) -> Self {
        ParamDecl::Type(v)
    }
}

impl From<Property> for ParamDecl {
    fn from(v: Property) -> Self {
        ParamDecl::Detailed(v)
    }
}

#[derive(Default)]
pub struct ToolBuilder {
    tool_type: Option<ToolType>,
    function_name: Option<String>,
    function_description: Option<String>,
    function_properties: IndexMap<String, Property>,
    function_required: Vec<String>,
    executor: Option<AsyncToolFn>,
    declaration_error: Option<ToolBuilderError>,
}

impl std::fmt::Debug for ToolBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolBuilder")
            .field("tool_type", &self.tool_type)
            .field("function_name", &self.function_name)
            .field("function_description", &self.function_description)
            .field("function_properties", &self.function_properties)
            .field("function_required", &self.function_required)
            .field("executor", &self.executor.as_ref().map(|_| "<async_fn>"))
            .finish()
    }
}

impl ToolBuilder {
    /// Creates a new `ToolBuilder` for a function tool.
    pub fn new() -> Self {
        ToolBuilder {
            tool_type: Some(ToolType::Function),
            ..Default::default()
        }
    }

    pub fn tool_type(mut self, tool_type: ToolType) -> Self {
        self.tool_type = Some(tool_type);
        self
    }

    /// Sets the name of the function for the tool. (Required)
    pub fn function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    /// Sets the description of the function for the tool. (Required)
    pub fn function_description<T>(mut self, description: T) -> Self
    where
        T: Into<String>,
    {
        self.function_description = Some(description.into());
        self
    }

    /// Declares an optional parameter.
    ///
    /// Parameters are passed to the executor in declaration order.
    pub fn add_property(
        mut self,
        name: impl Into<String>,
        property_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.function_properties.insert(
            name.into(),
            Property {
                property_type: property_type.into(),
                description: Some(description.into()),
                required: None,
                default: None,
                extra: Map::new(),
            },
        );
        self
    }

    /// Declares a parameter and marks it as required.
    pub fn add_required_property(
        self,
        name: impl Into<String>,
        property_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.add_property(name.clone(), property_type, description)
            .require(name)
    }

    /// Declares an optional parameter that falls back to `default` when omitted.
    pub fn add_property_with_default(
        self,
        name: impl Into<String>,
        property_type: impl Into<String>,
        description: impl Into<String>,
        default: Value,
    ) -> Self {
        let name = name.into();
        self.add_property(name.clone(), property_type, description)
            .default_value(name, default)
    }

    /// Marks an already declared parameter as required. Checked on `build`.
    pub fn require(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.function_required.contains(&name) {
            self.function_required.push(name);
        }
        self
    }

    /// Sets the value bound when the caller leaves the parameter out.
    pub fn default_value(mut self, name: impl Into<String>, default: Value) -> Self {
        let name = name.into();
        match self.function_properties.get_mut(&name) {
            Some(prop) => prop.default = Some(default),
            None => {
                self.declaration_error.get_or_insert(ToolBuilderError::InvalidParameter {
                    name,
                    reason: "default set for an undeclared parameter".into(),
                });
            }
        }
        self
    }

    /// Declares a parameter from its shorthand or detailed form.
    pub fn parameter(mut self, name: impl Into<String>, decl: impl Into<ParamDecl>) -> Self {
        let name = name.into();
        let (property, required) = match decl.into() {
            ParamDecl::Type(property_type) => (
                Property {
                    property_type,
                    description: None,
                    required: None,
                    default: None,
                    extra: Map::new(),
                },
                true,
            ),
            ParamDecl::Detailed(property) => {
                let required = property.required.unwrap_or(true);
                (property, required)
            }
        };
        self.function_properties.insert(name.clone(), property);
        if required {
            self.require(name)
        } else {
            self.function_required.retain(|n| n != &name);
            self
        }
    }

    /// Declares parameters from a JSON object mapping each name to either a
    /// type string (`{"text": "string"}`) or a property object
    /// (`{"format": {"type": "string", "required": false}}`). Parameters are
    /// bound in the object's key order.
    pub fn parameters(mut self, declarations: Value) -> Self {
        let Value::Object(map) = declarations else {
            self.declaration_error.get_or_insert(ToolBuilderError::InvalidParameter {
                name: "<parameters>".into(),
                reason: "parameter declarations must be a JSON object".into(),
            });
            return self;
        };

        for (name, decl) in map {
            let decl = match decl {
                Value::String(t) => ParamDecl::Type(t),
                obj @ Value::Object(_) => match serde_json::from_value::<Property>(obj) {
                    Ok(property) => ParamDecl::Detailed(property),
                    Err(e) => {
                        self.declaration_error.get_or_insert(ToolBuilderError::InvalidParameter {
                            name,
                            reason: e.to_string(),
                        });
                        continue;
                    }
                },
                other => {
                    self.declaration_error.get_or_insert(ToolBuilderError::InvalidParameter {
                        name,
                        reason: format!("expected a type name or an object, got {other}"),
                    });
                    continue;
                }
            };
            self = self.parameter(name, decl);
        }
        self
    }

    /// Sets the asynchronous executor function for the tool. (Required for building)
    pub fn executor(mut self, exec: AsyncToolFn) -> Self {
        self.executor = Some(exec);
        self
    }

    /// Like [`executor`](Self::executor), wrapping any async closure.
    pub fn executor_fn<F, Fut, O>(self, f: F) -> Self
    where
        F: Fn(BoundArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, ToolExecutionError>> + Send + 'static,
        O: Into<ToolOutput> + Send + 'static,
    {
        let f = Arc::new(f);
        let exec: AsyncToolFn = Arc::new(
            move |args: BoundArguments| -> BoxFuture<'static, Result<ToolOutput, ToolExecutionError>> {
                let f = Arc::clone(&f);
                Box::pin(async move { f(args).await.map(Into::<ToolOutput>::into) })
            },
        );
        self.executor(exec)
    }

    /// Consumes the builder and attempts to create a `Tool`.
    ///
    /// # Errors
    /// Returns a `ToolBuilderError` if required fields are missing, a
    /// declaration was malformed, or a required name was never declared.
    pub fn build(self) -> Result<Tool, ToolBuilderError> {
        let function_name = self.function_name.ok_or(ToolBuilderError::MissingFunctionName)?;
        let function_description = self
            .function_description
            .ok_or(ToolBuilderError::MissingFunctionDescription)?;
        let executor = self.executor.ok_or(ToolBuilderError::MissingExecutor)?;

        if let Some(err) = self.declaration_error {
            return Err(err);
        }

        if let Some(undeclared) = self
            .function_required
            .iter()
            .find(|name| !self.function_properties.contains_key(*name))
        {
            return Err(ToolBuilderError::UndeclaredRequiredProperty(undeclared.clone()));
        }

        let bindings: Arc<[ParamBinding]> = self
            .function_properties
            .iter()
            .map(|(name, prop)| ParamBinding {
                name: name.clone(),
                default: prop.default.clone(),
            })
            .collect();

        Ok(Tool {
            tool_type: self.tool_type.unwrap_or_default(),
            function: Function {
                name: function_name,
                description: function_description,
                parameters: FunctionParameters {
                    param_type: "object".to_string(),
                    properties: self.function_properties,
                    required: self.function_required,
                },
            },
            bindings,
            executor,
        })
    }
}
