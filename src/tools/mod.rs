pub mod builtin;
pub mod errors;
pub mod expression;
pub mod registry;
pub mod tool;
pub mod tool_builder;

pub use errors::{ToolBuilderError, ToolExecutionError};
pub use expression::ExpressionError;
pub use registry::ToolRegistry;
pub use tool::{
    AsyncToolFn, BoundArguments, Function, FunctionParameters, Property, Tool, ToolDefinition,
    ToolOutput, ToolType,
};
pub use tool_builder::{ParamDecl, ToolBuilder};
