use std::{fmt::Write, io::ErrorKind};

use chrono::Local;
use serde_json::json;
use tracing::error;

use super::{
    errors::{ToolBuilderError, ToolExecutionError},
    expression,
    tool::{BoundArguments, Tool},
    tool_builder::ToolBuilder,
};

pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The four convenience tools every registry can be seeded with.
///
/// Their declarations are fixed, so a build failure is a bug in this file.
/// Such a tool is logged and left out; `every_builtin_builds` in the tests
/// below is the guard against that.
pub fn common_tools() -> Vec<Tool> {
    [calculate_tool(), current_time_tool(), read_file_tool(), string_length_tool()]
        .into_iter()
        .filter_map(|built| {
            built
                .map_err(|e| error!(target: "tool", error = %e, "Failed to build built-in tool"))
                .ok()
        })
        .collect()
}

fn calculate_tool() -> Result<Tool, ToolBuilderError> {
    ToolBuilder::new()
        .function_name("calculate")
        .function_description("Perform basic mathematical calculations")
        .add_required_property("expression", "string", "Mathematical expression to evaluate")
        .executor_fn(|args: BoundArguments| async move {
            expression::evaluate(args.str(0)?).map_err(ToolExecutionError::failed)
        })
        .build()
}

fn current_time_tool() -> Result<Tool, ToolBuilderError> {
    ToolBuilder::new()
        .function_name("get_current_time")
        .function_description("Get the current date and time")
        .add_property_with_default(
            "format",
            "string",
            "strftime-style format (default: %Y-%m-%d %H:%M:%S)",
            json!(DEFAULT_TIME_FORMAT),
        )
        .executor_fn(|args: BoundArguments| async move { current_time(args.str(0)?) })
        .build()
}

fn read_file_tool() -> Result<Tool, ToolBuilderError> {
    ToolBuilder::new()
        .function_name("read_file")
        .function_description("Read contents of a text file")
        .add_required_property("filename", "string", "Path to the file to read")
        .executor_fn(|args: BoundArguments| async move { read_file(args.str(0)?).await })
        .build()
}

fn string_length_tool() -> Result<Tool, ToolBuilderError> {
    ToolBuilder::new()
        .function_name("string_length")
        .function_description("Get the length of a string")
        .add_required_property("text", "string", "Text to measure")
        .executor_fn(|args: BoundArguments| async move {
            Ok::<_, ToolExecutionError>(args.str(0)?.chars().count() as i64)
        })
        .build()
}

/// Local time rendered with a chrono format string.
pub fn current_time(format: &str) -> Result<String, ToolExecutionError> {
    let mut out = String::new();
    write!(out, "{}", Local::now().format(format))
        .map_err(|_| ToolExecutionError::failed(format!("Invalid time format: {format}")))?;
    Ok(out)
}

pub async fn read_file(filename: &str) -> Result<String, ToolExecutionError> {
    tokio::fs::read_to_string(filename).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => ToolExecutionError::failed(format!("File not found: {filename}")),
        _ => ToolExecutionError::failed(format!("File not readable: {filename} ({e})")),
    })
}
