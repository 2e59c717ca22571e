use serde::Serialize;
use serde_json::{json, Value};

use crate::error::CliError;

pub fn render(value: &Value, pretty: bool) -> Result<(), CliError> {
    println!("{}", to_text(value, pretty)?);
    Ok(())
}

/// Prints `{"error": {"code", "message"}}` so callers always get JSON.
pub fn render_error(error: &CliError, pretty: bool) -> Result<(), CliError> {
    render(&error_object(error), pretty)
}

pub fn error_object(error: &CliError) -> Value {
    json!({
        "error": {
            "code": error.code(),
            "message": error.to_string(),
        }
    })
}

fn to_text<T: Serialize>(value: &T, pretty: bool) -> Result<String, CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}
