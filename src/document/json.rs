//! JSON load and render
//!
//! JSON documents keep their key order but carry no other layout; they are
//! written back pretty-printed with two-space indentation.

use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

pub(super) fn parse(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Mapping(Mapping::new()));
    }
    serde_json::from_str(text).map_err(format_error)
}

pub(super) fn render(value: &Value) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value).map_err(format_error)?;
    text.push('\n');
    Ok(text)
}

fn format_error(err: serde_json::Error) -> Error {
    Error::Format {
        message: err.to_string(),
    }
}
