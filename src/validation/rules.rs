//! Field rules shared by the request schemas

use std::borrow::Cow;

use validator::ValidationError;

use crate::registry::catalog::REPLICATE;
use crate::types::VideoDuration;

pub const REQUIRED_MESSAGE: &str = "Required";
pub const IMAGE_MESSAGE: &str = "Invalid image data URI format";
pub const PROMPT_MESSAGE: &str = "Prompt cannot be empty";
pub const DURATION_MESSAGE: &str = "Duration must be the number 5 or 10";

/// Prefix every source image must carry.
pub const IMAGE_DATA_URI_PREFIX: &str = "data:image/";

fn rule_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

pub fn validate_image_data_uri(value: &str) -> Result<(), ValidationError> {
    if value.starts_with(IMAGE_DATA_URI_PREFIX) {
        Ok(())
    } else {
        Err(rule_error("image_data_uri", IMAGE_MESSAGE))
    }
}

pub fn validate_video_duration(value: u32) -> Result<(), ValidationError> {
    VideoDuration::try_from(value)
        .map(|_| ())
        .map_err(|_| rule_error("duration", DURATION_MESSAGE))
}

/// Image-to-video is only wired for Replicate.
pub fn validate_video_provider(value: &str) -> Result<(), ValidationError> {
    if value == REPLICATE {
        Ok(())
    } else {
        Err(rule_error(
            "provider_literal",
            format!("Invalid literal value, expected \"{REPLICATE}\""),
        ))
    }
}

/// JSON type name used in type-mismatch messages.
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(n) if n.is_f64() => "float",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Map a Rust field name to its camelCase wire name (`model_id` -> `modelId`).
pub fn wire_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names() {
        assert_eq!(wire_name("model_id"), "modelId");
        assert_eq!(wire_name("modelId"), "modelId");
        assert_eq!(wire_name("prompt"), "prompt");
    }

    #[test]
    fn image_rule_checks_prefix() {
        assert!(validate_image_data_uri("data:image/jpeg;base64,AA").is_ok());
        assert!(validate_image_data_uri("data:text/plain;base64,AA").is_err());
        assert!(validate_image_data_uri("https://x/y.png").is_err());
    }

    #[test]
    fn duration_rule() {
        assert!(validate_video_duration(5).is_ok());
        assert!(validate_video_duration(10).is_ok());
        let err = validate_video_duration(7).unwrap_err();
        assert_eq!(err.message.as_deref(), Some(DURATION_MESSAGE));
    }
}
