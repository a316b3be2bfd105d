//! Request validation
//!
//! Turns a raw JSON body into a typed [`GenerationRequest`] for one capability, or a
//! field-level error map. Validation is local and never performs I/O; failures are returned as
//! [`MediaError::ValidationError`] values.
//!
//! Checking happens in two passes: every known field is first decoded to its expected JSON type
//! (type mismatches are reported against the field), then the typed input is checked with
//! `validator` rules.

pub mod rules;

use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{FieldErrors, MediaError};
use crate::types::{Capability, GenerationRequest, VideoDuration};
use crate::utils::data_uri::DataUri;

use rules::{
    DURATION_MESSAGE, IMAGE_MESSAGE, PROMPT_MESSAGE, REQUIRED_MESSAGE, json_type_name, wire_name,
};

type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Typed image-to-image input before conversion.
#[derive(Debug, Default, Validate)]
struct ImageToImageInput {
    #[validate(
        required(message = "Required"),
        custom(function = "rules::validate_image_data_uri")
    )]
    image: Option<String>,
    #[validate(
        required(message = "Required"),
        length(min = 1, message = "Prompt cannot be empty")
    )]
    prompt: Option<String>,
    seed: Option<i64>,
    #[validate(required(message = "Required"))]
    model_id: Option<String>,
    #[validate(required(message = "Required"))]
    provider: Option<String>,
}

/// Typed image-to-video input before conversion.
#[derive(Debug, Default, Validate)]
struct ImageToVideoInput {
    #[validate(
        required(message = "Required"),
        custom(function = "rules::validate_image_data_uri")
    )]
    image: Option<String>,
    #[validate(
        required(message = "Required"),
        length(min = 1, message = "Prompt cannot be empty")
    )]
    prompt: Option<String>,
    #[validate(
        required(message = "Duration must be the number 5 or 10"),
        custom(function = "rules::validate_video_duration")
    )]
    duration: Option<u32>,
    #[validate(required(message = "Required"))]
    model_id: Option<String>,
    #[validate(
        required(message = "Required"),
        custom(function = "rules::validate_video_provider")
    )]
    provider: Option<String>,
}

/// Validate `raw` as a request for `capability`.
pub fn validate(
    capability: Capability,
    raw: &serde_json::Value,
) -> Result<GenerationRequest, MediaError> {
    let Some(body) = raw.as_object() else {
        return Err(MediaError::ValidationError(FieldErrors::single(
            "body",
            format!("Expected object, received {}", json_type_name(raw)),
        )));
    };

    match capability {
        Capability::ImageToImage => validate_image_to_image(body),
        Capability::ImageToVideo => validate_image_to_video(body),
    }
}

/// Validate a raw request body, reporting undecodable JSON as a body-level error.
pub fn validate_bytes(capability: Capability, raw: &[u8]) -> Result<GenerationRequest, MediaError> {
    validate(capability, &parse_body(raw)?)
}

/// Decode a request body as JSON.
pub fn parse_body(raw: &[u8]) -> Result<serde_json::Value, MediaError> {
    serde_json::from_slice(raw).map_err(|e| {
        MediaError::ValidationError(FieldErrors::single("body", format!("Invalid JSON: {e}")))
    })
}

fn validate_image_to_image(body: &JsonObject) -> Result<GenerationRequest, MediaError> {
    let mut type_errors = FieldErrors::new();
    let input = ImageToImageInput {
        image: decode_field(body, "image", "string", None, &mut type_errors),
        prompt: decode_field(body, "prompt", "string", None, &mut type_errors),
        seed: decode_integer(body, "seed", None, &mut type_errors),
        model_id: decode_field(body, "modelId", "string", None, &mut type_errors),
        provider: decode_field(body, "provider", "string", None, &mut type_errors),
    };
    check(input.validate(), type_errors)?;

    let ImageToImageInput {
        image: Some(image),
        prompt: Some(prompt),
        seed,
        model_id: Some(model_id),
        provider: Some(provider),
    } = input
    else {
        return Err(missing_after_validation());
    };

    Ok(GenerationRequest {
        capability: Capability::ImageToImage,
        source_image: parse_image(image)?,
        prompt,
        provider,
        model_id,
        seed,
        duration: None,
    })
}

fn validate_image_to_video(body: &JsonObject) -> Result<GenerationRequest, MediaError> {
    let mut type_errors = FieldErrors::new();
    let input = ImageToVideoInput {
        image: decode_field(body, "image", "string", None, &mut type_errors),
        prompt: decode_field(body, "prompt", "string", None, &mut type_errors),
        duration: decode_integer(body, "duration", Some(DURATION_MESSAGE), &mut type_errors)
            .and_then(|seconds| duration_seconds(seconds, &mut type_errors)),
        model_id: decode_field(body, "modelId", "string", None, &mut type_errors),
        provider: decode_field(body, "provider", "string", None, &mut type_errors),
    };
    check(input.validate(), type_errors)?;

    let ImageToVideoInput {
        image: Some(image),
        prompt: Some(prompt),
        duration: Some(duration),
        model_id: Some(model_id),
        provider: Some(provider),
    } = input
    else {
        return Err(missing_after_validation());
    };

    let duration = VideoDuration::try_from(duration).map_err(|_| {
        MediaError::ValidationError(FieldErrors::single("duration", DURATION_MESSAGE))
    })?;

    Ok(GenerationRequest {
        capability: Capability::ImageToVideo,
        source_image: parse_image(image)?,
        prompt,
        provider,
        model_id,
        seed: None,
        duration: Some(duration),
    })
}

/// Decode one field, recording a type error against it on mismatch.
///
/// Absent fields decode to `None` without an error; `required` rules catch them later.
fn decode_field<T: DeserializeOwned>(
    body: &JsonObject,
    name: &str,
    expected: &str,
    type_message: Option<&str>,
    errors: &mut FieldErrors,
) -> Option<T> {
    let value = body.get(name)?;
    match serde_json::from_value::<T>(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(_) => {
            let message = type_message.map(str::to_string).unwrap_or_else(|| {
                format!("Expected {expected}, received {}", json_type_name(value))
            });
            errors.add(name, message);
            None
        }
    }
}

/// Decode an integer field. JSON numbers with no fractional part (`5.0`) count as integers.
fn decode_integer(
    body: &JsonObject,
    name: &str,
    type_message: Option<&str>,
    errors: &mut FieldErrors,
) -> Option<i64> {
    let value = body.get(name)?;
    let decoded = match value {
        serde_json::Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    };
    if decoded.is_none() {
        let message = type_message.map(str::to_string).unwrap_or_else(|| {
            format!("Expected integer, received {}", json_type_name(value))
        });
        errors.add(name, message);
    }
    decoded
}

fn duration_seconds(seconds: i64, errors: &mut FieldErrors) -> Option<u32> {
    let seconds = u32::try_from(seconds).ok();
    if seconds.is_none() {
        errors.add("duration", DURATION_MESSAGE);
    }
    seconds
}

/// Merge rule failures with type failures; a type failure replaces the rule failures of the
/// same field (they would only repeat "Required").
fn check(
    result: Result<(), validator::ValidationErrors>,
    type_errors: FieldErrors,
) -> Result<(), MediaError> {
    let mut errors = match result {
        Ok(()) => FieldErrors::new(),
        Err(errors) => from_validator(&errors),
    };
    let typed_fields: Vec<String> = type_errors.fields().map(str::to_string).collect();
    for field in &typed_fields {
        errors.remove(field);
    }
    errors.extend(type_errors);

    if errors.is_empty() {
        Ok(())
    } else {
        tracing::warn!(errors = %errors, "input validation failed");
        Err(MediaError::ValidationError(errors))
    }
}

fn from_validator(errors: &validator::ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors.iter() {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| match &*error.code {
                    "required" => REQUIRED_MESSAGE.to_string(),
                    "length" => PROMPT_MESSAGE.to_string(),
                    code => code.to_string(),
                });
            out.add(wire_name(&field), message);
        }
    }
    out
}

fn parse_image(image: String) -> Result<DataUri, MediaError> {
    DataUri::parse(image)
        .ok_or_else(|| MediaError::ValidationError(FieldErrors::single("image", IMAGE_MESSAGE)))
}

fn missing_after_validation() -> MediaError {
    MediaError::ValidationError(FieldErrors::single("body", REQUIRED_MESSAGE))
}
