//! Decoding of the loosely-shaped JSON the booking backend returns.
//!
//! `/booking/process` answers with either a quiz step object or a list of
//! suggestions, and list endpoints sometimes wrap their arrays in an envelope.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::domain::quiz::QuizStep;
use crate::domain::suggestion::Suggestion;

/// Envelope fields that may carry a list, checked in this order.
pub const LIST_FIELDS: [&str; 5] = ["content", "items", "suggestions", "results", "data"];

#[derive(Clone, Debug, PartialEq)]
pub enum ProcessResponse {
    Quiz(QuizStep),
    Suggestions(Vec<Suggestion>),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("response is neither a quiz step nor a suggestion list: {shape}")]
    UnrecognizedShape { shape: &'static str },
    #[error("could not decode {what}: {source}")]
    Invalid { what: &'static str, source: serde_json::Error },
}

pub fn decode_process_response(value: Value) -> Result<ProcessResponse, DecodeError> {
    let is_quiz = value.as_object().is_some_and(|object| object.contains_key("quiz_completed"));
    if is_quiz {
        return serde_json::from_value::<QuizStep>(value)
            .map(ProcessResponse::Quiz)
            .map_err(|source| DecodeError::Invalid { what: "quiz step", source });
    }

    match value {
        Value::Array(_) => decode_suggestions(value),
        Value::Object(mut object) => {
            let listed = LIST_FIELDS
                .iter()
                .find(|field| object.get(**field).is_some_and(Value::is_array))
                .and_then(|field| object.remove(*field));
            match listed {
                Some(list) => decode_suggestions(list),
                None => Err(DecodeError::UnrecognizedShape { shape: "object" }),
            }
        }
        other => Err(DecodeError::UnrecognizedShape { shape: shape_name(&other) }),
    }
}

/// Decodes a list endpoint. Unknown shapes yield an empty list, items that
/// fail to decode are an error.
pub fn decode_list<T>(value: Value) -> Result<Vec<T>, DecodeError>
where
    T: DeserializeOwned,
{
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut object) => {
            match LIST_FIELDS.iter().find(|field| object.get(**field).is_some_and(Value::is_array))
            {
                Some(field) => object.remove(*field).unwrap_or(Value::Array(Vec::new())),
                None => return Ok(Vec::new()),
            }
        }
        _ => return Ok(Vec::new()),
    };

    serde_json::from_value(list).map_err(|source| DecodeError::Invalid { what: "list", source })
}

fn decode_suggestions(list: Value) -> Result<ProcessResponse, DecodeError> {
    serde_json::from_value::<Vec<Suggestion>>(list)
        .map(ProcessResponse::Suggestions)
        .map_err(|source| DecodeError::Invalid { what: "suggestions", source })
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
