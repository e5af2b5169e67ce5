use chrono::Utc;
use serde_json::{json, Value};
use tripmate_agent::conversation::ParameterExtractor;
use tripmate_core::labels::{humanize_value, parameter_label};
use tripmate_core::validation::{is_valid_prompt, sanitize_input, validate_booking_params};

use super::{CommandResult, EXIT_INVALID_INPUT};

pub fn run(text: &str) -> CommandResult {
    if !is_valid_prompt(text) {
        return CommandResult::failure(
            "parse",
            "invalid_input",
            "text must contain 1..=1000 characters",
            EXIT_INVALID_INPUT,
        );
    }

    let params = ParameterExtractor::new().extract(&sanitize_input(text));
    let report = validate_booking_params(&params, Utc::now().date_naive());

    let labelled: Vec<Value> = params
        .iter()
        .map(|(key, value)| {
            json!({
                "key": key.as_str(),
                "label": parameter_label(key),
                "value": humanize_value(key, &value.to_string()),
            })
        })
        .collect();

    let message = if params.is_empty() {
        "no parameters recognised".to_string()
    } else {
        format!("recognised {} parameter(s)", params.len())
    };

    CommandResult::success_with_data(
        "parse",
        message,
        Some(json!({
            "params": params.to_json_map(),
            "labelled": labelled,
            "booking_ready": report.is_valid(),
            "validation_errors": report.errors,
        })),
    )
}
