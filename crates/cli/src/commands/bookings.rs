use std::sync::Arc;

use serde_json::{json, Value};
use tripmate_agent::http::{HttpAgentClient, HttpBookingClient};
use tripmate_agent::runtime::{AssistantRuntime, RuntimeSettings};
use tripmate_core::config::{AppConfig, LoadOptions};
use tripmate_core::domain::booking::Booking;
use tripmate_core::labels::format_vnd;

use super::{block_on, CommandResult, EXIT_CONFIG, EXIT_REMOTE};

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "bookings",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            );
        }
    };

    let runtime = match build_runtime(&config) {
        Ok(runtime) => runtime,
        Err(message) => {
            return CommandResult::failure("bookings", "client_setup", message, EXIT_CONFIG);
        }
    };

    match block_on(runtime.user_bookings()) {
        Ok(Ok(bookings)) => {
            let rows: Vec<Value> = bookings.iter().map(booking_row).collect();
            CommandResult::success_with_data(
                "bookings",
                format!("{} booking(s) for user {}", bookings.len(), config.assistant.user_id),
                Some(Value::Array(rows)),
            )
        }
        Ok(Err(error)) => {
            CommandResult::failure("bookings", "remote", error.user_message(), EXIT_REMOTE)
        }
        Err(message) => CommandResult::failure("bookings", "runtime", message, EXIT_REMOTE),
    }
}

pub(crate) fn build_runtime(config: &AppConfig) -> Result<AssistantRuntime, String> {
    let booking =
        HttpBookingClient::from_config(&config.booking_api).map_err(|error| error.to_string())?;
    let agent = HttpAgentClient::from_config(&config.agent).map_err(|error| error.to_string())?;
    Ok(AssistantRuntime::new(Arc::new(booking), Arc::new(agent), RuntimeSettings::from(config)))
}

fn booking_row(booking: &Booking) -> Value {
    json!({
        "id": booking.id,
        "establishment_id": booking.establishment_id,
        "start_date": booking.start_date.to_string(),
        "end_date": booking.end_date().to_string(),
        "nights": booking.duration,
        "total": format_vnd(booking.total_price_vnd),
        "status": booking.status.label(),
    })
}
