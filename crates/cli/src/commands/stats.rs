use tripmate_agent::backend::AgentBackend;
use tripmate_agent::http::HttpAgentClient;
use tripmate_core::config::{AppConfig, LoadOptions};

use super::{block_on, CommandResult, EXIT_CONFIG, EXIT_REMOTE};

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "stats",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            );
        }
    };

    let client = match HttpAgentClient::from_config(&config.agent) {
        Ok(client) => client,
        Err(error) => {
            return CommandResult::failure("stats", "client_setup", error.to_string(), EXIT_CONFIG);
        }
    };

    match block_on(client.stats()) {
        Ok(Ok(stats)) => CommandResult::success_with_data(
            "stats",
            format!("agent service at {} is reachable", client.base_url()),
            Some(stats),
        ),
        Ok(Err(error)) => {
            CommandResult::failure("stats", "remote", error.to_string(), EXIT_REMOTE)
        }
        Err(message) => CommandResult::failure("stats", "runtime", message, EXIT_REMOTE),
    }
}
