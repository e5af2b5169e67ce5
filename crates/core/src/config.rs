use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flows::DialogueMode;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub booking_api: BookingApiConfig,
    pub agent: AgentConfig,
    pub assistant: AssistantConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct BookingApiConfig {
    pub base_url: String,
    pub auth_token: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AssistantConfig {
    pub mode: DialogueMode,
    pub user_id: i64,
    /// Upper bound on automatic follow-up requests for a single user turn.
    pub max_auto_resends: u32,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub booking_api_url: Option<String>,
    pub booking_api_token: Option<String>,
    pub agent_url: Option<String>,
    pub mode: Option<DialogueMode>,
    pub user_id: Option<i64>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            booking_api: BookingApiConfig {
                base_url: "http://localhost:8080/api".to_string(),
                auth_token: None,
                timeout_secs: 30,
            },
            agent: AgentConfig { base_url: "http://localhost:8000".to_string(), timeout_secs: 30 },
            assistant: AssistantConfig {
                mode: DialogueMode::Quiz,
                user_id: 1,
                max_auto_resends: 8,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("tripmate.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Exposes the bearer token for request signing; `None` when unset or blank.
    pub fn booking_auth_token(&self) -> Option<&str> {
        self.booking_api
            .auth_token
            .as_ref()
            .map(|token| token.expose_secret())
            .filter(|token| !token.trim().is_empty())
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(booking_api) = patch.booking_api {
            if let Some(base_url) = booking_api.base_url {
                self.booking_api.base_url = base_url;
            }
            if let Some(auth_token) = booking_api.auth_token {
                self.booking_api.auth_token = Some(secret_value(auth_token));
            }
            if let Some(timeout_secs) = booking_api.timeout_secs {
                self.booking_api.timeout_secs = timeout_secs;
            }
        }

        if let Some(agent) = patch.agent {
            if let Some(base_url) = agent.base_url {
                self.agent.base_url = base_url;
            }
            if let Some(timeout_secs) = agent.timeout_secs {
                self.agent.timeout_secs = timeout_secs;
            }
        }

        if let Some(assistant) = patch.assistant {
            if let Some(mode) = assistant.mode {
                self.assistant.mode = mode;
            }
            if let Some(user_id) = assistant.user_id {
                self.assistant.user_id = user_id;
            }
            if let Some(max_auto_resends) = assistant.max_auto_resends {
                self.assistant.max_auto_resends = max_auto_resends;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TRIPMATE_BOOKING_API_BASE_URL") {
            self.booking_api.base_url = value;
        }
        if let Some(value) = read_env("TRIPMATE_BOOKING_API_AUTH_TOKEN") {
            self.booking_api.auth_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("TRIPMATE_BOOKING_API_TIMEOUT_SECS") {
            self.booking_api.timeout_secs = parse_u64("TRIPMATE_BOOKING_API_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TRIPMATE_AGENT_BASE_URL") {
            self.agent.base_url = value;
        }
        if let Some(value) = read_env("TRIPMATE_AGENT_TIMEOUT_SECS") {
            self.agent.timeout_secs = parse_u64("TRIPMATE_AGENT_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TRIPMATE_ASSISTANT_MODE") {
            self.assistant.mode = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "TRIPMATE_ASSISTANT_MODE".to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = read_env("TRIPMATE_ASSISTANT_USER_ID") {
            self.assistant.user_id = parse_i64("TRIPMATE_ASSISTANT_USER_ID", &value)?;
        }
        if let Some(value) = read_env("TRIPMATE_ASSISTANT_MAX_AUTO_RESENDS") {
            self.assistant.max_auto_resends =
                parse_u32("TRIPMATE_ASSISTANT_MAX_AUTO_RESENDS", &value)?;
        }

        let log_level =
            read_env("TRIPMATE_LOGGING_LEVEL").or_else(|| read_env("TRIPMATE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TRIPMATE_LOGGING_FORMAT").or_else(|| read_env("TRIPMATE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.booking_api_url {
            self.booking_api.base_url = base_url;
        }
        if let Some(token) = overrides.booking_api_token {
            self.booking_api.auth_token = Some(secret_value(token));
        }
        if let Some(base_url) = overrides.agent_url {
            self.agent.base_url = base_url;
        }
        if let Some(mode) = overrides.mode {
            self.assistant.mode = mode;
        }
        if let Some(user_id) = overrides.user_id {
            self.assistant.user_id = user_id;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_booking_api(&self.booking_api)?;
        validate_agent(&self.agent)?;
        validate_assistant(&self.assistant)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("tripmate.toml"), PathBuf::from("config/tripmate.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_http_url(field: &str, url: &str) -> Result<(), ConfigError> {
    let url = url.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn validate_timeout(field: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs == 0 || timeout_secs > 300 {
        return Err(ConfigError::Validation(format!("{field} must be in range 1..=300")));
    }
    Ok(())
}

fn validate_booking_api(booking_api: &BookingApiConfig) -> Result<(), ConfigError> {
    validate_http_url("booking_api.base_url", &booking_api.base_url)?;
    validate_timeout("booking_api.timeout_secs", booking_api.timeout_secs)?;

    if let Some(token) = &booking_api.auth_token {
        let token = token.expose_secret();
        if token.chars().any(char::is_whitespace) && !token.trim().is_empty() {
            return Err(ConfigError::Validation(
                "booking_api.auth_token must not contain whitespace (omit the `Bearer ` prefix)"
                    .to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_agent(agent: &AgentConfig) -> Result<(), ConfigError> {
    validate_http_url("agent.base_url", &agent.base_url)?;
    validate_timeout("agent.timeout_secs", agent.timeout_secs)
}

fn validate_assistant(assistant: &AssistantConfig) -> Result<(), ConfigError> {
    if assistant.user_id <= 0 {
        return Err(ConfigError::Validation(
            "assistant.user_id must be greater than zero".to_string(),
        ));
    }

    if assistant.max_auto_resends == 0 || assistant.max_auto_resends > 32 {
        return Err(ConfigError::Validation(
            "assistant.max_auto_resends must be in range 1..=32".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    booking_api: Option<BookingApiPatch>,
    agent: Option<AgentPatch>,
    assistant: Option<AssistantPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct BookingApiPatch {
    base_url: Option<String>,
    auth_token: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AgentPatch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AssistantPatch {
    mode: Option<DialogueMode>,
    user_id: Option<i64>,
    max_auto_resends: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::flows::DialogueMode;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_load_without_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(
            config.booking_api.base_url == "http://localhost:8080/api",
            "booking api should default to the local backend",
        )?;
        ensure(config.assistant.mode == DialogueMode::Quiz, "quiz mode should be the default")?;
        ensure(config.booking_auth_token().is_none(), "no token should be configured")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_TRIPMATE_TOKEN", "token-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("tripmate.toml");
            fs::write(
                &path,
                r#"
[booking_api]
base_url = "https://booking.example.test/api"
auth_token = "${TEST_TRIPMATE_TOKEN}"

[assistant]
mode = "agent"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.booking_auth_token() == Some("token-from-env"),
                "token should be interpolated from the environment",
            )?;
            ensure(config.assistant.mode == DialogueMode::Agent, "mode should come from file")?;
            Ok(())
        })();

        clear_vars(&["TEST_TRIPMATE_TOKEN"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TRIPMATE_AGENT_BASE_URL", "http://agent-from-env:8000");
        env::set_var("TRIPMATE_ASSISTANT_USER_ID", "42");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("tripmate.toml");
            fs::write(
                &path,
                r#"
[booking_api]
base_url = "http://booking-from-file/api"

[agent]
base_url = "http://agent-from-file:8000"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    booking_api_url: Some("http://booking-from-override/api".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.booking_api.base_url == "http://booking-from-override/api",
                "override booking url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.agent.base_url == "http://agent-from-env:8000",
                "env agent url should win over file and defaults",
            )?;
            ensure(config.assistant.user_id == 42, "user id should come from env")?;
            Ok(())
        })();

        clear_vars(&["TRIPMATE_AGENT_BASE_URL", "TRIPMATE_ASSISTANT_USER_ID"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TRIPMATE_LOG_LEVEL", "warn");
        env::set_var("TRIPMATE_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["TRIPMATE_LOG_LEVEL", "TRIPMATE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn invalid_env_values_are_reported_with_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TRIPMATE_ASSISTANT_MODE", "chatty");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected env override failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::InvalidEnvOverride { ref key, .. }
                        if key == "TRIPMATE_ASSISTANT_MODE"
                ),
                "error should name the offending variable",
            )
        })();

        clear_vars(&["TRIPMATE_ASSISTANT_MODE"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TRIPMATE_BOOKING_API_BASE_URL", "localhost:8080");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("booking_api.base_url")
            );
            ensure(has_message, "validation failure should mention booking_api.base_url")
        })();

        clear_vars(&["TRIPMATE_BOOKING_API_BASE_URL"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TRIPMATE_BOOKING_API_AUTH_TOKEN", "super-secret-token");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("super-secret-token"), "debug output should not contain token")?;
            ensure(
                config.booking_auth_token() == Some("super-secret-token"),
                "token should still be exposed for request signing",
            )?;
            Ok(())
        })();

        clear_vars(&["TRIPMATE_BOOKING_API_AUTH_TOKEN"]);
        result
    }
}
