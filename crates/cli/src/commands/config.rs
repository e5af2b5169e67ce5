use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use toml::Value;
use tripmate_core::config::{AppConfig, LoadOptions};

pub fn run(options: LoadOptions) -> String {
    let explicit_path = options.config_path.clone();
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(explicit_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let token = match config.booking_auth_token() {
        Some(token) => redact_token(token),
        None => "<unset>".to_string(),
    };

    let fields: [(&str, &[&str], String); 10] = [
        (
            "booking_api.base_url",
            &["TRIPMATE_BOOKING_API_BASE_URL"],
            config.booking_api.base_url.clone(),
        ),
        ("booking_api.auth_token", &["TRIPMATE_BOOKING_API_AUTH_TOKEN"], token),
        (
            "booking_api.timeout_secs",
            &["TRIPMATE_BOOKING_API_TIMEOUT_SECS"],
            config.booking_api.timeout_secs.to_string(),
        ),
        ("agent.base_url", &["TRIPMATE_AGENT_BASE_URL"], config.agent.base_url.clone()),
        (
            "agent.timeout_secs",
            &["TRIPMATE_AGENT_TIMEOUT_SECS"],
            config.agent.timeout_secs.to_string(),
        ),
        ("assistant.mode", &["TRIPMATE_ASSISTANT_MODE"], config.assistant.mode.to_string()),
        (
            "assistant.user_id",
            &["TRIPMATE_ASSISTANT_USER_ID"],
            config.assistant.user_id.to_string(),
        ),
        (
            "assistant.max_auto_resends",
            &["TRIPMATE_ASSISTANT_MAX_AUTO_RESENDS"],
            config.assistant.max_auto_resends.to_string(),
        ),
        (
            "logging.level",
            &["TRIPMATE_LOGGING_LEVEL", "TRIPMATE_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        (
            "logging.format",
            &["TRIPMATE_LOGGING_FORMAT", "TRIPMATE_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, env_keys, value) in fields {
        let source =
            field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

fn detect_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from("tripmate.toml"), PathBuf::from("config/tripmate.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the first four characters of long tokens so operators can tell
/// tokens apart.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.chars().count() <= 8 {
        return "<redacted>".to_string();
    }
    let prefix: String = trimmed.chars().take(4).collect();
    format!("{prefix}***")
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, redact_token};

    #[test]
    fn redacts_tokens() {
        assert_eq!(redact_token("short"), "<redacted>");
        assert_eq!(redact_token("eyJhbGciOiJIUzI1NiJ9"), "eyJh***");
    }

    #[test]
    fn finds_nested_keys() {
        let doc: Value = "[agent]\nbase_url = \"http://agent\"".parse().expect("toml");
        assert!(contains_path(&doc, "agent.base_url"));
        assert!(!contains_path(&doc, "agent.timeout_secs"));
    }
}
