use std::env;
use std::io::Write;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use tripmate_cli::commands::{bookings, config, doctor, parse, stats};
use tripmate_core::config::LoadOptions;

#[test]
fn parse_reports_inferred_parameters() {
    with_env(&[], || {
        let result = parse::run("Khách sạn Đà Nẵng 2025-12-20, 3 đêm, dưới 2 triệu");
        assert_eq!(result.exit_code, 0, "expected successful parse");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "parse");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["params"]["city"], "Đà Nẵng");
        assert_eq!(payload["data"]["params"]["duration"], 3);
        assert_eq!(payload["data"]["params"]["max_price"], 2_000_000);
        assert_eq!(payload["data"]["params"]["establishment_type"], "HOTEL");

        let labels: Vec<&str> = payload["data"]["labelled"]
            .as_array()
            .expect("labelled array")
            .iter()
            .filter_map(|entry| entry["label"].as_str())
            .collect();
        assert!(labels.contains(&"Thành phố"));
    });
}

#[test]
fn parse_of_unrelated_text_succeeds_without_parameters() {
    with_env(&[], || {
        let result = parse::run("xin chào");
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["message"], "no parameters recognised");
        assert_eq!(payload["data"]["booking_ready"], false);
    });
}

#[test]
fn parse_rejects_blank_text() {
    with_env(&[], || {
        let result = parse::run("   ");
        assert_eq!(result.exit_code, 1, "expected invalid input code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "invalid_input");
    });
}

#[test]
fn bookings_returns_config_failure_for_invalid_base_url() {
    with_env(&[("TRIPMATE_BOOKING_API_BASE_URL", "localhost:8080")], || {
        let result = bookings::run(LoadOptions::default());
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "bookings");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn stats_reports_unreachable_agent_as_remote_failure() {
    with_env(&[("TRIPMATE_AGENT_BASE_URL", "http://127.0.0.1:9")], || {
        let result = stats::run(LoadOptions::default());
        assert_eq!(result.exit_code, 3, "expected remote failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "stats");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "remote");
    });
}

#[test]
fn doctor_json_skips_probes_when_config_is_invalid() {
    with_env(&[("TRIPMATE_ASSISTANT_MODE", "chatty")], || {
        let output = doctor::run(LoadOptions::default(), true);
        let payload = parse_payload(&output);

        assert_eq!(payload["overall_status"], "fail");
        let checks = payload["checks"].as_array().expect("checks array");
        assert_eq!(checks.len(), 3);
        assert_eq!(checks[0]["name"], "config_validation");
        assert_eq!(checks[0]["status"], "fail");
        assert_eq!(checks[1]["status"], "skipped");
        assert_eq!(checks[2]["name"], "agent_health");
        assert_eq!(checks[2]["status"], "skipped");
    });
}

#[test]
fn config_attributes_env_values_and_redacts_token() {
    with_env(
        &[
            ("TRIPMATE_AGENT_BASE_URL", "http://agent-from-env:8000"),
            ("TRIPMATE_BOOKING_API_AUTH_TOKEN", "super-secret-token"),
        ],
        || {
            let output = config::run(LoadOptions::default());

            assert!(output.contains(
                "- agent.base_url = http://agent-from-env:8000 (source: env (TRIPMATE_AGENT_BASE_URL))"
            ));
            assert!(output.contains("- booking_api.auth_token = supe***"));
            assert!(!output.contains("super-secret-token"));
            assert!(output.contains("- assistant.mode = quiz (source: default)"));
        },
    );
}

#[test]
fn config_attributes_file_values() {
    with_env(&[], || {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[assistant]\nuser_id = 7\nmode = \"agent\"").expect("write config");

        let options =
            LoadOptions { config_path: Some(file.path().to_path_buf()), ..LoadOptions::default() };
        let output = config::run(options);

        let expected_source = format!("(source: file ({}))", file.path().display());
        assert!(output.contains(&format!("- assistant.user_id = 7 {expected_source}")));
        assert!(output.contains(&format!("- assistant.mode = agent {expected_source}")));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid json")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "TRIPMATE_BOOKING_API_BASE_URL",
        "TRIPMATE_BOOKING_API_AUTH_TOKEN",
        "TRIPMATE_BOOKING_API_TIMEOUT_SECS",
        "TRIPMATE_AGENT_BASE_URL",
        "TRIPMATE_AGENT_TIMEOUT_SECS",
        "TRIPMATE_ASSISTANT_MODE",
        "TRIPMATE_ASSISTANT_USER_ID",
        "TRIPMATE_ASSISTANT_MAX_AUTO_RESENDS",
        "TRIPMATE_LOGGING_LEVEL",
        "TRIPMATE_LOGGING_FORMAT",
        "TRIPMATE_LOG_LEVEL",
        "TRIPMATE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}
