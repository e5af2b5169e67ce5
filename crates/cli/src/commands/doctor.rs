use std::time::Instant;

use serde::Serialize;
use tripmate_agent::backend::AgentBackend;
use tripmate_agent::http::{HttpAgentClient, HttpBookingClient};
use tripmate_core::config::{AppConfig, LoadOptions};

use super::block_on;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: LoadOptions, json_output: bool) -> String {
    let report = build_report(options);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_booking_client(&config));
            checks.push(check_agent_health(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["booking_api_client", "agent_health"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "not run: configuration is invalid".to_string(),
                });
            }
        }
    }

    let failing = checks.iter().filter(|check| check.status != CheckStatus::Pass).count();
    let overall_status = if failing == 0 { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = match failing {
        0 => "doctor: tripmate is ready to chat".to_string(),
        count => format!("doctor: {count} of {} check(s) need attention", checks.len()),
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_booking_client(config: &AppConfig) -> DoctorCheck {
    match HttpBookingClient::from_config(&config.booking_api) {
        Ok(client) => {
            let auth = if config.booking_auth_token().is_some() {
                "bearer token set"
            } else {
                "no bearer token"
            };
            DoctorCheck {
                name: "booking_api_client",
                status: CheckStatus::Pass,
                details: format!("client ready for `{}` ({auth})", client.base_url()),
            }
        }
        Err(error) => DoctorCheck {
            name: "booking_api_client",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_agent_health(config: &AppConfig) -> DoctorCheck {
    let client = match HttpAgentClient::from_config(&config.agent) {
        Ok(client) => client,
        Err(error) => {
            return DoctorCheck {
                name: "agent_health",
                status: CheckStatus::Fail,
                details: error.to_string(),
            };
        }
    };

    let started = Instant::now();
    match block_on(client.stats()) {
        Ok(Ok(_)) => DoctorCheck {
            name: "agent_health",
            status: CheckStatus::Pass,
            details: format!(
                "`{}` answered /agent/stats in {} ms",
                client.base_url(),
                started.elapsed().as_millis()
            ),
        },
        Ok(Err(error)) => DoctorCheck {
            name: "agent_health",
            status: CheckStatus::Fail,
            details: format!("{error}; chat will fall back to quiz mode"),
        },
        Err(error) => {
            DoctorCheck { name: "agent_health", status: CheckStatus::Fail, details: error }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let rows = report.checks.iter().map(|check| {
        let marker = match check.status {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skipped => "SKIP",
        };
        format!("  {marker}  {:<20} {}", check.name, check.details)
    });

    std::iter::once(report.summary.clone()).chain(rows).collect::<Vec<_>>().join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
