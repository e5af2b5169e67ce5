//! reqwest clients for the booking REST API and the agent service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use tripmate_core::config::{AgentConfig, BookingApiConfig};
use tripmate_core::decode::{decode_list, decode_process_response, ProcessResponse};
use tripmate_core::domain::agent::{AgentChatRequest, AgentChatResponse, AgentSearchRequest};
use tripmate_core::domain::booking::{Booking, BookingConfirmation};
use tripmate_core::domain::quiz::QuizRequest;
use tripmate_core::errors::{ApplicationError, GENERIC_USER_MESSAGE};

use crate::backend::{AgentBackend, BookingBackend};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16, message: Option<String> },
    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Decode { .. } => None,
        }
    }

    /// The server's own message when it sent one, otherwise the generic text.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message: Some(message), .. } if !message.trim().is_empty() => {
                message.clone()
            }
            _ => GENERIC_USER_MESSAGE.to_string(),
        }
    }
}

impl From<ClientError> for ApplicationError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Status { status, message, .. } => Self::Remote { status, message },
            other => Self::Integration(other.to_string()),
        }
    }
}

/// Pulls `message` (or `error`) out of a JSON error body.
pub fn error_message_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(ToString::to_string)
}

fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn build_client(base_url: &str, timeout: Duration) -> Result<Client, ClientError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|source| ClientError::Transport { url: base_url.to_string(), source })
}

async fn send_json(url: &str, request: RequestBuilder) -> Result<Value, ClientError> {
    let response = request
        .send()
        .await
        .map_err(|source| ClientError::Transport { url: url.to_string(), source })?;
    read_json(url, response).await
}

async fn read_json(url: &str, response: Response) -> Result<Value, ClientError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| ClientError::Transport { url: url.to_string(), source })?;

    if !status.is_success() {
        return Err(ClientError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            message: error_message_from_body(&body),
        });
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body)
        .map_err(|error| ClientError::Decode { url: url.to_string(), reason: error.to_string() })
}

fn decode<T: DeserializeOwned>(url: &str, value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value)
        .map_err(|error| ClientError::Decode { url: url.to_string(), reason: error.to_string() })
}

#[derive(Clone, Debug)]
pub struct HttpBookingClient {
    client: Client,
    base_url: String,
    auth_token: Option<SecretString>,
}

impl HttpBookingClient {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        let client = build_client(&base_url, timeout)?;
        Ok(Self { client, base_url, auth_token })
    }

    pub fn from_config(config: &BookingApiConfig) -> Result<Self, ClientError> {
        Self::new(
            config.base_url.clone(),
            config.auth_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }
}

#[async_trait]
impl BookingBackend for HttpBookingClient {
    async fn process(&self, request: &QuizRequest) -> Result<ProcessResponse, ClientError> {
        let url = join_url(&self.base_url, "/booking/process");
        debug!(event_name = "http.booking.process", url = %url, "forwarding quiz request");
        let value = send_json(&url, self.authorized(self.client.post(&url).json(request))).await?;
        decode_process_response(value)
            .map_err(|error| ClientError::Decode { url, reason: error.to_string() })
    }

    async fn confirm(&self, confirmation: &BookingConfirmation) -> Result<Value, ClientError> {
        let url = join_url(&self.base_url, "/booking/confirm-payment");
        debug!(
            event_name = "http.booking.confirm",
            url = %url,
            establishment_id = %confirmation.establishment_id,
            "confirming booking"
        );
        send_json(&url, self.authorized(self.client.post(&url).json(confirmation))).await
    }

    async fn user_bookings(&self, user_id: i64) -> Result<Vec<Booking>, ClientError> {
        let url = join_url(&self.base_url, &format!("/booking/user/view/{user_id}"));
        let value = send_json(&url, self.authorized(self.client.get(&url))).await?;
        decode_list(value).map_err(|error| ClientError::Decode { url, reason: error.to_string() })
    }
}

#[derive(Clone, Debug)]
pub struct HttpAgentClient {
    client: Client,
    base_url: String,
}

impl HttpAgentClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        let client = build_client(&base_url, timeout)?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self, ClientError> {
        Self::new(config.base_url.clone(), Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl AgentBackend for HttpAgentClient {
    async fn chat(&self, request: &AgentChatRequest) -> Result<AgentChatResponse, ClientError> {
        let url = join_url(&self.base_url, "/agent/chat");
        debug!(
            event_name = "http.agent.chat",
            url = %url,
            session_id = %request.session_id,
            "sending agent chat"
        );
        let value = send_json(&url, self.client.post(&url).json(request)).await?;
        decode(&url, value)
    }

    async fn search(
        &self,
        request: &AgentSearchRequest,
    ) -> Result<AgentChatResponse, ClientError> {
        let url = join_url(&self.base_url, "/agent/search");
        let value = send_json(&url, self.client.post(&url).json(request)).await?;
        decode(&url, value)
    }

    async fn stats(&self) -> Result<Value, ClientError> {
        let url = join_url(&self.base_url, "/agent/stats");
        send_json(&url, self.client.get(&url)).await
    }
}
