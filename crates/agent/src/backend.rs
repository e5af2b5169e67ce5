//! Seams to the two remote services the assistant talks to.

use async_trait::async_trait;
use serde_json::Value;
use tripmate_core::decode::ProcessResponse;
use tripmate_core::domain::agent::{AgentChatRequest, AgentChatResponse, AgentSearchRequest};
use tripmate_core::domain::booking::{Booking, BookingConfirmation};
use tripmate_core::domain::quiz::QuizRequest;

use crate::http::ClientError;

/// The quiz/search and booking REST API.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    /// `POST /booking/process`: next quiz step or a suggestion list.
    async fn process(&self, request: &QuizRequest) -> Result<ProcessResponse, ClientError>;

    /// `POST /booking/confirm-payment`.
    async fn confirm(&self, confirmation: &BookingConfirmation) -> Result<Value, ClientError>;

    /// `GET /booking/user/view/{user_id}`.
    async fn user_bookings(&self, user_id: i64) -> Result<Vec<Booking>, ClientError>;
}

/// The natural-language agent service.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    async fn chat(&self, request: &AgentChatRequest) -> Result<AgentChatResponse, ClientError>;

    /// One-shot ranked search; answers in the same shape as chat.
    async fn search(&self, request: &AgentSearchRequest)
        -> Result<AgentChatResponse, ClientError>;

    /// `GET /agent/stats`; doubles as the health probe.
    async fn stats(&self) -> Result<Value, ClientError>;

    async fn is_healthy(&self) -> bool {
        self.stats().await.is_ok()
    }
}
