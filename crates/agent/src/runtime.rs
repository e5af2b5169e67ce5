use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};
use tripmate_core::config::AppConfig;
use tripmate_core::domain::agent::{build_agent_context, search_strategy_for, AgentSearchRequest};
use tripmate_core::domain::booking::Booking;
use tripmate_core::domain::suggestion::Suggestion;
use tripmate_core::errors::{ApplicationError, DomainError};
use tripmate_core::flows::DialogueMode;

use crate::backend::{AgentBackend, BookingBackend};
use crate::session::{ConversationSession, OutboundRequest, QuizAnswer, RelaxAction, TurnOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub user_id: i64,
    /// Upper bound on automatic follow-up requests within one user turn.
    pub max_auto_resends: u32,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self { user_id: 1, max_auto_resends: 8 }
    }
}

impl From<&AppConfig> for RuntimeSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_id: config.assistant.user_id,
            max_auto_resends: config.assistant.max_auto_resends,
        }
    }
}

/// Drives a [`ConversationSession`] against the booking and agent services.
#[derive(Clone)]
pub struct AssistantRuntime {
    booking: Arc<dyn BookingBackend>,
    agent: Arc<dyn AgentBackend>,
    settings: RuntimeSettings,
}

impl AssistantRuntime {
    pub fn new(
        booking: Arc<dyn BookingBackend>,
        agent: Arc<dyn AgentBackend>,
        settings: RuntimeSettings,
    ) -> Self {
        Self { booking, agent, settings }
    }

    pub fn settings(&self) -> RuntimeSettings {
        self.settings
    }

    /// Handles free text in whichever mode the session is in.
    pub async fn handle_utterance(
        &self,
        session: &mut ConversationSession,
        text: &str,
    ) -> Result<TurnOutcome, ApplicationError> {
        match session.mode() {
            DialogueMode::Quiz => {
                let request = session.submit_utterance(text)?;
                self.drive(session, request).await
            }
            DialogueMode::Agent => self.agent_turn(session, text).await,
        }
    }

    pub async fn answer(
        &self,
        session: &mut ConversationSession,
        answer: QuizAnswer,
    ) -> Result<TurnOutcome, ApplicationError> {
        let request = session.answer(answer)?;
        self.drive(session, request).await
    }

    pub async fn skip_amenities(
        &self,
        session: &mut ConversationSession,
    ) -> Result<TurnOutcome, ApplicationError> {
        let request = session.skip_amenities()?;
        self.drive(session, request).await
    }

    pub async fn relax(
        &self,
        session: &mut ConversationSession,
        action: RelaxAction,
    ) -> Result<TurnOutcome, ApplicationError> {
        let request = session.relax(action)?;
        self.drive(session, request).await
    }

    pub async fn more_suggestions(
        &self,
        session: &mut ConversationSession,
    ) -> Result<TurnOutcome, ApplicationError> {
        let request = session.more_suggestions()?;
        self.drive(session, request).await
    }

    /// Confirms the suggestion at `index` for the configured user.
    pub async fn book(
        &self,
        session: &mut ConversationSession,
        index: usize,
        today: NaiveDate,
    ) -> Result<Value, ApplicationError> {
        let confirmation = match session.booking_for(index, self.settings.user_id, today) {
            Ok(confirmation) => confirmation,
            Err(error) => {
                session.record_failure(error.user_message());
                return Err(error.into());
            }
        };

        match self.booking.confirm(&confirmation).await {
            Ok(receipt) => {
                info!(
                    event_name = "assistant.booking.confirmed",
                    session_id = %session.id(),
                    establishment_id = %confirmation.establishment_id,
                    total_price_vnd = confirmation.total_price_vnd,
                    "booking confirmed"
                );
                session.record_booking();
                Ok(receipt)
            }
            Err(error) => {
                warn!(
                    event_name = "assistant.booking.failed",
                    session_id = %session.id(),
                    error = %error,
                    "booking confirmation failed"
                );
                session.record_failure(error.user_message());
                Err(error.into())
            }
        }
    }

    pub async fn user_bookings(&self) -> Result<Vec<Booking>, ApplicationError> {
        Ok(self.booking.user_bookings(self.settings.user_id).await?)
    }

    /// Ranked one-shot search on the agent service, using the session's
    /// parameters to pick a strategy. The session itself is not changed.
    pub async fn agent_search(
        &self,
        session: &ConversationSession,
        query: &str,
    ) -> Result<Vec<Suggestion>, ApplicationError> {
        let strategy = search_strategy_for(&build_agent_context(session.params()));
        let request =
            AgentSearchRequest { query: query.trim().to_string(), strategy: Some(strategy) };
        let response = self.agent.search(&request).await?;
        Ok(response.into_suggestions())
    }

    pub async fn agent_healthy(&self) -> bool {
        self.agent.is_healthy().await
    }

    async fn agent_turn(
        &self,
        session: &mut ConversationSession,
        text: &str,
    ) -> Result<TurnOutcome, ApplicationError> {
        let request = session.agent_chat_request(text)?;
        let failure = match self.agent.chat(&request).await {
            Ok(response) => match session.apply_agent_response(response) {
                Ok(outcome) => {
                    info!(
                        event_name = "assistant.agent.completed",
                        session_id = %session.id(),
                        outcome = outcome_label(&outcome),
                        "agent turn completed"
                    );
                    return Ok(outcome);
                }
                Err(error) => error.to_string(),
            },
            Err(error) => error.to_string(),
        };

        warn!(
            event_name = "assistant.agent.fallback",
            session_id = %session.id(),
            error = %failure,
            "agent unavailable, falling back to quiz"
        );
        let request = session.fall_back_to_quiz();
        self.drive(session, request).await
    }

    /// Sends `request` and keeps following automatic hops until the session
    /// waits on the user again.
    async fn drive(
        &self,
        session: &mut ConversationSession,
        mut request: OutboundRequest,
    ) -> Result<TurnOutcome, ApplicationError> {
        let mut hops = 0_u32;
        loop {
            info!(
                event_name = "assistant.request.sent",
                session_id = %session.id(),
                kind = request.kind.as_str(),
                auto = request.kind.is_auto(),
                "forwarding to booking process"
            );
            let response = match self.booking.process(&request.request).await {
                Ok(response) => response,
                Err(error) => {
                    warn!(
                        event_name = "assistant.request.failed",
                        session_id = %session.id(),
                        error = %error,
                        "booking process request failed"
                    );
                    session.record_failure(error.user_message());
                    return Err(error.into());
                }
            };

            let outcome = match session.apply_response(response) {
                Ok(outcome) => outcome,
                Err(error) => {
                    session.record_failure(error.user_message());
                    return Err(error.into());
                }
            };

            match outcome {
                TurnOutcome::AutoResend(next) | TurnOutcome::Search(next) => {
                    hops += 1;
                    if hops > self.settings.max_auto_resends {
                        let error = DomainError::InvariantViolation(format!(
                            "gave up after {} automatic follow-ups",
                            self.settings.max_auto_resends
                        ));
                        warn!(
                            event_name = "assistant.hop_limit",
                            session_id = %session.id(),
                            hops,
                            "automatic follow-up limit reached"
                        );
                        session.record_failure(error.user_message());
                        return Err(error.into());
                    }
                    request = next;
                }
                other => {
                    info!(
                        event_name = "assistant.turn.completed",
                        session_id = %session.id(),
                        outcome = outcome_label(&other),
                        key = prompted_key(&other),
                        hops,
                        "turn completed"
                    );
                    return Ok(other);
                }
            }
        }
    }
}

fn outcome_label(outcome: &TurnOutcome) -> &'static str {
    match outcome {
        TurnOutcome::Prompt(_) => "prompt",
        TurnOutcome::AutoResend(_) => "auto_resend",
        TurnOutcome::Search(_) => "search",
        TurnOutcome::Suggestions(_) => "suggestions",
        TurnOutcome::Settled => "settled",
    }
}

fn prompted_key(outcome: &TurnOutcome) -> &str {
    match outcome {
        TurnOutcome::Prompt(step) => step.key().map(|key| key.as_str()).unwrap_or(""),
        _ => "",
    }
}
