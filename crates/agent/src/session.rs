use std::collections::BTreeSet;

use chrono::{Days, NaiveDate, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::debug;
use tripmate_core::decode::ProcessResponse;
use tripmate_core::domain::agent::{
    build_agent_context, AgentChatRequest, AgentChatResponse, UserProfile,
};
use tripmate_core::domain::booking::BookingConfirmation;
use tripmate_core::domain::message::Transcript;
use tripmate_core::domain::params::{BookingParameters, ParamKey, ParamValue};
use tripmate_core::domain::quiz::{QuizRequest, QuizStep};
use tripmate_core::domain::suggestion::Suggestion;
use tripmate_core::errors::DomainError;
use tripmate_core::flows::{
    DialogueAction, DialogueContext, DialogueEngine, DialogueEvent, DialogueMode, DialogueState,
    TransitionOutcome,
};
use tripmate_core::labels::{default_options, humanize_value, parameter_label, AMENITY_OPTIONS};
use tripmate_core::validation::{is_valid_duration, is_valid_prompt, parse_date, sanitize_input};

use crate::conversation::{
    parse_duration_from_text, parse_price_from_text, strip_accents, ParameterExtractor,
};

pub const NEW_SEARCH_NOTICE: &str = "Tôi hiểu bạn muốn tìm kiếm mới. Hãy để tôi hỗ trợ bạn!";
pub const AMENITY_CONFIRM_PROMPT: &str = "Bạn có muốn chọn thêm tiện ích không?";
pub const SKIP_AMENITIES_PROMPT: &str = "Bỏ qua chọn thêm tiện ích";
pub const RELAX_PROMPT: &str = "Hãy mở rộng tiêu chí giúp mình";
pub const MORE_SUGGESTIONS_PROMPT: &str = "Cho mình gợi ý khác";
pub const NO_RESULTS_MESSAGE: &str =
    "Chưa tìm thấy kết quả phù hợp, bạn có muốn nới tiêu chí không?";
pub const AGENT_FALLBACK_NOTICE: &str =
    "Trợ lý thông minh tạm thời không khả dụng, chuyển sang chế độ hỏi đáp.";
pub const BOOKING_SUCCESS_MESSAGE: &str = "Đặt chỗ thành công!";

const DEFAULT_RELAXED_BUDGET: i64 = 1_000_000;

/// Why a request to `/booking/process` is being sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// A user turn, echoed in the transcript.
    Prompt,
    /// Re-sent because the asked key already has a value.
    AutoSkip,
    /// Follow-up search after the quiz reported completion.
    Search,
    /// Sent on the user's behalf without an echo.
    FollowUp,
}

impl RequestKind {
    pub fn is_auto(&self) -> bool {
        !matches!(self, Self::Prompt)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::AutoSkip => "auto_skip",
            Self::Search => "search",
            Self::FollowUp => "follow_up",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutboundRequest {
    pub kind: RequestKind,
    pub request: QuizRequest,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TurnOutcome {
    /// A question is waiting for the user.
    Prompt(QuizStep),
    AutoResend(OutboundRequest),
    Search(OutboundRequest),
    /// Suggestions are on screen; carries how many.
    Suggestions(usize),
    /// Nothing further to send until the user acts.
    Settled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuizAnswer {
    /// One of the offered options.
    Choice(String),
    /// Free-text input.
    Custom(String),
    Amenities(Vec<String>),
    /// Positions in the step's `image_options`.
    Images(Vec<usize>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelaxAction {
    MoreBudget,
    DropAmenities,
    ShiftDate,
}

impl std::str::FromStr for RelaxAction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "more_budget" | "budget" => Ok(Self::MoreBudget),
            "drop_amenities" | "amenities" => Ok(Self::DropAmenities),
            "shift_date" | "date" => Ok(Self::ShiftDate),
            other => Err(format!(
                "unsupported relax action `{other}` (expected more_budget|drop_amenities|shift_date)"
            )),
        }
    }
}

/// `session_<unix millis>_<9 base36 chars>`.
pub fn new_session_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String =
        (0..9).map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())])).collect();
    format!("session_{}_{suffix}", Utc::now().timestamp_millis())
}

/// State of one booking-assistant conversation: the collected parameters,
/// the question in flight, the latest suggestions and the transcript.
#[derive(Clone, Debug)]
pub struct ConversationSession {
    id: String,
    mode: DialogueMode,
    state: DialogueState,
    engine: DialogueEngine,
    extractor: ParameterExtractor,
    params: BookingParameters,
    quiz: Option<QuizStep>,
    suggestions: Vec<Suggestion>,
    transcript: Transcript,
    asked_keys: BTreeSet<ParamKey>,
    profile: UserProfile,
    pending: Option<RequestKind>,
    /// State to return to when a relax or "more" search fails.
    resume_state: Option<DialogueState>,
    last_prompt: String,
}

impl ConversationSession {
    pub fn new(mode: DialogueMode) -> Self {
        Self::with_id(new_session_id(), mode)
    }

    pub fn with_id(id: impl Into<String>, mode: DialogueMode) -> Self {
        let engine = DialogueEngine::default();
        Self {
            id: id.into(),
            mode,
            state: engine.initial_state(),
            engine,
            extractor: ParameterExtractor::new(),
            params: BookingParameters::new(),
            quiz: None,
            suggestions: Vec::new(),
            transcript: Transcript::default(),
            asked_keys: BTreeSet::new(),
            profile: UserProfile::default(),
            pending: None,
            resume_state: None,
            last_prompt: String::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> DialogueMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DialogueMode) {
        self.mode = mode;
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    pub fn params(&self) -> &BookingParameters {
        &self.params
    }

    pub fn quiz(&self) -> Option<&QuizStep> {
        self.quiz.as_ref()
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn asked_keys(&self) -> &BTreeSet<ParamKey> {
        &self.asked_keys
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Kind of the request whose response has not been applied yet.
    pub fn pending(&self) -> Option<RequestKind> {
        self.pending
    }

    /// Starts a quiz-mode turn from free text.
    pub fn submit_utterance(&mut self, text: &str) -> Result<OutboundRequest, DomainError> {
        let prompt = self.begin_turn(text)?;
        Ok(self.outbound(RequestKind::Prompt, prompt))
    }

    /// Starts an agent-mode turn from free text.
    pub fn agent_chat_request(&mut self, text: &str) -> Result<AgentChatRequest, DomainError> {
        let prompt = self.begin_turn(text)?;
        Ok(AgentChatRequest {
            message: prompt,
            session_id: self.id.clone(),
            user_profile: Some(self.profile.clone()),
            context: Some(build_agent_context(&self.params)),
        })
    }

    fn begin_turn(&mut self, text: &str) -> Result<String, DomainError> {
        if !is_valid_prompt(text) {
            return Err(DomainError::InvalidPrompt(format!(
                "prompt must contain 1..=1000 characters, got {}",
                text.trim().chars().count()
            )));
        }
        let prompt = sanitize_input(text);
        let outcome =
            self.transition(DialogueEvent::UtteranceSubmitted, DialogueContext::default())?;

        if outcome.has_action(DialogueAction::ResetSession) {
            self.clear_search();
            self.transcript.push_user(prompt.clone());
            self.transcript.push_assistant(NEW_SEARCH_NOTICE);
        } else {
            self.transcript.push_user(prompt.clone());
        }

        if outcome.has_action(DialogueAction::InferParameters) {
            let inferred = self.extractor.extract(&prompt);
            let filled = self.params.fill_missing(&inferred);
            if !filled.is_empty() {
                debug!(
                    event_name = "session.parameters_inferred",
                    session_id = %self.id,
                    keys = ?filled,
                    "filled parameters from free text"
                );
            }
        }

        self.state = outcome.to;
        self.pending = Some(RequestKind::Prompt);
        self.last_prompt = prompt.clone();
        Ok(prompt)
    }

    /// Applies a `/booking/process` response to the request in flight.
    pub fn apply_response(
        &mut self,
        response: ProcessResponse,
    ) -> Result<TurnOutcome, DomainError> {
        let kind = self.pending.take().unwrap_or(RequestKind::Prompt);
        self.resume_state = None;
        match response {
            ProcessResponse::Suggestions(suggestions) => self.show_suggestions(suggestions),
            ProcessResponse::Quiz(step) if step.is_terminal() => self.complete_quiz(step, kind),
            ProcessResponse::Quiz(step) => self.receive_question(step),
        }
    }

    /// Applies an `/agent/chat` reply. A reply flagged unsuccessful is an
    /// error so the caller can fall back to the quiz.
    pub fn apply_agent_response(
        &mut self,
        response: AgentChatResponse,
    ) -> Result<TurnOutcome, DomainError> {
        if !response.success {
            return Err(DomainError::InvariantViolation(
                "agent reported an unsuccessful search".to_string(),
            ));
        }
        self.pending = None;
        if self.profile.absorb_insights(&response.metadata) {
            debug!(
                event_name = "session.profile_updated",
                session_id = %self.id,
                "absorbed user insights from agent"
            );
        }
        if !response.explanation.trim().is_empty() {
            self.transcript.push_assistant(response.explanation.clone());
        }
        self.show_suggestions(response.into_suggestions())
    }

    /// Switches to quiz mode after the agent failed and re-issues the last
    /// prompt to the quiz endpoint.
    pub fn fall_back_to_quiz(&mut self) -> OutboundRequest {
        self.mode = DialogueMode::Quiz;
        self.transcript.push_assistant(AGENT_FALLBACK_NOTICE);
        let prompt = self.last_prompt.clone();
        self.pending = Some(RequestKind::Prompt);
        self.outbound(RequestKind::Prompt, prompt)
    }

    pub fn answer(&mut self, answer: QuizAnswer) -> Result<OutboundRequest, DomainError> {
        let step = self.quiz.clone().ok_or(DomainError::NoActiveQuestion)?;
        let key = step.key().cloned().ok_or(DomainError::NoActiveQuestion)?;
        let outcome = self.transition(DialogueEvent::AnswerSubmitted, DialogueContext::default())?;

        let display = match answer {
            QuizAnswer::Choice(value) => {
                let value = required_text(&key, &value)?;
                if !step.options.is_empty() && !step.options.iter().any(|option| option == value) {
                    return Err(DomainError::InvalidParameter {
                        key: key.to_string(),
                        value: value.to_string(),
                    });
                }
                self.store_answer(&key, value)?;
                humanize_value(&key, value)
            }
            QuizAnswer::Custom(value) => {
                let value = required_text(&key, &value)?;
                self.store_answer(&key, value)?;
                humanize_value(&key, value)
            }
            QuizAnswer::Amenities(selected) => {
                let selected: Vec<String> = selected
                    .iter()
                    .map(|item| item.trim())
                    .filter(|item| !item.is_empty())
                    .map(ToString::to_string)
                    .collect();
                if selected.is_empty() {
                    return Err(DomainError::EmptyAnswer { key: key.to_string() });
                }
                if key == ParamKey::AmenitiesPriority {
                    self.add_amenities(&selected).join(", ")
                } else {
                    self.params.set(key.clone(), selected.join(", "));
                    selected.join(", ")
                }
            }
            QuizAnswer::Images(indexes) => {
                if indexes.is_empty() {
                    return Err(DomainError::EmptyAnswer { key: key.to_string() });
                }
                let mut labels = Vec::with_capacity(indexes.len());
                for index in indexes {
                    let image = step.image_options.get(index).ok_or_else(|| {
                        DomainError::InvalidParameter {
                            key: key.to_string(),
                            value: format!("image #{index}"),
                        }
                    })?;
                    self.params.merge(&image.params);
                    labels.push(image.label.clone());
                }
                let joined = labels.join(", ");
                self.params.set(key.clone(), joined.clone());
                joined
            }
        };

        let text = format!("Tôi chọn {}: {}", parameter_label(&key), display);
        self.transcript.push_user(text.clone());
        self.state = outcome.to;
        self.pending = Some(RequestKind::Prompt);
        self.last_prompt = text.clone();
        Ok(self.outbound(RequestKind::Prompt, text))
    }

    /// Accepts the amenity list as it is and continues the quiz.
    pub fn skip_amenities(&mut self) -> Result<OutboundRequest, DomainError> {
        let asks_amenities =
            self.quiz.as_ref().and_then(QuizStep::key) == Some(&ParamKey::AmenitiesPriority);
        if !asks_amenities {
            return Err(DomainError::NoActiveQuestion);
        }
        let outcome = self.transition(DialogueEvent::AnswerSubmitted, DialogueContext::default())?;

        self.params.set(ParamKey::AmenitiesConfirmed, true);
        self.state = outcome.to;
        self.pending = Some(RequestKind::FollowUp);
        Ok(self.outbound(RequestKind::FollowUp, SKIP_AMENITIES_PROMPT.to_string()))
    }

    /// Loosens one criterion after a disappointing result list and searches
    /// again without starting a new conversation.
    pub fn relax(&mut self, action: RelaxAction) -> Result<OutboundRequest, DomainError> {
        let outcome = self.transition(DialogueEvent::RelaxRequested, DialogueContext::default())?;
        self.resume_state = Some(self.state);

        match action {
            RelaxAction::MoreBudget => {
                let relaxed = self
                    .params
                    .number(&ParamKey::MaxPrice)
                    .filter(|price| *price > 0)
                    .map(|price| (price as f64 * 1.2).round() as i64)
                    .unwrap_or(DEFAULT_RELAXED_BUDGET);
                self.params.set(ParamKey::MaxPrice, relaxed);
            }
            RelaxAction::DropAmenities => {
                self.params.remove(&ParamKey::AmenitiesPriority);
            }
            RelaxAction::ShiftDate => {
                let shifted = self
                    .params
                    .text(&ParamKey::CheckInDate)
                    .and_then(|raw| parse_date(&raw))
                    .and_then(|date| date.checked_add_days(Days::new(1)));
                if let Some(date) = shifted {
                    self.params.set(ParamKey::CheckInDate, date.format("%Y-%m-%d").to_string());
                }
            }
        }

        self.transcript.push_user(RELAX_PROMPT);
        self.state = outcome.to;
        self.pending = Some(RequestKind::Prompt);
        Ok(self.outbound(RequestKind::Prompt, RELAX_PROMPT.to_string()))
    }

    pub fn more_suggestions(&mut self) -> Result<OutboundRequest, DomainError> {
        let outcome =
            self.transition(DialogueEvent::MoreSuggestionsRequested, DialogueContext::default())?;
        self.resume_state = Some(self.state);
        self.state = outcome.to;
        self.pending = Some(RequestKind::FollowUp);
        Ok(self.outbound(RequestKind::FollowUp, MORE_SUGGESTIONS_PROMPT.to_string()))
    }

    /// Drops the current search; the transcript is kept.
    pub fn reset(&mut self) {
        if let Ok(outcome) =
            self.transition(DialogueEvent::ResetRequested, DialogueContext::default())
        {
            self.state = outcome.to;
        }
        self.clear_search();
    }

    pub fn booking_for(
        &self,
        index: usize,
        user_id: i64,
        today: NaiveDate,
    ) -> Result<BookingConfirmation, DomainError> {
        let suggestion =
            self.suggestions.get(index).ok_or(DomainError::UnknownSuggestion(index))?;
        BookingConfirmation::from_suggestion(user_id, suggestion, &self.params, today)
    }

    pub fn record_booking(&mut self) {
        self.transcript.push_assistant(BOOKING_SUCCESS_MESSAGE);
    }

    /// Records a failed request. A failed relax or "more" search puts the
    /// previous results back on screen.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.pending = None;
        if let Some(state) = self.resume_state.take() {
            self.state = state;
        }
        self.transcript.push_assistant(message);
    }

    fn transition(
        &self,
        event: DialogueEvent,
        context: DialogueContext,
    ) -> Result<TransitionOutcome, DomainError> {
        Ok(self.engine.apply(&self.state, &event, &context)?)
    }

    fn outbound(&self, kind: RequestKind, prompt: String) -> OutboundRequest {
        OutboundRequest {
            kind,
            request: QuizRequest { user_prompt: prompt, current_params: self.params.clone() },
        }
    }

    fn clear_search(&mut self) {
        self.params.clear();
        self.quiz = None;
        self.suggestions.clear();
        self.asked_keys.clear();
        self.pending = None;
        self.resume_state = None;
    }

    fn amenities_unconfirmed(&self, asked: Option<&ParamKey>) -> bool {
        !self.params.amenities().is_empty()
            && !self.params.amenities_confirmed()
            && asked != Some(&ParamKey::AmenitiesPriority)
    }

    fn show_suggestions(
        &mut self,
        suggestions: Vec<Suggestion>,
    ) -> Result<TurnOutcome, DomainError> {
        let outcome =
            self.transition(DialogueEvent::SuggestionsReceived, DialogueContext::default())?;
        self.state = outcome.to;
        self.quiz = None;
        self.suggestions = suggestions;

        let count = self.suggestions.len();
        if count > 0 {
            self.transcript
                .push_assistant(format!("Mình đã có {count} gợi ý phù hợp, bạn chọn để đặt nhé."));
        } else {
            self.transcript.push_assistant(NO_RESULTS_MESSAGE);
        }
        Ok(TurnOutcome::Suggestions(count))
    }

    fn complete_quiz(
        &mut self,
        step: QuizStep,
        kind: RequestKind,
    ) -> Result<TurnOutcome, DomainError> {
        self.params.merge(&step.final_params);
        let context = DialogueContext {
            amenities_unconfirmed: self.amenities_unconfirmed(None),
            search_request: kind == RequestKind::Search,
            ..DialogueContext::default()
        };
        let outcome = self.transition(DialogueEvent::QuizCompleted, context)?;
        self.state = outcome.to;

        if outcome.has_action(DialogueAction::ConfirmAmenities) {
            return Ok(self.confirm_amenities());
        }
        self.quiz = None;
        if outcome.has_action(DialogueAction::RunSearch) {
            self.pending = Some(RequestKind::Search);
            return Ok(TurnOutcome::Search(self.outbound(RequestKind::Search, String::new())));
        }
        Ok(TurnOutcome::Settled)
    }

    fn receive_question(&mut self, mut step: QuizStep) -> Result<TurnOutcome, DomainError> {
        self.params.merge(&step.final_params);
        let key = step.key().cloned().ok_or_else(|| {
            DomainError::InvariantViolation(
                "quiz step is neither completed nor asking for a key".to_string(),
            )
        })?;

        let context = DialogueContext {
            key_already_known: key != ParamKey::AmenitiesPriority && self.params.has_value(&key),
            auto_skip_spent: self.asked_keys.contains(&key),
            amenities_unconfirmed: self.amenities_unconfirmed(Some(&key)),
            search_request: false,
        };
        let outcome = self.transition(DialogueEvent::QuizStepReceived, context)?;
        self.state = outcome.to;

        if outcome.has_action(DialogueAction::ConfirmAmenities) {
            return Ok(self.confirm_amenities());
        }

        if step.options.is_empty() && !step.has_image_options() {
            step.options = default_options(&key);
        }
        self.quiz = Some(step.clone());

        if outcome.has_action(DialogueAction::AutoResend) {
            debug!(
                event_name = "session.auto_skip",
                session_id = %self.id,
                key = %key,
                "asked key already known, resending"
            );
            self.asked_keys.insert(key);
            self.pending = Some(RequestKind::AutoSkip);
            return Ok(TurnOutcome::AutoResend(self.outbound(RequestKind::AutoSkip, String::new())));
        }

        let question = step
            .missing_quiz
            .clone()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| format!("Vui lòng cho biết {}.", parameter_label(&key)));
        self.transcript.push_assistant(question);
        Ok(TurnOutcome::Prompt(step))
    }

    fn confirm_amenities(&mut self) -> TurnOutcome {
        let step = QuizStep::question(ParamKey::AmenitiesPriority, AMENITY_CONFIRM_PROMPT)
            .with_options(default_options(&ParamKey::AmenitiesPriority));
        self.quiz = Some(step.clone());
        self.transcript.push_assistant(AMENITY_CONFIRM_PROMPT);
        TurnOutcome::Prompt(step)
    }

    /// Adds `selected` to the amenities already chosen and marks the list
    /// confirmed. Returns the combined list.
    fn add_amenities(&mut self, selected: &[String]) -> Vec<String> {
        let combined = combine_amenities(self.params.amenities(), selected);
        self.params.set_amenities(&combined);
        self.params.set(ParamKey::AmenitiesConfirmed, true);
        combined
    }

    fn store_answer(&mut self, key: &ParamKey, value: &str) -> Result<(), DomainError> {
        let invalid =
            || DomainError::InvalidParameter { key: key.to_string(), value: value.to_string() };
        match key {
            ParamKey::Duration => {
                let nights = value
                    .parse::<i64>()
                    .ok()
                    .or_else(|| parse_duration_from_text(value))
                    .filter(|n| is_valid_duration(*n));
                self.params.set(key.clone(), nights.ok_or_else(invalid)?);
            }
            ParamKey::MaxPrice => {
                let price = value
                    .parse::<i64>()
                    .ok()
                    .or_else(|| parse_price_from_text(value))
                    .filter(|price| *price > 0);
                self.params.set(key.clone(), price.ok_or_else(invalid)?);
            }
            ParamKey::CheckInDate => {
                let date = parse_date(value).ok_or_else(invalid)?;
                self.params.set(key.clone(), date.format("%Y-%m-%d").to_string());
            }
            ParamKey::AmenitiesPriority => {
                let amenities: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(ToString::to_string)
                    .collect();
                self.add_amenities(&amenities);
            }
            _ => self.params.set(key.clone(), ParamValue::text(value)),
        }
        Ok(())
    }
}

/// Appends `added` to `current` in order, skipping amenities already present.
/// Known amenities are written with their canonical label.
fn combine_amenities(current: Vec<String>, added: &[String]) -> Vec<String> {
    let mut combined: Vec<String> = Vec::with_capacity(current.len() + added.len());
    for raw in current.iter().chain(added).map(|item| item.trim()) {
        if raw.is_empty() {
            continue;
        }
        let folded = strip_accents(raw);
        let label = AMENITY_OPTIONS
            .iter()
            .find(|option| strip_accents(option) == folded)
            .map_or_else(|| raw.to_string(), |option| (*option).to_string());
        if !combined.iter().any(|seen| strip_accents(seen) == folded) {
            combined.push(label);
        }
    }
    combined
}

fn required_text<'a>(key: &ParamKey, value: &'a str) -> Result<&'a str, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::EmptyAnswer { key: key.to_string() });
    }
    Ok(value)
}
