use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How free-text turns are served: the server-driven quiz or the agent service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueMode {
    #[default]
    Quiz,
    Agent,
}

impl DialogueMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quiz => "quiz",
            Self::Agent => "agent",
        }
    }
}

impl fmt::Display for DialogueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialogueMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quiz" => Ok(Self::Quiz),
            "agent" => Ok(Self::Agent),
            other => Err(format!("unsupported dialogue mode `{other}` (expected quiz|agent)")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueState {
    #[default]
    Idle,
    QuizInProgress,
    SuggestionsShown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueEvent {
    UtteranceSubmitted,
    AnswerSubmitted,
    QuizStepReceived,
    QuizCompleted,
    SuggestionsReceived,
    RelaxRequested,
    MoreSuggestionsRequested,
    ResetRequested,
}

/// Facts about the session the transition needs but does not own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DialogueContext {
    /// The key the server asks for already has a non-empty value.
    pub key_already_known: bool,
    /// The key was auto-skipped once before in this session.
    pub auto_skip_spent: bool,
    /// Amenities are selected but the user has not confirmed them.
    pub amenities_unconfirmed: bool,
    /// The response answers the follow-up search request.
    pub search_request: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueAction {
    ResetSession,
    InferParameters,
    ForwardToQuiz,
    AutoResend,
    PromptUser,
    ConfirmAmenities,
    RunSearch,
    RenderSuggestions,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: DialogueState,
    pub to: DialogueState,
    pub event: DialogueEvent,
    pub actions: Vec<DialogueAction>,
}

impl TransitionOutcome {
    pub fn has_action(&self, action: DialogueAction) -> bool {
        self.actions.contains(&action)
    }
}
