use thiserror::Error;

use crate::flows::states::{
    DialogueAction, DialogueContext, DialogueEvent, DialogueState, TransitionOutcome,
};

pub trait DialogueFlow {
    fn initial_state(&self) -> DialogueState;
    fn transition(
        &self,
        current: &DialogueState,
        event: &DialogueEvent,
        context: &DialogueContext,
    ) -> Result<TransitionOutcome, DialogueTransitionError>;
}

/// The booking assistant's parameter-collection dialogue.
#[derive(Clone, Debug, Default)]
pub struct BookingDialogue;

impl DialogueFlow for BookingDialogue {
    fn initial_state(&self) -> DialogueState {
        DialogueState::Idle
    }

    fn transition(
        &self,
        current: &DialogueState,
        event: &DialogueEvent,
        context: &DialogueContext,
    ) -> Result<TransitionOutcome, DialogueTransitionError> {
        transition_booking(current, event, context)
    }
}

#[derive(Clone, Debug)]
pub struct DialogueEngine<F = BookingDialogue> {
    flow: F,
}

impl<F> DialogueEngine<F>
where
    F: DialogueFlow,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_state(&self) -> DialogueState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &DialogueState,
        event: &DialogueEvent,
        context: &DialogueContext,
    ) -> Result<TransitionOutcome, DialogueTransitionError> {
        self.flow.transition(current, event, context)
    }
}

impl Default for DialogueEngine<BookingDialogue> {
    fn default() -> Self {
        Self::new(BookingDialogue)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DialogueTransitionError {
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: DialogueState, event: DialogueEvent },
}

fn transition_booking(
    current: &DialogueState,
    event: &DialogueEvent,
    context: &DialogueContext,
) -> Result<TransitionOutcome, DialogueTransitionError> {
    use DialogueAction::{
        AutoResend, ConfirmAmenities, ForwardToQuiz, InferParameters, PromptUser,
        RenderSuggestions, ResetSession, RunSearch,
    };
    use DialogueEvent::{
        AnswerSubmitted, MoreSuggestionsRequested, QuizCompleted, QuizStepReceived,
        RelaxRequested, ResetRequested, SuggestionsReceived, UtteranceSubmitted,
    };
    use DialogueState::{Idle, QuizInProgress, SuggestionsShown};

    let (to, actions) = match (current, event) {
        (_, ResetRequested) => (Idle, vec![ResetSession]),
        (Idle, UtteranceSubmitted) | (QuizInProgress, UtteranceSubmitted) => {
            (QuizInProgress, vec![InferParameters, ForwardToQuiz])
        }
        (SuggestionsShown, UtteranceSubmitted) => {
            (QuizInProgress, vec![ResetSession, InferParameters, ForwardToQuiz])
        }
        (QuizInProgress, AnswerSubmitted) => (QuizInProgress, vec![ForwardToQuiz]),
        (QuizInProgress, QuizStepReceived) => {
            if context.amenities_unconfirmed {
                (QuizInProgress, vec![ConfirmAmenities])
            } else if context.key_already_known && !context.auto_skip_spent {
                (QuizInProgress, vec![AutoResend])
            } else {
                (QuizInProgress, vec![PromptUser])
            }
        }
        (QuizInProgress, QuizCompleted) => {
            if context.amenities_unconfirmed {
                (QuizInProgress, vec![ConfirmAmenities])
            } else if context.search_request {
                (SuggestionsShown, Vec::new())
            } else {
                (QuizInProgress, vec![RunSearch])
            }
        }
        (QuizInProgress, SuggestionsReceived) => (SuggestionsShown, vec![RenderSuggestions]),
        (SuggestionsShown, RelaxRequested) | (SuggestionsShown, MoreSuggestionsRequested) => {
            (QuizInProgress, vec![ForwardToQuiz])
        }
        _ => {
            return Err(DialogueTransitionError::InvalidTransition {
                state: *current,
                event: *event,
            });
        }
    };

    Ok(TransitionOutcome { from: *current, to, event: *event, actions })
}

#[cfg(test)]
mod tests {
    use crate::flows::engine::{
        BookingDialogue, DialogueEngine, DialogueFlow, DialogueTransitionError,
    };
    use crate::flows::states::{DialogueAction, DialogueContext, DialogueEvent, DialogueState};

    #[test]
    fn first_utterance_infers_then_forwards() {
        let engine = DialogueEngine::default();
        let outcome = engine
            .apply(
                &engine.initial_state(),
                &DialogueEvent::UtteranceSubmitted,
                &DialogueContext::default(),
            )
            .expect("idle -> quiz");

        assert_eq!(outcome.from, DialogueState::Idle);
        assert_eq!(outcome.to, DialogueState::QuizInProgress);
        assert_eq!(
            outcome.actions,
            vec![DialogueAction::InferParameters, DialogueAction::ForwardToQuiz]
        );
    }

    #[test]
    fn utterance_after_suggestions_starts_new_search() {
        let engine = DialogueEngine::default();
        let outcome = engine
            .apply(
                &DialogueState::SuggestionsShown,
                &DialogueEvent::UtteranceSubmitted,
                &DialogueContext::default(),
            )
            .expect("new search");

        assert_eq!(outcome.actions.first(), Some(&DialogueAction::ResetSession));
        assert_eq!(outcome.to, DialogueState::QuizInProgress);
    }

    #[test]
    fn known_key_is_auto_skipped_only_once() {
        let engine = DialogueEngine::default();
        let mut context = DialogueContext { key_already_known: true, ..DialogueContext::default() };

        let first = engine
            .apply(&DialogueState::QuizInProgress, &DialogueEvent::QuizStepReceived, &context)
            .expect("auto resend");
        assert_eq!(first.actions, vec![DialogueAction::AutoResend]);

        context.auto_skip_spent = true;
        let second = engine
            .apply(&DialogueState::QuizInProgress, &DialogueEvent::QuizStepReceived, &context)
            .expect("prompt");
        assert_eq!(second.actions, vec![DialogueAction::PromptUser]);
    }

    #[test]
    fn amenity_confirmation_takes_priority() {
        let engine = DialogueEngine::default();
        let context = DialogueContext {
            key_already_known: true,
            amenities_unconfirmed: true,
            search_request: true,
            ..DialogueContext::default()
        };

        for event in [DialogueEvent::QuizStepReceived, DialogueEvent::QuizCompleted] {
            let outcome =
                engine.apply(&DialogueState::QuizInProgress, &event, &context).expect("confirm");
            assert_eq!(outcome.actions, vec![DialogueAction::ConfirmAmenities]);
            assert_eq!(outcome.to, DialogueState::QuizInProgress);
        }
    }

    #[test]
    fn completion_runs_search_unless_it_answers_the_search() {
        let engine = DialogueEngine::default();

        let search = engine
            .apply(
                &DialogueState::QuizInProgress,
                &DialogueEvent::QuizCompleted,
                &DialogueContext::default(),
            )
            .expect("search");
        assert!(search.has_action(DialogueAction::RunSearch));

        let settled = engine
            .apply(
                &DialogueState::QuizInProgress,
                &DialogueEvent::QuizCompleted,
                &DialogueContext { search_request: true, ..DialogueContext::default() },
            )
            .expect("settled");
        assert!(settled.actions.is_empty());
        assert_eq!(settled.to, DialogueState::SuggestionsShown);
    }

    #[test]
    fn relax_and_more_require_suggestions() {
        let engine = DialogueEngine::default();
        let context = DialogueContext::default();

        for event in [DialogueEvent::RelaxRequested, DialogueEvent::MoreSuggestionsRequested] {
            let outcome =
                engine.apply(&DialogueState::SuggestionsShown, &event, &context).expect("relax");
            assert_eq!(outcome.actions, vec![DialogueAction::ForwardToQuiz]);

            let error = engine.apply(&DialogueState::Idle, &event, &context).expect_err("idle");
            assert_eq!(
                error,
                DialogueTransitionError::InvalidTransition { state: DialogueState::Idle, event }
            );
        }
    }

    #[test]
    fn answers_are_rejected_outside_quiz() {
        let flow = BookingDialogue;
        let error = flow
            .transition(
                &DialogueState::SuggestionsShown,
                &DialogueEvent::AnswerSubmitted,
                &DialogueContext::default(),
            )
            .expect_err("no quiz active");

        assert!(matches!(
            error,
            DialogueTransitionError::InvalidTransition {
                state: DialogueState::SuggestionsShown,
                event: DialogueEvent::AnswerSubmitted
            }
        ));
    }

    #[test]
    fn reset_is_accepted_from_every_state() {
        let engine = DialogueEngine::default();
        for state in
            [DialogueState::Idle, DialogueState::QuizInProgress, DialogueState::SuggestionsShown]
        {
            let outcome = engine
                .apply(&state, &DialogueEvent::ResetRequested, &DialogueContext::default())
                .expect("reset");
            assert_eq!(outcome.to, DialogueState::Idle);
            assert_eq!(outcome.actions, vec![DialogueAction::ResetSession]);
        }
    }
}
