pub mod engine;
pub mod states;

pub use engine::{BookingDialogue, DialogueEngine, DialogueFlow, DialogueTransitionError};
pub use states::{
    DialogueAction, DialogueContext, DialogueEvent, DialogueMode, DialogueState,
    TransitionOutcome,
};
