//! Assistant runtime - conversation handling for the booking assistant
//!
//! This crate holds everything that turns user text into requests against the
//! booking and agent services:
//! - Infers booking parameters from free Vietnamese text (`conversation`)
//! - Tracks one conversation: parameters, the open question, suggestions
//!   and the transcript (`session`)
//! - Talks to the remote services through async traits (`backend`, `http`)
//! - Follows automatic follow-up requests and the agent fallback (`runtime`)
//!
//! # Turn loop
//!
//! 1. **Inference** (`conversation`) - fill missing parameters from the text
//! 2. **Transition** (`session`) - consult the dialogue flow in core
//! 3. **Forwarding** (`runtime`) - send to `/booking/process` or `/agent/chat`
//! 4. **Apply** (`session`) - merge the answer, auto-skip, confirm amenities
//!    or render suggestions
//!
//! The remote quiz decides which parameter to ask next. The session only
//! decides whether the user has to see that question.

pub mod backend;
pub mod conversation;
pub mod http;
pub mod runtime;
pub mod session;

pub use backend::{AgentBackend, BookingBackend};
pub use conversation::ParameterExtractor;
pub use http::{ClientError, HttpAgentClient, HttpBookingClient};
pub use runtime::{AssistantRuntime, RuntimeSettings};
pub use session::{
    ConversationSession, OutboundRequest, QuizAnswer, RelaxAction, RequestKind, TurnOutcome,
};
