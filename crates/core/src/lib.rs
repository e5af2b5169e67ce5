pub mod config;
pub mod decode;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod labels;
pub mod validation;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use decode::{decode_list, decode_process_response, DecodeError, ProcessResponse};
pub use domain::agent::{
    AgentChatRequest, AgentChatResponse, AgentSearchRequest, SearchResult, SearchStrategy,
    UserProfile,
};
pub use domain::booking::{Booking, BookingConfirmation, BookingStatus};
pub use domain::message::{ChatMessage, Role, Transcript};
pub use domain::params::{BookingParameters, ParamKey, ParamValue};
pub use domain::quiz::{ImageOption, QuizRequest, QuizStep};
pub use domain::suggestion::Suggestion;
pub use errors::{ApplicationError, DomainError};
pub use flows::{DialogueEngine, DialogueMode, DialogueState};
