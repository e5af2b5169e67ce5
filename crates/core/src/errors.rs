use thiserror::Error;

use crate::flows::DialogueTransitionError;

/// Shown when a failure carries no message the user should see verbatim.
pub const GENERIC_USER_MESSAGE: &str = "Đã có lỗi xảy ra, vui lòng thử lại sau.";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    DialogueTransition(#[from] DialogueTransitionError),
    #[error("invalid value for `{key}`: `{value}`")]
    InvalidParameter { key: String, value: String },
    #[error("no question is waiting for an answer")]
    NoActiveQuestion,
    #[error("answer for `{key}` is empty")]
    EmptyAnswer { key: String },
    #[error("prompt rejected: {0}")]
    InvalidPrompt(String),
    #[error("no suggestion at position {0}")]
    UnknownSuggestion(usize),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidParameter { key, .. } => format!("Giá trị cho `{key}` không hợp lệ."),
            Self::EmptyAnswer { .. } => "Bạn chưa chọn hoặc nhập câu trả lời.".to_string(),
            Self::NoActiveQuestion => "Hiện không có câu hỏi nào cần trả lời.".to_string(),
            Self::InvalidPrompt(_) => "Yêu cầu trống hoặc quá dài (tối đa 1000 ký tự).".to_string(),
            Self::UnknownSuggestion(_) => "Không tìm thấy gợi ý đã chọn.".to_string(),
            Self::DialogueTransition(_) | Self::InvariantViolation(_) => {
                "Thao tác này không khả dụng ở bước hiện tại.".to_string()
            }
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// The remote service answered with an error status.
    #[error("remote service returned {status}: {}", message.as_deref().unwrap_or("no message"))]
    Remote { status: u16, message: Option<String> },
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Localized text for the chat transcript: the server's own message when it
    /// sent one, otherwise a generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            Self::Domain(error) => error.user_message(),
            Self::Remote { message: Some(message), .. } if !message.trim().is_empty() => {
                message.clone()
            }
            Self::Remote { .. } | Self::Integration(_) | Self::Configuration(_) => {
                GENERIC_USER_MESSAGE.to_string()
            }
        }
    }
}
