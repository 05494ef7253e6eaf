use thiserror::Error;

/// Errors raised by [`crate::session::TypingSession`] operations.
///
/// None of these leave the session in a different state than before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The session already reached its finished state.
    #[error("session is finished; start a new round to keep typing")]
    InvalidState,

    #[error("cursor position {position} is outside 0..={length}")]
    OutOfRange { position: usize, length: usize },

    /// Only printable characters and the space bar can be typed.
    #[error("character {0:?} cannot be typed")]
    InvalidCharacter(char),
}

/// Errors raised while loading passage packs.
#[derive(Debug, Error)]
pub enum PassageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("passage pack {0:?} is empty")]
    Empty(String),

    #[error("passage {index} cannot be typed: {reason}")]
    Untypeable { index: usize, reason: &'static str },

    #[error("no built-in passage pack named {0:?}")]
    UnknownPack(String),
}
