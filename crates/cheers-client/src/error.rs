//! Client error types.

use thiserror::Error;

/// Errors surfaced by the API layer and controller.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a usable HTTP response.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with an error status. `message` is the parsed
    /// `detail` body when present, otherwise a generic fallback.
    #[error("server rejected ({status}): {message}")]
    Server { status: u16, message: String },

    /// Local validation failed before anything reached the network.
    #[error("{0}")]
    Invalid(String),
}

impl ClientError {
    /// True for transport-level failures (timeouts, refused connections),
    /// as opposed to a reachable server saying no.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// User-facing message for screen display.
    pub fn display_message(&self) -> String {
        match self {
            ClientError::Transport(_) => "Connection failed, please try again".to_string(),
            ClientError::Server { message, .. } => message.clone(),
            ClientError::Invalid(msg) => msg.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
