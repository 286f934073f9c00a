//! Errors surfaced to the wizard controller.

use thiserror::Error;

/// Failures of a step request as seen from the client
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// The request never produced a response
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with an error body
    #[error("server error {status} ({error}): {message}")]
    Server {
        status: u16,
        error: String,
        message: String,
    },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("could not render step: {0}")]
    Render(String),
}

impl ClientError {
    /// True when the server reports that the wizard instance is gone
    pub fn is_invalid_instance(&self) -> bool {
        matches!(self, ClientError::Server { error, .. } if error == "invalid_instance")
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}
