use thiserror::Error;

/// Timeout stays separate from other transport failures so the host can tell
/// "no answer" from "actively rejected".
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid connection request url: {0}")]
    InvalidUrl(String),

    #[error("username and password must be supplied together")]
    PartialCredentials,

    #[error("device answered with status {0}")]
    BadStatus(u16),

    #[error("connection request timed out")]
    Timeout,

    #[error("connection request failed")]
    Transport(#[source] reqwest::Error),
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}

impl DispatchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}
