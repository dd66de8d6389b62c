use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: i64, message: String },

    #[error("Rate limited ({status}): {message}")]
    RateLimited { status: i64, message: String },

    #[error("Action failed ({status}): {message}")]
    ActionFailed { status: i64, message: String },

    #[error("Event cannot be replied to")]
    ReplyTargetUnavailable,

    #[error("Config error: {0}")]
    Config(String),
}

impl AdapterError {
    /// Origin status code of the API failure, if the platform reported one.
    pub fn status(&self) -> Option<i64> {
        match self {
            AdapterError::Unauthorized { status, .. }
            | AdapterError::RateLimited { status, .. }
            | AdapterError::ActionFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;
