use std::time::Duration;
use thiserror::Error;

/// Failure of a single call against the events backend, decoded at the transport boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Server error {status}: {}", .message.as_deref().unwrap_or(.body.as_str()))]
    ServerError {
        status: u16,
        body: String,
        message: Option<String>,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl TransportError {
    /// Text suitable for showing to a person: the server's own message when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::NetworkFailure(_) => {
                "Could not reach the event service. Check your connection and try again.".to_string()
            }
            TransportError::Timeout(_) => {
                "The event service took too long to respond. Please try again.".to_string()
            }
            TransportError::ServerError { status, message, .. } => match message {
                Some(message) => message.clone(),
                None => format!("The event service failed with status {status}."),
            },
            TransportError::MalformedResponse(_) => {
                "The event service sent a response that could not be read.".to_string()
            }
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("A discovery request is already in flight")]
    DiscoveryInFlight,

    #[error("Load of {month:02}/{year} was superseded by a newer load")]
    LoadSuperseded { month: u32, year: i32 },

    #[error("Request rejected: {message}")]
    Rejected { message: String },

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScannerError {
    pub fn user_message(&self) -> String {
        match self {
            ScannerError::Validation(message) => message.clone(),
            ScannerError::Transport(err) => err.user_message(),
            ScannerError::DiscoveryInFlight => {
                "Event discovery is already running. Please wait for it to finish.".to_string()
            }
            ScannerError::LoadSuperseded { .. } => {
                "A newer selection replaced this one before it finished loading.".to_string()
            }
            ScannerError::Rejected { message } => message.clone(),
            ScannerError::Json(_) => {
                "The event service sent data in an unexpected shape.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScannerError>;
