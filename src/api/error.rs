use thiserror::Error;

/// Failure of a single request to the recommendation service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// A response arrived with a non-2xx status.
    #[error("HTTP {status}: {status_text}")]
    Http { status: u16, status_text: String },
    /// No response was obtained (DNS, refused connection, reset).
    #[error("network error: {message}")]
    Network { message: String },
    /// A 2xx response whose body is not the expected JSON.
    #[error("invalid response body: {message}")]
    Decode { message: String },
}

impl TransportError {
    /// HTTP status, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => Self::Http {
                status,
                status_text: response.status_text().to_string(),
            },
            ureq::Error::Transport(transport) => Self::Network {
                message: transport.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
