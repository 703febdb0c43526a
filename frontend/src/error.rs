use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server refused the credential. By the time a caller sees this the session is already
    /// gone and the app has been sent to the login view.
    #[error("session is no longer valid")]
    Unauthorized,

    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Short text for a form's error line.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            ApiError::Rejected { message, .. } if !message.trim().is_empty() => {
                message.trim().to_string()
            }
            ApiError::Rejected { status, .. } => format!("Request failed ({status})."),
            ApiError::Network(_) => "Network error. Please try again.".to_string(),
            ApiError::Decode(_) => "The server sent an unexpected response.".to_string(),
            ApiError::Invalid(message) => message.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
