use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            ApiError::AuthenticationFailed { .. } => {
                Some("Check the authtoken in ~/.pd.yml (or the file passed with --config)")
            }
            ApiError::Forbidden { .. } => {
                Some("The API token is valid but lacks permission for this operation")
            }
            ApiError::RateLimitExceeded { .. } => Some("Wait a moment before running the command again"),
            ApiError::NotFound { .. } => Some("Check if the incident or schedule ID is correct"),
            ApiError::BadRequest { .. } => Some("Review the request parameters"),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
