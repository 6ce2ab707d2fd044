use thiserror::Error;

#[derive(Debug, Error)]
pub enum OncohubError {
    /// Bad credentials, missing client configuration, or no valid token.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Non-200 response from the report endpoint.
    #[error("Fetch error (HTTP {status}): {message}")]
    Fetch { status: u16, message: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A source record lacks its identity fields. Logged and recovered, never returned
    /// from normalisation or export.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),
}

pub type Result<T> = std::result::Result<T, OncohubError>;

/// User-facing category of a failure. Each category renders differently in a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotAuthenticated,
    NoData,
    RequestFailed,
    ExportFailed,
    Misconfigured,
    InvalidInput,
    Cancelled,
}

impl OncohubError {
    pub fn not_authenticated() -> Self {
        OncohubError::Authentication("not authenticated".to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OncohubError::Authentication(_) => ErrorKind::NotAuthenticated,
            OncohubError::Fetch { status: 404, .. } => ErrorKind::NoData,
            OncohubError::Fetch { .. }
            | OncohubError::Http(_)
            | OncohubError::Timeout(_)
            | OncohubError::Serialization(_) => ErrorKind::RequestFailed,
            OncohubError::MalformedRecord(_) => ErrorKind::NoData,
            OncohubError::Io(_) => ErrorKind::ExportFailed,
            OncohubError::Config(_) => ErrorKind::Misconfigured,
            OncohubError::InvalidInput(_) => ErrorKind::InvalidInput,
            OncohubError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }

    /// Transient failures worth another attempt: timeouts, connection failures,
    /// HTTP 429 and 5xx. 401/403 and other 4xx are terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            OncohubError::Fetch { status, .. } => *status == 429 || (500..600).contains(status),
            OncohubError::Timeout(_) => true,
            OncohubError::Http(e) => {
                if e.is_timeout() || e.is_connect() {
                    return true;
                }
                e.status().map(|s| s.is_server_error()).unwrap_or(false)
            }
            _ => false,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NotAuthenticated => {
                "User is not authenticated. Please log in with valid credentials first."
            }
            ErrorKind::NoData => "No data found for this patient.",
            ErrorKind::RequestFailed => {
                "Request to the clinical records system failed. Please try again later."
            }
            ErrorKind::ExportFailed => "Could not write the report export file.",
            ErrorKind::Misconfigured => "The clinical records client is not configured correctly.",
            ErrorKind::InvalidInput => "Please enter a valid patient ID.",
            ErrorKind::Cancelled => "The request was cancelled.",
        }
    }
}
