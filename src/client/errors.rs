use thiserror::Error;

/// Transport-level failures surfaced by [`super::ApiClient`] and client storage.
/// Session flows translate these into the user-facing `AuthError` taxonomy.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn display_includes_status_for_http_errors() {
        let err = AppError::Http {
            status: 404,
            message: "Not found.".to_string(),
        };
        assert_eq!(err.to_string(), "Request failed (404): Not found.");
    }

    #[test]
    fn display_prefixes_timeout() {
        let err = AppError::Timeout("Request timed out. Please try again.".to_string());
        assert_eq!(err.to_string(), "Timeout: Request timed out. Please try again.");
    }
}
