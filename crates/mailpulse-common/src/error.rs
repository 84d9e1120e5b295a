//! Error types for MailPulse

use thiserror::Error;

/// Main error type for MailPulse
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for MailPulse
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Config(_) => 500,
            Error::Database(_) => 500,
            Error::Smtp(_) => 502,
            Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            Error::Internal(_) => 500,
            Error::Other(_) => 500,
        }
    }

    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::Database(_) => "database_error",
            Error::Smtp(_) => "send_failed",
            Error::Validation(_) => "validation_error",
            Error::NotFound(_) => "not_found",
            Error::Internal(_) => "internal_error",
            Error::Other(_) => "internal_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::NotFound("campaign".into()).status_code(), 404);
        assert_eq!(Error::Validation("email".into()).status_code(), 400);
        assert_eq!(Error::Smtp("refused".into()).status_code(), 502);
        assert_eq!(Error::Database("down".into()).status_code(), 500);
    }

    #[test]
    fn test_other_wraps_anyhow() {
        let err: Error = anyhow::anyhow!("boom").into();
        assert_eq!(err.code(), "internal_error");
        assert_eq!(err.to_string(), "boom");
    }
}
