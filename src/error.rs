//! Error types shared across Medidash.
//!
//! Two families of failures reach the user: validation errors, which are
//! caught before any request is sent, and API errors, which describe what
//! went wrong on the wire. Everything else is plumbing and travels as
//! `anyhow::Error`.

use thiserror::Error;

/// A failure talking to the hospital API.
///
/// The `Display` output is what ends up in a toast, so `Status` prints the
/// server-provided message verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Status { status: u16, message: String },
    /// The request never produced a response (DNS, refused, timeout, TLS).
    #[error("Network error: {0}")]
    Network(String),
    /// The response body could not be decoded into the expected shape.
    #[error("Unexpected response from server: {0}")]
    Decode(String),
    /// A multipart upload referenced a file that could not be read.
    #[error("Could not read upload {path}: {reason}")]
    Upload { path: String, reason: String },
    /// The record is not in the loaded list, so there is nothing to send.
    #[error("{noun} {id} not found")]
    NotFound { noun: String, id: String },
}

impl ApiError {
    /// HTTP status for server-side failures, `None` for local ones.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server no longer accepts the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// A form value rejected locally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },
    #[error("{field} must be exactly 10 digits")]
    Phone { field: String },
    #[error("{field} is not a valid email address")]
    Email { field: String },
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },
    #[error("{field} does not match {other}")]
    Mismatch { field: String, other: String },
    #[error("{field} must be a number")]
    NotANumber { field: String },
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },
    #[error("{field} must be greater than 0")]
    NotPositive { field: String },
    #[error("{field} must look like 120/80")]
    BloodPressure { field: String },
    #[error("{field} must look like ET-0000-000000")]
    PatientId { field: String },
    #[error("{field} must be a date in YYYY-MM-DD format")]
    BadDate { field: String },
    #[error("{field} cannot be in the past")]
    DateInPast { field: String },
    #[error("{field} must be before today")]
    DateNotBeforeToday { field: String },
    #[error("{field} must be one of: {allowed}")]
    NotAChoice { field: String, allowed: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_displays_server_message_verbatim() {
        let err = ApiError::Status {
            status: 409,
            message: "Email already registered".to_string(),
        };
        assert_eq!(err.to_string(), "Email already registered");
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn range_error_names_its_bounds() {
        let err = ValidationError::OutOfRange {
            field: "Temperature".to_string(),
            min: 95.0,
            max: 105.0,
        };
        assert_eq!(err.to_string(), "Temperature must be between 95 and 105");
        assert_eq!(err.clone(), err);
    }

    #[test]
    fn only_401_means_the_token_was_rejected() {
        let unauthorized = ApiError::Status {
            status: 401,
            message: String::new(),
        };
        let forbidden = ApiError::Status {
            status: 403,
            message: String::new(),
        };
        assert!(unauthorized.is_unauthorized());
        assert!(!forbidden.is_unauthorized());
        assert!(!ApiError::Network("refused".into()).is_unauthorized());
    }
}
