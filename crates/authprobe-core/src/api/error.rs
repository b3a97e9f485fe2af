use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error! status: {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body shape returned by the auth API: `{"error": ..., "message": ...}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    fn describe_body(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody { error: Some(error), message: Some(message) }) => {
                format!("{} ({})", error, message)
            }
            Ok(ErrorBody { error: Some(error), message: None }) => error,
            Ok(ErrorBody { error: None, message: Some(message) }) => message,
            _ => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::Http {
            status: status.as_u16(),
            message: Self::describe_body(body),
        }
    }

    /// Status code of an HTTP error, if this is one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            ApiError::InvalidResponse(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_uses_error_field() {
        let body = r#"{"error": "Unauthorized", "message": "Authentication required"}"#;
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, body);
        assert_eq!(err.status(), Some(401));
        assert_eq!(
            err.to_string(),
            "HTTP error! status: 401: Unauthorized (Authentication required)"
        );

        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, r#"{"error": "Invalid credentials"}"#);
        assert_eq!(err.to_string(), "HTTP error! status: 401: Invalid credentials");
    }

    #[test]
    fn test_from_status_truncates_plain_body() {
        let body = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        match err {
            ApiError::Http { status, message } => {
                assert_eq!(status, 500);
                assert!(message.ends_with("(truncated, 520 total bytes)"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let body = "é".repeat(MAX_ERROR_BODY_LENGTH);
        let truncated = ApiError::truncate_body(&body);
        assert!(truncated.contains("truncated"));
    }
}
