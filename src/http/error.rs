//! Structured error for non-2xx responses.

use reqwest::{Method, StatusCode};

/// A request completed at the transport level but the server answered with
/// a non-success status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    pub method: Method,
    pub url: String,
    pub status: StatusCode,
}

impl HttpError {
    pub fn new(method: Method, url: impl Into<String>, status: StatusCode) -> Self {
        Self {
            method,
            url: url.into(),
            status,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}: {}", self.method, self.url, self.status)
    }
}

impl std::error::Error for HttpError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display() {
        let err = HttpError::new(Method::GET, "https://pkg.go.dev/x", StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "GET \"https://pkg.go.dev/x\": 404 Not Found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_http_error_server_error() {
        let err = HttpError::new(
            Method::GET,
            "https://pkg.go.dev/x",
            StatusCode::SERVICE_UNAVAILABLE,
        );
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("503"));
    }
}
