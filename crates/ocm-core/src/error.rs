//! Error types for OCM operations.
//!
//! Every non-2xx response is normalized into [`Error::Api`], which carries the request
//! context (method, URL, query parameters, JSON body) alongside the status code and the
//! raw response text. Transport-level failures keep their own variants so the retry
//! policy can tell them apart.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Main error type for OCM operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The API answered with a non-2xx status
    #[error("{0}")]
    Api(Box<ApiError>),

    /// Operation timed out
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Could not connect to the service
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Failed to parse a response body
    #[error("Failed to parse OCM response: {0}")]
    ParseError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid endpoint or path
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The imageset record could not be translated
    #[error("Invalid imageset: {0}")]
    InvalidImageSet(String),

    /// Pagination did not converge on the reported total
    #[error("Pagination error: {0}")]
    Pagination(String),
}

/// Specialized result type for OCM operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Context of a request that received a non-2xx response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// HTTP method, upper-case
    pub method: String,
    /// Full request URL, without query string
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Query parameters sent with the request
    pub params: Vec<(String, String)>,
    /// JSON body sent with the request
    pub body: Option<Value>,
    /// Raw response body
    pub response_text: String,
}

impl ApiError {
    /// Returns true for 4xx statuses.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Returns true for 5xx statuses.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error {} {}", self.method, self.url)?;
        writeln!(f, "HTTP status {}", self.status)?;
        if !self.params.is_empty() {
            writeln!(f, "params: {:?}", self.params)?;
        }
        if let Some(body) = &self.body {
            writeln!(f, "json: {body}")?;
        }
        write!(f, "original error: {}", self.response_text)
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Self::Api(Box::new(err))
    }
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Api(_) => "API_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidImageSet(_) => "INVALID_IMAGESET",
            Self::Pagination(_) => "PAGINATION_ERROR",
        }
    }

    /// HTTP status of an API error, if this is one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(api) => Some(api.status),
            _ => None,
        }
    }

    /// Returns true if the API reported that the resource already exists (409).
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// Returns true if the API reported that the resource does not exist (404).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns true for failures that happened before any response was received.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::ServiceUnavailable(_) | Self::HttpError(_)
        )
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api_error(status: u16) -> ApiError {
        ApiError {
            method: "POST".to_string(),
            url: "https://api.example.com/api/clusters_mgmt/v1/addons".to_string(),
            status,
            params: Vec::new(),
            body: Some(json!({"id": "my-addon"})),
            response_text: "{\"kind\":\"Error\"}".to_string(),
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::from(api_error(409)).error_code(), "API_ERROR");
        assert_eq!(Error::Timeout("t".to_string()).error_code(), "TIMEOUT");
        assert_eq!(
            Error::ServiceUnavailable("t".to_string()).error_code(),
            "SERVICE_UNAVAILABLE"
        );
        assert_eq!(Error::HttpError("t".to_string()).error_code(), "HTTP_ERROR");
        assert_eq!(Error::ParseError("t".to_string()).error_code(), "PARSE_ERROR");
        assert_eq!(
            Error::ConfigError("t".to_string()).error_code(),
            "CONFIG_ERROR"
        );
        assert_eq!(
            Error::InvalidEndpoint("t".to_string()).error_code(),
            "INVALID_ENDPOINT"
        );
        assert_eq!(
            Error::ValidationError("t".to_string()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            Error::InvalidImageSet("t".to_string()).error_code(),
            "INVALID_IMAGESET"
        );
        assert_eq!(
            Error::Pagination("t".to_string()).error_code(),
            "PAGINATION_ERROR"
        );
    }

    #[test]
    fn test_api_error_display_includes_request_context() {
        let mut err = api_error(409);
        err.params = vec![("page".to_string(), "2".to_string())];
        let message = Error::from(err).to_string();

        assert!(message.starts_with(
            "Error POST https://api.example.com/api/clusters_mgmt/v1/addons\n"
        ));
        assert!(message.contains("HTTP status 409"));
        assert!(message.contains("params: [(\"page\", \"2\")]"));
        assert!(message.contains("json: {\"id\":\"my-addon\"}"));
        assert!(message.ends_with("original error: {\"kind\":\"Error\"}"));
    }

    #[test]
    fn test_api_error_display_omits_empty_context() {
        let mut err = api_error(500);
        err.body = None;
        let message = err.to_string();
        assert!(!message.contains("params:"));
        assert!(!message.contains("json:"));
    }

    #[test]
    fn test_status_helpers() {
        assert!(Error::from(api_error(409)).is_conflict());
        assert!(Error::from(api_error(404)).is_not_found());
        assert!(!Error::from(api_error(500)).is_conflict());
        assert_eq!(Error::Timeout("t".to_string()).status(), None);

        assert!(api_error(404).is_client_error());
        assert!(!api_error(404).is_server_error());
        assert!(api_error(503).is_server_error());
    }

    #[test]
    fn test_is_transport() {
        assert!(Error::Timeout("t".to_string()).is_transport());
        assert!(Error::ServiceUnavailable("t".to_string()).is_transport());
        assert!(Error::HttpError("t".to_string()).is_transport());
        assert!(!Error::from(api_error(503)).is_transport());
        assert!(!Error::ParseError("t".to_string()).is_transport());
    }

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let ocm_err: Error = err.into();
        assert!(matches!(ocm_err, Error::InvalidEndpoint(_)));
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let ocm_err: Error = err.into();
        assert!(matches!(ocm_err, Error::ParseError(_)));
    }

    #[test]
    fn test_error_partial_eq() {
        assert_eq!(Error::from(api_error(404)), Error::from(api_error(404)));
        assert_ne!(Error::from(api_error(404)), Error::from(api_error(409)));
    }
}
