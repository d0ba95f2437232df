//! Error types for the coach-chat client.
//!
//! Every failure in this crate is scoped to a single exchange; nothing here is
//! fatal to the process.

use std::error;
use std::fmt;
use std::sync::Arc;

/// Underlying cause kept alongside an error so it stays `Clone`.
type Cause = Arc<dyn error::Error + Send + Sync>;

/// The main error type for the coach-chat client.
#[derive(Clone, Debug)]
pub enum Error {
    /// The coaching API answered with a status this crate has no variant for.
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Message pulled from the response body.
        message: String,
    },

    /// The endpoint or universe does not exist (404).
    NotFound {
        /// Message pulled from the response body.
        message: String,
        /// Path that was requested.
        path: Option<String>,
    },

    /// The message quota is used up or requests come too fast (429).
    RateLimit {
        /// Message pulled from the response body.
        message: String,
        /// Seconds from the `retry-after` header.
        retry_after: Option<u64>,
    },

    /// The server rejected the request body (400, 422).
    BadRequest {
        /// Message pulled from the response body.
        message: String,
    },

    /// The request timed out, locally or at the server (408).
    Timeout {
        /// Human-readable error message.
        message: String,
        /// The timeout that elapsed, in seconds.
        duration: Option<f64>,
    },

    /// The server could not be reached.
    Connection {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Cause>,
    },

    /// The server failed while handling the request (500).
    InternalServer {
        /// Message pulled from the response body.
        message: String,
    },

    /// A gateway or the server is unavailable (502-504).
    ServiceUnavailable {
        /// Message pulled from the response body.
        message: String,
        /// Seconds from the `retry-after` header.
        retry_after: Option<u64>,
    },

    /// A JSON body could not be encoded or decoded.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Cause>,
    },

    /// The HTTP client failed outside of connecting or timing out.
    HttpClient {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Cause>,
    },

    /// Local input was rejected before any request was made.
    Validation {
        /// Human-readable error message.
        message: String,
        /// Name of the offending input.
        param: Option<String>,
    },

    /// The base URL or an endpoint could not be built.
    Url {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<url::ParseError>,
    },

    /// The byte stream failed while a reply was being read.
    Streaming {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Cause>,
    },
}

impl Error {
    /// Creates an error for an unmapped status code.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Error::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>, path: Option<String>) -> Self {
        Error::NotFound {
            message: message.into(),
            path,
        }
    }

    /// Creates a rate limit error.
    pub fn rate_limit(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Error::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
        }
    }

    /// Creates a connection error.
    pub fn connection(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates an internal server error.
    pub fn internal_server(message: impl Into<String>) -> Self {
        Error::InternalServer {
            message: message.into(),
        }
    }

    /// Creates a service unavailable error.
    pub fn service_unavailable(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Error::ServiceUnavailable {
            message: message.into(),
            retry_after,
        }
    }

    /// Creates a serialization error.
    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates an HTTP client error.
    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>, param: Option<String>) -> Self {
        Error::Validation {
            message: message.into(),
            param,
        }
    }

    /// Creates a streaming error.
    pub fn streaming(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Streaming {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Returns true if the requested resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Returns true if the quota or rate limit was hit.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::RateLimit { .. })
    }

    /// Returns true if the reply broke off mid-stream.
    pub fn is_streaming(&self) -> bool {
        matches!(self, Error::Streaming { .. })
    }

    /// Returns true if local input was rejected.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Returns the HTTP status code behind this error, if it has a fixed one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            Error::NotFound { .. } => Some(404),
            Error::RateLimit { .. } => Some(429),
            Error::BadRequest { .. } => Some(400),
            Error::InternalServer { .. } => Some(500),
            _ => None,
        }
    }
}

fn write_retry(f: &mut fmt::Formatter<'_>, retry_after: &Option<u64>) -> fmt::Result {
    match retry_after {
        Some(seconds) => write!(f, " (retry after {seconds} seconds)"),
        None => Ok(()),
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Api {
                status_code,
                message,
            } => write!(f, "Coach API error ({status_code}): {message}"),
            Error::NotFound { message, path } => match path {
                Some(path) => write!(f, "Not found: {message} [{path}]"),
                None => write!(f, "Not found: {message}"),
            },
            Error::RateLimit {
                message,
                retry_after,
            } => {
                write!(f, "Message limit reached: {message}")?;
                write_retry(f, retry_after)
            }
            Error::BadRequest { message } => write!(f, "Request rejected: {message}"),
            Error::Timeout { message, duration } => match duration {
                Some(duration) => write!(f, "Timed out after {duration} seconds: {message}"),
                None => write!(f, "Timed out: {message}"),
            },
            Error::Connection { message, .. } => write!(f, "Cannot reach coach: {message}"),
            Error::InternalServer { message } => write!(f, "Coach server error: {message}"),
            Error::ServiceUnavailable {
                message,
                retry_after,
            } => {
                write!(f, "Coach unavailable: {message}")?;
                write_retry(f, retry_after)
            }
            Error::Serialization { message, .. } => write!(f, "Bad JSON: {message}"),
            Error::HttpClient { message, .. } => write!(f, "HTTP client error: {message}"),
            Error::Validation { message, param } => match param {
                Some(param) => write!(f, "Invalid {param}: {message}"),
                None => write!(f, "Invalid input: {message}"),
            },
            Error::Url { message, .. } => write!(f, "Bad URL: {message}"),
            Error::Streaming { message, .. } => write!(f, "Reply interrupted: {message}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connection { source, .. }
            | Error::Serialization { source, .. }
            | Error::HttpClient { source, .. }
            | Error::Streaming { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(err.to_string(), Some(Box::new(err)))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Url {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// A specialized Result type for coach-chat operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn quota_error_mentions_retry() {
        let err = Error::rate_limit("daily quota used", Some(30));
        assert_eq!(
            err.to_string(),
            "Message limit reached: daily quota used (retry after 30 seconds)"
        );
        assert!(err.is_rate_limit());
        assert_eq!(err.status_code(), Some(429));
        assert_eq!(
            Error::service_unavailable("deploying", None).to_string(),
            "Coach unavailable: deploying"
        );
    }

    #[test]
    fn json_and_url_errors_keep_source() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::from(json_err);
        assert!(matches!(err, Error::Serialization { .. }));
        assert!(err.source().is_some());

        let url_err = url::Url::parse("not a url").unwrap_err();
        let err = Error::from(url_err);
        assert!(matches!(err, Error::Url { .. }));
        assert!(err.source().is_some());
    }

    #[test]
    fn status_codes() {
        assert_eq!(Error::api(418, "teapot").status_code(), Some(418));
        assert_eq!(Error::not_found("gone", None).status_code(), Some(404));
        assert_eq!(Error::bad_request("nope").status_code(), Some(400));
        assert_eq!(Error::streaming("reset", None).status_code(), None);
        assert!(Error::streaming("reset", None).is_streaming());
    }
}
