//! Error types for the Autosend client.

use crate::{CancelReason, ErrorResponse, FieldError, RateLimitInfo, ValidationError};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, InvalidHeaderValue};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when sending email through Autosend.
#[derive(Error, Debug)]
pub enum Error {
    /// The request was rejected locally before anything was sent.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The API key or idempotency key is not a valid header value.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    /// The HTTP exchange could not be completed (DNS, connect, timeout, I/O).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The call's [`crate::Context`] was cancelled or its deadline passed.
    #[error("request aborted: {0}")]
    Cancelled(#[from] CancelReason),

    /// A 200 response carried a body that is not a valid send response.
    #[error("failed to parse response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The API answered with a non-200 status.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl Error {
    /// The classified API error, if this is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }

    /// `true` when the exchange itself failed, including cancellation.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Request(_) | Error::Cancelled(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }

    /// `true` for an expired context deadline or a transport timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Cancelled(reason) => *reason == CancelReason::DeadlineExceeded,
            Error::Request(err) => err.is_timeout(),
            _ => false,
        }
    }
}

/// Coarse category of an [`ApiError`], derived from its status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// 429
    RateLimit,
    /// 400
    Validation,
    /// 401
    Authentication,
    /// 403
    Forbidden,
    /// 5xx
    ServerError,
    Other,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimit,
            400 => Self::Validation,
            401 => Self::Authentication,
            403 => Self::Forbidden,
            500..=599 => Self::ServerError,
            _ => Self::Other,
        }
    }
}

/// A non-200 response from the Autosend API.
///
/// Branch on [`kind`](Self::kind) or the `is_*` predicates rather than on the
/// rendered message, which is meant for humans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: u16,
    kind: ApiErrorKind,
    message: String,
    field_errors: Vec<FieldError>,
    retry_after: i64,
    rate_limit: RateLimitInfo,
}

impl ApiError {
    /// Classify a non-200 response from its status, headers and raw body.
    ///
    /// Never fails: a body that is not an [`ErrorResponse`] becomes the
    /// message verbatim, and unreadable rate-limit headers become zeros.
    pub fn from_parts(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> Self {
        let rate_limit = RateLimitInfo::from_headers(headers);

        let (message, field_errors, retry_after) =
            match serde_json::from_slice::<ErrorResponse>(body) {
                Ok(parsed) => (parsed.message, parsed.errors, parsed.retry_after),
                Err(_) => (String::from_utf8_lossy(body).into_owned(), Vec::new(), 0),
            };

        Self::new(status, message, field_errors, retry_after, rate_limit)
    }

    pub(crate) fn new(
        status: StatusCode,
        message: String,
        field_errors: Vec<FieldError>,
        retry_after: i64,
        rate_limit: RateLimitInfo,
    ) -> Self {
        let status = status.as_u16();
        Self {
            status,
            kind: ApiErrorKind::from_status(status),
            message,
            field_errors,
            retry_after,
            rate_limit,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    /// Top-level message from the API, or the raw body if it was not JSON.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    /// Rate-limit headers that came with the response.
    pub fn rate_limit(&self) -> &RateLimitInfo {
        &self.rate_limit
    }

    pub fn is_rate_limit(&self) -> bool {
        self.kind == ApiErrorKind::RateLimit
    }

    pub fn is_validation(&self) -> bool {
        self.kind == ApiErrorKind::Validation
    }

    pub fn is_authentication(&self) -> bool {
        self.kind == ApiErrorKind::Authentication
    }

    pub fn is_forbidden(&self) -> bool {
        self.kind == ApiErrorKind::Forbidden
    }

    pub fn is_server_error(&self) -> bool {
        self.kind == ApiErrorKind::ServerError
    }

    /// Seconds the API asked us to wait. Always 0 unless this is a rate-limit
    /// error; negative hints are treated as 0.
    pub fn retry_after_seconds(&self) -> u64 {
        if self.is_rate_limit() {
            u64::try_from(self.retry_after).unwrap_or(0)
        } else {
            0
        }
    }

    /// [`retry_after_seconds`](Self::retry_after_seconds) as a duration, if
    /// non-zero.
    pub fn retry_after(&self) -> Option<Duration> {
        match self.retry_after_seconds() {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "autosend API error (status {}): {}",
            self.status, self.message
        )?;

        if !self.field_errors.is_empty() {
            let fields = self
                .field_errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect::<Vec<_>>()
                .join(", ");
            return write!(f, " - {fields}");
        }

        if self.retry_after > 0 {
            write!(f, " (retry after {} seconds)", self.retry_after)?;
        }

        Ok(())
    }
}

impl std::error::Error for ApiError {}
