//! # Autosend Client
//! Asynchronous wrapper around the Autosend transactional email HTTP API: build a [`SendEmailRequest`], hand it to a [`Client`], and get back either a [`SendEmailResponse`] or a structured [`Error`].
//!
//! ## Audience and uses
//! For Rust services that send single, triggered emails (sign-up confirmations, receipts, password resets) through Autosend. Configure with [`Client::builder`], [`Client::with_config`] or [`Client::with_options`], then call [`Client::send_email`] or [`Client::send_email_with_idempotency`].
//!
//! ## Runtime requirements
//! Async-only; run inside a Tokio (v1) runtime. HTTP calls use `reqwest`. Every call takes a [`Context`] that can cancel it or bound it with a deadline.
//!
//! ## Out of scope
//! The client never retries, queues, batches or caches. Idempotency keys are passed through to the API, not tracked. [`ApiError`] exposes enough to write a retry loop on the caller side.
//!
//! ## Errors
//! Invalid requests are rejected before any I/O as [`Error::Validation`]. Transport problems surface as [`Error::Request`] or, for a cancelled or expired [`Context`], [`Error::Cancelled`]. Any non-200 status becomes [`Error::Api`] carrying an [`ApiError`] with the status, field errors, retry hint and [`RateLimitInfo`]. The crate-wide [`Result`] alias wraps these errors.
//!
//! ## Logging
//! Requests are traced with `tracing` at debug level. The API key and request body are never recorded. No subscriber is installed.
//!
//! ## Example
//! ```no_run
//! use autosend_client::{Client, Context, EmailAddress, SendEmailRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), autosend_client::Error> {
//!     let client = Client::new("as_live_key")?;
//!     let request = SendEmailRequest::new(
//!         EmailAddress::with_name("customer@example.com", "Jane Smith"),
//!         EmailAddress::with_name("hello@mail.example.com", "Example Co"),
//!     )
//!     .subject("Welcome!")
//!     .html("<h1>Welcome, {{name}}!</h1>")
//!     .dynamic_data("name", "Jane");
//!
//!     match client.send_email(&Context::background(), &request).await {
//!         Ok(response) => println!("Queued: {}", response.data.email_id),
//!         Err(err) if err.api_error().is_some_and(|e| e.is_rate_limit()) => {
//!             println!("Slow down: {err}");
//!         }
//!         Err(err) => return Err(err),
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod context;
mod error;
mod models;
mod validate;

pub use client::{
    Client, ClientBuilder, ClientOption, Config, DEFAULT_BASE_URL, DEFAULT_TIMEOUT,
    with_base_url, with_http_client, with_timeout,
};
pub use context::{CancelHandle, CancelReason, Context};
pub use error::{ApiError, ApiErrorKind, Error};
pub use models::{
    EmailAddress, ErrorResponse, FieldError, RateLimitInfo, SendEmailData, SendEmailRequest,
    SendEmailResponse,
};
pub use validate::{ValidationError, validate};

/// Result type alias for Autosend operations.
///
/// This is equivalent to `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
