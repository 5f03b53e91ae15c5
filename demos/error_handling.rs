//! Caller-side retry loop built on the error predicates.
//!
//! Rate limits wait for the server's hint, server and transport errors back
//! off exponentially with jitter, and everything else fails immediately.

use autosend_client::{
    Client, Context, EmailAddress, Error, SendEmailRequest, SendEmailResponse,
};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const MAX_ATTEMPTS: u32 = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .init();

    let api_key = std::env::var("AUTOSEND_API_KEY")
        .map_err(|_| "AUTOSEND_API_KEY environment variable is required")?;

    let client = Client::new(api_key)?;

    let request = SendEmailRequest::new(
        EmailAddress::with_name("customer@example.com", "Jane Smith"),
        EmailAddress::with_name("hello@mail.yourdomain.com", "Your Company"),
    )
    .subject("Test Email")
    .html("<p>This is a test email</p>");

    let response = send_with_retry(&client, &request).await?;
    info!(email_id = %response.data.email_id, "email sent");
    Ok(())
}

async fn send_with_retry(
    client: &Client,
    request: &SendEmailRequest,
) -> Result<SendEmailResponse, Error> {
    let ctx = Context::background();
    let mut attempt = 0;

    loop {
        let err = match client.send_email(&ctx, request).await {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        attempt += 1;
        let Some(wait) = retry_delay(&err, attempt) else {
            return Err(err);
        };
        if attempt >= MAX_ATTEMPTS {
            warn!(attempts = attempt, error = %err, "giving up");
            return Err(err);
        }

        warn!(attempt, wait_ms = wait.as_millis() as u64, error = %err, "retrying");
        tokio::time::sleep(wait).await;
    }
}

/// How long to wait before retrying, or `None` if retrying cannot help.
fn retry_delay(err: &Error, attempt: u32) -> Option<Duration> {
    match err {
        Error::Api(api) if api.is_rate_limit() => {
            Some(api.retry_after().unwrap_or_else(|| backoff(attempt)))
        }
        Error::Api(api) if api.is_server_error() => Some(backoff(attempt)),
        Error::Request(_) => Some(backoff(attempt)),
        // Validation, authentication, forbidden, decode and cancellation
        // failures won't change on a second try.
        _ => None,
    }
}

fn backoff(attempt: u32) -> Duration {
    let jitter = rand::rng().random_range(0..250);
    Duration::from_secs(1 << (attempt - 1)) + Duration::from_millis(jitter)
}
