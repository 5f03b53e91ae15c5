//! Send a templated email with an idempotency key so a retry cannot send it
//! twice.

use autosend_client::{Client, Context, EmailAddress, SendEmailRequest};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let api_key = std::env::var("AUTOSEND_API_KEY")
        .map_err(|_| "AUTOSEND_API_KEY environment variable is required")?;

    let client = Client::new(api_key)?;

    let request = SendEmailRequest::new(
        EmailAddress::with_name("customer@example.com", "Jane Smith"),
        EmailAddress::with_name("hello@mail.yourdomain.com", "Your Company"),
    )
    .template_id("tmpl_abc123")
    .dynamic_data("firstName", "Jane")
    .dynamic_data("orderNumber", "ORD-12345")
    .dynamic_data("orderTotal", "$99.99")
    .categories(["order", "confirmation"]);

    let ctx = Context::background().with_timeout(Duration::from_secs(10));
    let idempotency_key = "order-confirmation-ORD-12345";
    let response = client
        .send_email_with_idempotency(&ctx, &request, idempotency_key)
        .await?;

    println!("Email sent successfully!");
    println!("Email ID: {}", response.data.email_id);
    println!("Status: {}", response.data.status);
    Ok(())
}
