//! Send a plain HTML email with template variables.
//!
//! ```sh
//! AUTOSEND_API_KEY=... cargo run --example basic
//! ```

use autosend_client::{Client, Context, EmailAddress, SendEmailRequest};
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
    .subject("Welcome to Our Platform!")
    .html("<h1>Welcome, {{name}}!</h1><p>Thanks for signing up.</p>")
    .dynamic_data("name", "Jane")
    .categories(["welcome", "onboarding"]);

    let response = client.send_email(&Context::background(), &request).await?;

    println!("Email sent successfully!");
    println!("Email ID: {}", response.data.email_id);
    println!("Status: {}", response.data.status);
    println!("Queued At: {}", response.data.queued_at);
    Ok(())
}
