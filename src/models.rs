//! Data models for Autosend API requests and responses.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An email address with an optional display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    /// The address itself, e.g. `jane@example.com`.
    pub email: String,
    /// Display name; omitted from the payload when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl EmailAddress {
    /// Create an address without a display name.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: String::new(),
        }
    }

    /// Create an address with a display name.
    pub fn with_name(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }
}

impl From<&str> for EmailAddress {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

impl From<String> for EmailAddress {
    fn from(email: String) -> Self {
        Self::new(email)
    }
}

/// Request body for `POST /mails/send`.
///
/// Either `template_id` or at least one of `html`/`text` must be set, and
/// `subject` is required whenever no template is used. These rules are
/// checked by [`crate::validate()`] before anything is sent.
///
/// Empty strings, empty collections and `test == false` are left out of the
/// serialized JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    pub to: EmailAddress,
    pub from: EmailAddress,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subject: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub html: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub unsubscribe_group_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Template variables. The API does not impose a schema on these.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub dynamic_data: Map<String, Value>,
    /// ISO-8601 timestamp for delayed delivery.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scheduled_at: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub campaign_name: String,
    /// Send in test mode.
    #[serde(default, skip_serializing_if = "is_false")]
    pub test: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl SendEmailRequest {
    /// Start a request addressed from `from` to `to`.
    ///
    /// # Examples
    /// ```
    /// use autosend_client::{EmailAddress, SendEmailRequest};
    ///
    /// let request = SendEmailRequest::new(
    ///     EmailAddress::with_name("jane@example.com", "Jane"),
    ///     "hello@mail.example.com",
    /// )
    /// .subject("Welcome!")
    /// .html("<h1>Hi {{name}}</h1>")
    /// .dynamic_data("name", "Jane");
    ///
    /// assert_eq!(request.subject, "Welcome!");
    /// ```
    pub fn new(to: impl Into<EmailAddress>, from: impl Into<EmailAddress>) -> Self {
        Self {
            to: to.into(),
            from: from.into(),
            ..Self::default()
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = html.into();
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn template_id(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = template_id.into();
        self
    }

    pub fn reply_to(mut self, reply_to: impl Into<EmailAddress>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    pub fn unsubscribe_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.unsubscribe_group_id = group_id.into();
        self
    }

    /// Append a single category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    /// Replace the category list.
    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Set one template variable, overwriting any previous value for `key`.
    pub fn dynamic_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.dynamic_data.insert(key.into(), value.into());
        self
    }

    pub fn scheduled_at(mut self, scheduled_at: impl Into<String>) -> Self {
        self.scheduled_at = scheduled_at.into();
        self
    }

    pub fn campaign_name(mut self, campaign_name: impl Into<String>) -> Self {
        self.campaign_name = campaign_name.into();
        self
    }

    pub fn test(mut self, test: bool) -> Self {
        self.test = test;
        self
    }
}

/// Successful response from `POST /mails/send`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: String,
    pub data: SendEmailData,
}

/// Details of a queued email.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailData {
    pub email_id: String,
    pub status: String,
    pub queued_at: DateTime<Utc>,
}

/// A single field-level problem reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Body returned by the API alongside a non-200 status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<FieldError>,
    /// Seconds to wait before retrying; only set on 429 responses.
    #[serde(default)]
    pub retry_after: i64,
}

const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Rate-limit snapshot taken from the `X-RateLimit-*` response headers.
///
/// Missing or malformed headers leave the corresponding field at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// `X-RateLimit-Limit`
    pub limit: u32,
    /// `X-RateLimit-Remaining`
    pub remaining: u32,
    /// `X-RateLimit-Reset`, as a Unix timestamp in seconds.
    pub reset: i64,
}

impl RateLimitInfo {
    /// Parse the rate-limit headers, ignoring anything unreadable.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            limit: header_number(headers, RATE_LIMIT_LIMIT).unwrap_or_default(),
            remaining: header_number(headers, RATE_LIMIT_REMAINING).unwrap_or_default(),
            reset: header_number(headers, RATE_LIMIT_RESET).unwrap_or_default(),
        }
    }

    /// The reset time as a UTC timestamp, if the header carried one.
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        if self.reset == 0 {
            return None;
        }
        DateTime::from_timestamp(self.reset, 0)
    }
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    #[test]
    fn minimal_request_omits_empty_fields() {
        let request = SendEmailRequest::new("to@example.com", "from@example.com")
            .subject("Hi")
            .text("Hello");

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "to": {"email": "to@example.com"},
                "from": {"email": "from@example.com"},
                "subject": "Hi",
                "text": "Hello"
            })
        );
    }

    #[test]
    fn full_request_matches_wire_document() {
        let request = SendEmailRequest::new(
            EmailAddress::with_name("customer@example.com", "Jane Smith"),
            EmailAddress::with_name("hello@mail.example.com", "Example Co"),
        )
        .subject("Your order")
        .html("<p>Order {{orderNumber}}</p>")
        .text("Order {{orderNumber}}")
        .template_id("tmpl_abc123")
        .reply_to(EmailAddress::with_name("support@example.com", "Support"))
        .unsubscribe_group_id("grp_1")
        .categories(["order", "confirmation"])
        .dynamic_data("orderNumber", "ORD-12345")
        .dynamic_data("items", json!([{"sku": "A1", "qty": 2}]))
        .scheduled_at("2025-01-01T09:00:00Z")
        .campaign_name("spring")
        .test(true);

        let expected = json!({
            "to": {"email": "customer@example.com", "name": "Jane Smith"},
            "from": {"email": "hello@mail.example.com", "name": "Example Co"},
            "subject": "Your order",
            "html": "<p>Order {{orderNumber}}</p>",
            "text": "Order {{orderNumber}}",
            "templateId": "tmpl_abc123",
            "replyTo": {"email": "support@example.com", "name": "Support"},
            "unsubscribeGroupId": "grp_1",
            "categories": ["order", "confirmation"],
            "dynamicData": {
                "orderNumber": "ORD-12345",
                "items": [{"sku": "A1", "qty": 2}]
            },
            "scheduledAt": "2025-01-01T09:00:00Z",
            "campaignName": "spring",
            "test": true
        });

        assert_eq!(serde_json::to_value(&request).unwrap(), expected);
    }

    #[test]
    fn category_appends() {
        let request = SendEmailRequest::new("a@example.com", "b@example.com")
            .category("welcome")
            .category("onboarding");
        assert_eq!(request.categories, vec!["welcome", "onboarding"]);
    }

    #[test]
    fn success_response_parses_timestamp() {
        let body = r#"{"success":true,"message":"ok","data":{"emailId":"em_1","status":"queued","queuedAt":"2025-01-01T00:00:00Z"}}"#;
        let response: SendEmailResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.data.email_id, "em_1");
        assert_eq!(response.data.status, "queued");
        assert_eq!(response.data.queued_at.timestamp(), 1_735_689_600);
    }

    #[test]
    fn error_response_defaults_missing_fields() {
        let parsed: ErrorResponse =
            serde_json::from_str(r#"{"success":false,"message":"nope"}"#).unwrap();
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.retry_after, 0);
    }

    #[test]
    fn error_response_accepts_negative_retry_after() {
        let parsed: ErrorResponse =
            serde_json::from_str(r#"{"message":"slow down","retryAfter":-1}"#).unwrap();
        assert_eq!(parsed.message, "slow down");
        assert_eq!(parsed.retry_after, -1);
    }

    #[test]
    fn rate_limit_headers_parse() {
        let mut headers = HeaderMap::new();
        headers.insert("X-RateLimit-Limit", HeaderValue::from_static("50"));
        headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("7"));
        headers.insert("X-RateLimit-Reset", HeaderValue::from_static("1700000000"));

        let info = RateLimitInfo::from_headers(&headers);
        assert_eq!(
            info,
            RateLimitInfo {
                limit: 50,
                remaining: 7,
                reset: 1_700_000_000
            }
        );
        assert_eq!(info.reset_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn malformed_rate_limit_headers_become_zero() {
        let mut headers = HeaderMap::new();
        headers.insert("X-RateLimit-Limit", HeaderValue::from_static("lots"));
        headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("-3"));

        let info = RateLimitInfo::from_headers(&headers);
        assert_eq!(info, RateLimitInfo::default());
        assert!(info.reset_at().is_none());
    }
}
