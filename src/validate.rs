//! Pre-flight checks run before a request is built.

use crate::SendEmailRequest;
use thiserror::Error;

/// A send request that the API would reject for missing content.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("to.email is required")]
    MissingRecipient,
    #[error("from.email is required")]
    MissingSender,
    #[error("either templateId or html/text content must be provided")]
    MissingContent,
    #[error("subject is required when not using a template")]
    MissingSubject,
}

/// Check the required fields of a send request.
///
/// Rules are applied in order and the first failure is returned. No I/O is
/// performed.
pub fn validate(request: &SendEmailRequest) -> Result<(), ValidationError> {
    if request.to.email.is_empty() {
        return Err(ValidationError::MissingRecipient);
    }

    if request.from.email.is_empty() {
        return Err(ValidationError::MissingSender);
    }

    if request.template_id.is_empty() && request.html.is_empty() && request.text.is_empty() {
        return Err(ValidationError::MissingContent);
    }

    if request.template_id.is_empty() && request.subject.is_empty() {
        return Err(ValidationError::MissingSubject);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SendEmailRequest {
        SendEmailRequest::new("to@example.com", "from@example.com")
    }

    #[test]
    fn html_with_subject_is_valid() {
        assert_eq!(validate(&base().subject("Hi").html("<p>Hi</p>")), Ok(()));
    }

    #[test]
    fn text_with_subject_is_valid() {
        assert_eq!(validate(&base().subject("Hi").text("Hi")), Ok(()));
    }

    #[test]
    fn template_alone_is_valid() {
        assert_eq!(validate(&base().template_id("tmpl_1")), Ok(()));
    }

    #[test]
    fn missing_recipient_is_checked_first() {
        let request = SendEmailRequest::new("", "");
        assert_eq!(validate(&request), Err(ValidationError::MissingRecipient));
    }

    #[test]
    fn missing_sender() {
        let request = SendEmailRequest::new("to@example.com", "").template_id("tmpl_1");
        assert_eq!(validate(&request), Err(ValidationError::MissingSender));
    }

    #[test]
    fn name_without_address_is_missing() {
        let mut request = base().template_id("tmpl_1");
        request.to = crate::EmailAddress::with_name("", "Jane");
        assert_eq!(validate(&request), Err(ValidationError::MissingRecipient));
    }

    #[test]
    fn missing_content() {
        assert_eq!(
            validate(&base().subject("Hi")),
            Err(ValidationError::MissingContent)
        );
    }

    #[test]
    fn content_is_checked_before_subject() {
        assert_eq!(validate(&base()), Err(ValidationError::MissingContent));
    }

    #[test]
    fn missing_subject_without_template() {
        assert_eq!(
            validate(&base().html("<p>Hi</p>")),
            Err(ValidationError::MissingSubject)
        );
    }

    #[test]
    fn messages_are_distinct() {
        let messages = [
            ValidationError::MissingRecipient,
            ValidationError::MissingSender,
            ValidationError::MissingContent,
            ValidationError::MissingSubject,
        ]
        .map(|e| e.to_string());

        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
