//! AWS error classification
//!
//! Auto Scaling reports most client-side failures as `ValidationError` and
//! only distinguishes them by message, so classification looks at both the
//! `.code()` and the `.message()` of the SDK error metadata.

use aws_sdk_autoscaling::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// AWS error categories for retry and idempotency decisions
#[derive(Debug, Clone, Error)]
pub enum AwsError {
    /// Resource was not found (safe to treat as already gone on delete)
    #[error("Resource not found: {resource_type} '{resource_id}'")]
    NotFound {
        resource_type: &'static str,
        resource_id: String,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    Throttled,

    /// Generic AWS SDK error with code and message
    #[error("AWS error{}: {message}", code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Not-found error for an Auto Scaling group that does not exist
    pub fn group_not_found(group_name: impl Into<String>) -> Self {
        AwsError::NotFound {
            resource_type: "Auto Scaling Group",
            resource_id: group_name.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Error code reported by AWS, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::Sdk { code, .. } => code.as_deref(),
            AwsError::Throttled => Some("Throttling"),
            AwsError::NotFound { .. } => None,
        }
    }
}

/// Error code Auto Scaling uses for request validation failures
pub const VALIDATION_ERROR_CODE: &str = "ValidationError";

/// Message fragment of the membership mutation limit error, e.g.
/// "Trying to update too many Load Balancers/Target Groups at once. The limit is 10"
pub const TRANSIENT_CAPACITY_MESSAGE: &str = "update too many";

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &["ResourceNotFound", "ResourceNotFoundException"];

/// Whether an error is the service's "too many simultaneous membership
/// updates" rejection.
///
/// The API exposes no dedicated code for this condition, so this is the only
/// place that matches on the message.
pub fn is_transient_capacity_error(error: &AwsError) -> bool {
    match error {
        AwsError::Sdk {
            code: Some(code),
            message,
        } => code == VALIDATION_ERROR_CODE && message.contains(TRANSIENT_CAPACITY_MESSAGE),
        _ => false,
    }
}

/// Classify an AWS error from its code and message.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            resource_type: "resource",
            resource_id: message,
        },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        Some(VALIDATION_ERROR_CODE) if message.to_ascii_lowercase().contains("not found") => {
            AwsError::NotFound {
                resource_type: "resource",
                resource_id: message,
            }
        }
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify an SDK operation error.
///
/// Service errors carry a code and are classified by it. Dispatch, timeout
/// and response errors have no code; their full error context becomes the
/// message.
pub fn classify_sdk_error<E>(error: &SdkError<E>) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match ProvideErrorMetadata::code(error) {
        Some(code) => classify_aws_error(Some(code), ProvideErrorMetadata::message(error)),
        None => AwsError::Sdk {
            code: None,
            message: DisplayErrorContext(error).to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation(message: &str) -> AwsError {
        classify_aws_error(Some(VALIDATION_ERROR_CODE), Some(message))
    }

    #[test]
    fn update_too_many_is_transient() {
        let err = validation(
            "Trying to update too many Load Balancers/Target Groups at once. The limit is 10",
        );
        assert!(is_transient_capacity_error(&err));
    }

    #[test]
    fn other_validation_errors_are_not_transient() {
        let err = validation("Provided Load Balancers may not be valid");
        assert!(!is_transient_capacity_error(&err));
        assert_eq!(err.code(), Some(VALIDATION_ERROR_CODE));
    }

    #[test]
    fn message_without_validation_code_is_not_transient() {
        let err = classify_aws_error(Some("InternalFailure"), Some("update too many"));
        assert!(!is_transient_capacity_error(&err));

        let err = classify_aws_error(None, Some("update too many"));
        assert!(!is_transient_capacity_error(&err));
    }

    #[test]
    fn throttling_codes() {
        for code in THROTTLING_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(matches!(err, AwsError::Throttled), "code: {code}");
            assert!(!is_transient_capacity_error(&err));
        }
    }

    #[test]
    fn group_not_found_validation_error() {
        let err = validation("AutoScalingGroup name not found - AutoScalingGroup 'asg-1' not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            assert!(classify_aws_error(Some(code), None).is_not_found());
        }
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("SomeNewError"), Some("details"));
        assert!(matches!(err, AwsError::Sdk { .. }));
        assert_eq!(err.to_string(), "AWS error (SomeNewError): details");

        let err = classify_aws_error(None, None);
        assert!(matches!(err, AwsError::Sdk { code: None, .. }));
        assert_eq!(err.to_string(), "AWS error: Unknown error");
    }

    #[test]
    fn group_not_found_display() {
        let err = AwsError::group_not_found("asg-1");
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Resource not found: Auto Scaling Group 'asg-1'"
        );
    }
}
