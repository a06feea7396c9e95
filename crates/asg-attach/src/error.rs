//! Configuration and lifecycle errors
//!
//! Every lifecycle error carries the [`ResolvedAttachment`] it was raised
//! for, so messages always name the group, the kind and the value.

use crate::aws::AwsError;
use crate::config::ResolvedAttachment;
use crate::identity::AttachmentId;
use crate::oracle::Missing;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// group_name is empty
    #[error("group_name cannot be empty")]
    EmptyGroupName,

    /// None of the membership fields is set
    #[error(
        "exactly one of load_balancer_name, target_group_id or legacy_target_group_id must be set, got none"
    )]
    MissingTarget,

    /// More than one membership field is set
    #[error(
        "exactly one of load_balancer_name, target_group_id or legacy_target_group_id must be set, got: {}",
        fields.join(", ")
    )]
    ConflictingTargets { fields: Vec<&'static str> },

    /// The selected membership field is empty
    #[error("{field} cannot be empty")]
    EmptyValue { field: &'static str },

    /// Failed to parse JSON configuration
    #[error("Failed to parse attachment spec: {0}")]
    Parse(#[from] serde_json::Error),

    /// Failed to read configuration file
    #[error("Failed to read attachment spec '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Lifecycle step an error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Attach,
    Detach,
    Read,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Attach => "attaching",
            Operation::Detach => "detaching",
            Operation::Read => "reading",
        })
    }
}

/// Errors surfaced by the attachment controller
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// Invalid or ambiguous attachment spec
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Attach call failed with a non-retryable error
    #[error("attaching {attachment}: {source}")]
    AttachmentFailed {
        attachment: ResolvedAttachment,
        #[source]
        source: AwsError,
    },

    /// Detach call failed with a non-retryable error
    #[error("detaching {attachment}: {source}")]
    DetachmentFailed {
        attachment: ResolvedAttachment,
        #[source]
        source: AwsError,
    },

    /// Group lookup failed for a reason other than absence
    #[error("reading {attachment} attachment: {source}")]
    ReadFailed {
        attachment: ResolvedAttachment,
        #[source]
        source: AwsError,
    },

    /// The attachment (or its group) is gone where it must exist
    #[error("{attachment} attachment not found ({missing} missing)")]
    NotFound {
        attachment: ResolvedAttachment,
        missing: Missing,
    },

    /// Deadline passed while retrying
    #[error("timed out {operation} {attachment} after {elapsed:?} ({attempts} attempts)")]
    Timeout {
        operation: Operation,
        attachment: ResolvedAttachment,
        elapsed: Duration,
        attempts: u32,
        last: Option<AwsError>,
    },

    /// Cancellation token fired while retrying
    #[error("cancelled while {operation} {attachment} ({attempts} attempts)")]
    Cancelled {
        operation: Operation,
        attachment: ResolvedAttachment,
        attempts: u32,
    },

    /// Attach succeeded and an identity was assigned, but the read-back failed
    #[error("attachment {id} was created but could not be verified: {source}")]
    Unverified {
        id: AttachmentId,
        #[source]
        source: Box<AttachmentError>,
    },
}

impl AttachmentError {
    /// The attachment this error was raised for, if any
    pub fn attachment(&self) -> Option<&ResolvedAttachment> {
        match self {
            AttachmentError::Config(_) => None,
            AttachmentError::AttachmentFailed { attachment, .. }
            | AttachmentError::DetachmentFailed { attachment, .. }
            | AttachmentError::ReadFailed { attachment, .. }
            | AttachmentError::NotFound { attachment, .. }
            | AttachmentError::Timeout { attachment, .. }
            | AttachmentError::Cancelled { attachment, .. } => Some(attachment),
            AttachmentError::Unverified { source, .. } => source.attachment(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            AttachmentError::NotFound { .. } => true,
            AttachmentError::Unverified { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AttachmentError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttachmentSpec;

    fn attachment() -> ResolvedAttachment {
        AttachmentSpec::by_target_group("asg-1", "tg-123")
            .resolve()
            .unwrap()
    }

    #[test]
    fn config_error_display() {
        assert_eq!(ConfigError::EmptyGroupName.to_string(), "group_name cannot be empty");
        assert_eq!(
            ConfigError::ConflictingTargets {
                fields: vec!["load_balancer_name", "target_group_id"]
            }
            .to_string(),
            "exactly one of load_balancer_name, target_group_id or legacy_target_group_id must be set, got: load_balancer_name, target_group_id"
        );
    }

    #[test]
    fn lifecycle_errors_name_group_kind_and_value() {
        let errors = [
            AttachmentError::AttachmentFailed {
                attachment: attachment(),
                source: AwsError::Throttled,
            },
            AttachmentError::DetachmentFailed {
                attachment: attachment(),
                source: AwsError::Throttled,
            },
            AttachmentError::ReadFailed {
                attachment: attachment(),
                source: AwsError::Throttled,
            },
            AttachmentError::NotFound {
                attachment: attachment(),
                missing: Missing::Membership,
            },
            AttachmentError::Timeout {
                operation: Operation::Attach,
                attachment: attachment(),
                elapsed: Duration::from_secs(5),
                attempts: 3,
                last: None,
            },
            AttachmentError::Cancelled {
                operation: Operation::Detach,
                attachment: attachment(),
                attempts: 1,
            },
        ];

        for err in errors {
            let msg = err.to_string();
            assert!(msg.contains("asg-1"), "{msg}");
            assert!(msg.contains("target group"), "{msg}");
            assert!(msg.contains("tg-123"), "{msg}");
            assert_eq!(err.attachment(), Some(&attachment()));
        }
    }

    #[test]
    fn attachment_failed_display() {
        let err = AttachmentError::AttachmentFailed {
            attachment: attachment(),
            source: AwsError::Throttled,
        };
        assert_eq!(
            err.to_string(),
            "attaching Auto Scaling Group (asg-1) target group (tg-123): Rate limit exceeded"
        );
    }

    #[test]
    fn unverified_delegates_to_source() {
        let err = AttachmentError::Unverified {
            id: AttachmentId::from("asg-1-x".to_string()),
            source: Box::new(AttachmentError::NotFound {
                attachment: attachment(),
                missing: Missing::Group,
            }),
        };
        assert!(err.is_not_found());
        assert_eq!(err.attachment(), Some(&attachment()));
        assert!(err.to_string().contains("asg-1-x"));
    }
}
