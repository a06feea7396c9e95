//! Attachment existence checks
//!
//! An attachment has no server-side object. Whether it exists is answered by
//! fetching the owning group and looking for the value in the membership list
//! selected by kind. Lists are small (the service caps them), so a linear
//! scan is all that is needed.

use crate::aws::{AwsError, GroupDirectory, GroupState};
use crate::config::{AttachmentTarget, Kind};
use std::fmt;
use thiserror::Error;

/// What was missing when an attachment lookup came back empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// The Auto Scaling group itself does not exist
    Group,
    /// The group exists but the value is not in its membership list
    Membership,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Group => f.write_str("group"),
            Missing::Membership => f.write_str("membership"),
        }
    }
}

/// Failure of an existence check
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{0} not found")]
    NotFound(Missing),

    #[error(transparent)]
    Api(AwsError),
}

impl LookupError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound(_))
    }
}

/// The membership list an attachment of `kind` lives in
pub fn membership_list(group: &GroupState, kind: Kind) -> &[String] {
    match kind {
        Kind::ByName => &group.load_balancer_names,
        Kind::ByTargetGroupId => &group.target_group_ids,
    }
}

/// Whether `target` appears verbatim in the matching list of `group`
pub fn contains(group: &GroupState, target: &AttachmentTarget) -> bool {
    membership_list(group, target.kind())
        .iter()
        .any(|v| v == target.value())
}

/// Check whether `target` is attached to `group_name`.
///
/// Returns `Ok(true)` when present, `LookupError::NotFound` tagged with what
/// was missing otherwise.
pub async fn exists<D: GroupDirectory>(
    directory: &D,
    group_name: &str,
    target: &AttachmentTarget,
) -> Result<bool, LookupError> {
    let group = match directory.describe_group(group_name).await {
        Ok(group) => group,
        Err(e) if e.is_not_found() => return Err(LookupError::NotFound(Missing::Group)),
        Err(e) => return Err(LookupError::Api(e)),
    };

    if contains(&group, target) {
        Ok(true)
    } else {
        Err(LookupError::NotFound(Missing::Membership))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> GroupState {
        GroupState::new("asg-1")
            .with_load_balancer("lb-a")
            .with_load_balancer("lb-b")
            .with_target_group("tg-123")
    }

    #[test]
    fn finds_load_balancer_by_name() {
        assert!(contains(&group(), &AttachmentTarget::LoadBalancer("lb-a".into())));
        assert!(!contains(&group(), &AttachmentTarget::LoadBalancer("lb-c".into())));
    }

    #[test]
    fn lists_are_not_mixed() {
        assert!(!contains(&group(), &AttachmentTarget::LoadBalancer("tg-123".into())));
        assert!(!contains(&group(), &AttachmentTarget::TargetGroup("lb-a".into())));
        assert!(contains(&group(), &AttachmentTarget::TargetGroup("tg-123".into())));
    }

    #[test]
    fn match_is_exact() {
        assert!(!contains(&group(), &AttachmentTarget::LoadBalancer("lb".into())));
        assert!(!contains(&group(), &AttachmentTarget::LoadBalancer("LB-A".into())));
    }

    #[test]
    fn missing_display() {
        assert_eq!(LookupError::NotFound(Missing::Group).to_string(), "group not found");
        assert_eq!(
            LookupError::NotFound(Missing::Membership).to_string(),
            "membership not found"
        );
    }
}
