//! Attachment configuration and mode selection
//!
//! An [`AttachmentSpec`] is what the user declares: a group plus exactly one
//! of three membership fields. [`AttachmentSpec::resolve`] turns it into a
//! [`ResolvedAttachment`], the only form the controller accepts, so the
//! "exactly one of" rule is enforced once at the configuration boundary.

use crate::defaults;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Which membership list and operation family an attachment uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Classic load balancer, addressed by name
    ByName,
    /// Target group, addressed by ARN
    ByTargetGroupId,
}

impl Kind {
    /// Human-readable label used in logs and error messages
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::ByName => "load balancer",
            Kind::ByTargetGroupId => "target group",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The membership value being attached, tagged by kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttachmentTarget {
    /// Classic load balancer name
    LoadBalancer(String),
    /// Target group ARN
    TargetGroup(String),
}

impl AttachmentTarget {
    pub fn kind(&self) -> Kind {
        match self {
            AttachmentTarget::LoadBalancer(_) => Kind::ByName,
            AttachmentTarget::TargetGroup(_) => Kind::ByTargetGroupId,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            AttachmentTarget::LoadBalancer(v) | AttachmentTarget::TargetGroup(v) => v,
        }
    }
}

impl fmt::Display for AttachmentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind(), self.value())
    }
}

/// A validated attachment: one group, one membership value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedAttachment {
    pub group_name: String,
    pub target: AttachmentTarget,
}

impl ResolvedAttachment {
    pub fn kind(&self) -> Kind {
        self.target.kind()
    }

    pub fn value(&self) -> &str {
        self.target.value()
    }
}

impl fmt::Display for ResolvedAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Auto Scaling Group ({}) {}", self.group_name, self.target)
    }
}

/// Declared attachment configuration.
///
/// Field aliases accept the `aws_autoscaling_attachment` argument names so
/// existing configurations can be loaded unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttachmentSpec {
    /// Auto Scaling group name
    #[serde(alias = "autoscaling_group_name")]
    pub group_name: String,

    /// Classic load balancer name
    #[serde(default, alias = "elb", skip_serializing_if = "Option::is_none")]
    pub load_balancer_name: Option<String>,

    /// Target group ARN
    #[serde(
        default,
        alias = "lb_target_group_arn",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_group_id: Option<String>,

    /// Deprecated spelling of `target_group_id`
    #[serde(
        default,
        alias = "alb_target_group_arn",
        skip_serializing_if = "Option::is_none"
    )]
    pub legacy_target_group_id: Option<String>,
}

impl AttachmentSpec {
    /// Spec attaching a classic load balancer by name
    pub fn by_name(group_name: impl Into<String>, load_balancer_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            load_balancer_name: Some(load_balancer_name.into()),
            ..Default::default()
        }
    }

    /// Spec attaching a target group by ARN
    pub fn by_target_group(group_name: impl Into<String>, target_group_id: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            target_group_id: Some(target_group_id.into()),
            ..Default::default()
        }
    }

    /// Parse a spec from JSON
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a spec from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        Self::from_json(&content)
    }

    /// Select the attachment kind and value.
    ///
    /// Fails unless exactly one membership field is set and both the group
    /// name and the selected value are non-empty.
    pub fn resolve(&self) -> Result<ResolvedAttachment, ConfigError> {
        if self.group_name.trim().is_empty() {
            return Err(ConfigError::EmptyGroupName);
        }

        let set: Vec<(&'static str, &str)> = [
            ("load_balancer_name", self.load_balancer_name.as_deref()),
            ("target_group_id", self.target_group_id.as_deref()),
            ("legacy_target_group_id", self.legacy_target_group_id.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect();

        let (field, value) = match set.as_slice() {
            [] => return Err(ConfigError::MissingTarget),
            [(field, value)] => (*field, *value),
            many => {
                return Err(ConfigError::ConflictingTargets {
                    fields: many.iter().map(|(f, _)| *f).collect(),
                });
            }
        };

        if value.trim().is_empty() {
            return Err(ConfigError::EmptyValue { field });
        }

        let target = match field {
            "load_balancer_name" => AttachmentTarget::LoadBalancer(value.to_string()),
            "legacy_target_group_id" => {
                warn!(
                    group = %self.group_name,
                    target_group = %value,
                    "legacy_target_group_id is deprecated, use target_group_id instead"
                );
                AttachmentTarget::TargetGroup(value.to_string())
            }
            _ => AttachmentTarget::TargetGroup(value.to_string()),
        };

        Ok(ResolvedAttachment {
            group_name: self.group_name.clone(),
            target,
        })
    }
}

/// Timeouts and backoff for controller calls
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Budget for attach, including retries
    pub create_timeout: Duration,
    /// Budget for detach, including retries
    pub delete_timeout: Duration,
    /// Budget for a single group lookup
    pub read_timeout: Duration,
    /// First backoff delay after a transient capacity error
    pub initial_retry_delay: Duration,
    /// Backoff cap
    pub max_retry_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            create_timeout: defaults::default_create_timeout(),
            delete_timeout: defaults::default_delete_timeout(),
            read_timeout: defaults::default_read_timeout(),
            initial_retry_delay: defaults::DEFAULT_INITIAL_RETRY_DELAY,
            max_retry_delay: defaults::DEFAULT_MAX_RETRY_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_balancer_name_selects_by_name() {
        let resolved = AttachmentSpec::by_name("asg-1", "lb-a").resolve().unwrap();
        assert_eq!(resolved.kind(), Kind::ByName);
        assert_eq!(resolved.value(), "lb-a");
        assert_eq!(resolved.group_name, "asg-1");
    }

    #[test]
    fn both_target_group_spellings_select_target_group() {
        let current = AttachmentSpec::by_target_group("asg-1", "tg-123").resolve().unwrap();
        let legacy = AttachmentSpec {
            group_name: "asg-1".into(),
            legacy_target_group_id: Some("tg-123".into()),
            ..Default::default()
        }
        .resolve()
        .unwrap();

        assert_eq!(current.kind(), Kind::ByTargetGroupId);
        assert_eq!(current, legacy);
    }

    #[test]
    fn no_target_is_rejected() {
        let spec = AttachmentSpec {
            group_name: "asg-1".into(),
            ..Default::default()
        };
        assert!(matches!(spec.resolve(), Err(ConfigError::MissingTarget)));
    }

    #[test]
    fn two_targets_are_rejected() {
        let spec = AttachmentSpec {
            group_name: "asg-1".into(),
            load_balancer_name: Some("lb-a".into()),
            legacy_target_group_id: Some("tg-123".into()),
            ..Default::default()
        };
        match spec.resolve() {
            Err(ConfigError::ConflictingTargets { fields }) => {
                assert_eq!(fields, vec!["load_balancer_name", "legacy_target_group_id"]);
            }
            other => panic!("expected ConflictingTargets, got {other:?}"),
        }
    }

    #[test]
    fn empty_group_and_empty_value_are_rejected() {
        assert!(matches!(
            AttachmentSpec::by_name("", "lb-a").resolve(),
            Err(ConfigError::EmptyGroupName)
        ));
        assert!(matches!(
            AttachmentSpec::by_name("asg-1", " ").resolve(),
            Err(ConfigError::EmptyValue {
                field: "load_balancer_name"
            })
        ));
    }

    #[test]
    fn display_names_group_kind_and_value() {
        let resolved = AttachmentSpec::by_target_group("asg-1", "tg-123").resolve().unwrap();
        assert_eq!(
            resolved.to_string(),
            "Auto Scaling Group (asg-1) target group (tg-123)"
        );
    }

    #[test]
    fn parses_terraform_argument_names() {
        let spec = AttachmentSpec::from_json(
            r#"{"autoscaling_group_name": "asg-1", "lb_target_group_arn": "tg-123"}"#,
        )
        .unwrap();
        assert_eq!(spec, AttachmentSpec::by_target_group("asg-1", "tg-123"));

        let spec = AttachmentSpec::from_json(r#"{"group_name": "asg-1", "elb": "lb-a"}"#).unwrap();
        assert_eq!(spec.load_balancer_name.as_deref(), Some("lb-a"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = AttachmentSpec::from_json(r#"{"group_name": "asg-1", "lb": "x"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"group_name": "asg-1", "load_balancer_name": "lb-a"}}"#).unwrap();

        let spec = AttachmentSpec::load(file.path()).unwrap();
        assert_eq!(spec, AttachmentSpec::by_name("asg-1", "lb-a"));
    }

    #[test]
    fn load_missing_file_names_path() {
        let err = AttachmentSpec::load(Path::new("/nonexistent/spec.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/spec.json"));
    }

    fn field() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[a-z0-9-]{1,16}")
    }

    proptest! {
        #[test]
        fn resolve_succeeds_iff_exactly_one_field_is_set(
            lb in field(),
            tg in field(),
            legacy in field(),
        ) {
            let set = [&lb, &tg, &legacy].iter().filter(|v| v.is_some()).count();
            let spec = AttachmentSpec {
                group_name: "asg-1".into(),
                load_balancer_name: lb.clone(),
                target_group_id: tg.clone(),
                legacy_target_group_id: legacy.clone(),
            };

            match spec.resolve() {
                Ok(resolved) => {
                    prop_assert_eq!(set, 1);
                    let expected = if lb.is_some() { Kind::ByName } else { Kind::ByTargetGroupId };
                    prop_assert_eq!(resolved.kind(), expected);
                    let value = lb.or(tg).or(legacy).unwrap();
                    prop_assert_eq!(resolved.value(), value.as_str());
                }
                Err(ConfigError::MissingTarget) => prop_assert_eq!(set, 0),
                Err(ConfigError::ConflictingTargets { fields }) => {
                    prop_assert!(set > 1);
                    prop_assert_eq!(fields.len(), set);
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }
    }
}
