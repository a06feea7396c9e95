//! Auto Scaling group types

/// Membership view of an Auto Scaling group
///
/// Only the two lists relevant to attachments are kept; everything else the
/// service returns about the group is dropped at the client boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupState {
    /// Auto Scaling group name
    pub name: String,
    /// Classic load balancer names attached to the group
    pub load_balancer_names: Vec<String>,
    /// Target group ARNs attached to the group
    pub target_group_ids: Vec<String>,
}

impl GroupState {
    /// Create an empty group with no attachments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a classic load balancer name
    pub fn with_load_balancer(mut self, name: impl Into<String>) -> Self {
        self.load_balancer_names.push(name.into());
        self
    }

    /// Add a target group ARN
    pub fn with_target_group(mut self, id: impl Into<String>) -> Self {
        self.target_group_ids.push(id.into());
        self
    }
}
