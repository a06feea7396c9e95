//! Auto Scaling operation traits
//!
//! The controller is generic over these so that lifecycle logic can be
//! exercised against an in-memory fake instead of a live account.

use super::error::AwsError;
use super::types::GroupState;

/// Read access to Auto Scaling group state.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
pub trait GroupDirectory: Send + Sync {
    /// Fetch the current state of a group.
    ///
    /// Returns `AwsError::NotFound` when the group does not exist.
    async fn describe_group(&self, group_name: &str) -> Result<GroupState, AwsError>;
}

/// Imperative membership mutations on an Auto Scaling group.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
pub trait AttachmentApi: Send + Sync {
    /// Attach classic load balancers by name
    async fn attach_load_balancers(
        &self,
        group_name: &str,
        load_balancer_names: &[String],
    ) -> Result<(), AwsError>;

    /// Detach classic load balancers by name
    async fn detach_load_balancers(
        &self,
        group_name: &str,
        load_balancer_names: &[String],
    ) -> Result<(), AwsError>;

    /// Attach target groups by ARN
    async fn attach_target_groups(
        &self,
        group_name: &str,
        target_group_ids: &[String],
    ) -> Result<(), AwsError>;

    /// Detach target groups by ARN
    async fn detach_target_groups(
        &self,
        group_name: &str,
        target_group_ids: &[String],
    ) -> Result<(), AwsError>;
}
