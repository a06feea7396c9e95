//! Auto Scaling client

use super::context::AwsContext;
use super::error::{AwsError, classify_sdk_error};
use super::operations::{AttachmentApi, GroupDirectory};
use super::types::GroupState;
use aws_sdk_autoscaling::Client;
use tracing::debug;

/// Auto Scaling client for group lookups and load balancer attachments
pub struct AutoScalingClient {
    pub(crate) client: Client,
}

impl AutoScalingClient {
    /// Create a new Auto Scaling client (loads AWS config from environment)
    pub async fn new(region: &str) -> Self {
        let ctx = AwsContext::new(region).await;
        Self::from_context(&ctx)
    }

    /// Create an Auto Scaling client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.autoscaling_client(),
        }
    }

    /// Describe a single group by name.
    ///
    /// `DescribeAutoScalingGroups` answers an unknown name with an empty list
    /// rather than an error, so absence is mapped to `AwsError::NotFound` here.
    pub async fn describe_group(&self, group_name: &str) -> Result<GroupState, AwsError> {
        let response = self
            .client
            .describe_auto_scaling_groups()
            .auto_scaling_group_names(group_name)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        let group = response
            .auto_scaling_groups()
            .first()
            .ok_or_else(|| AwsError::group_not_found(group_name))?;

        let state = GroupState {
            name: group_name.to_string(),
            load_balancer_names: group.load_balancer_names().to_vec(),
            target_group_ids: group.target_group_arns().to_vec(),
        };

        debug!(
            group = %group_name,
            load_balancers = state.load_balancer_names.len(),
            target_groups = state.target_group_ids.len(),
            "Described Auto Scaling group"
        );

        Ok(state)
    }

    /// Attach classic load balancers to a group
    pub async fn attach_load_balancers(
        &self,
        group_name: &str,
        load_balancer_names: &[String],
    ) -> Result<(), AwsError> {
        debug!(group = %group_name, names = ?load_balancer_names, "AttachLoadBalancers");
        self.client
            .attach_load_balancers()
            .auto_scaling_group_name(group_name)
            .set_load_balancer_names(Some(load_balancer_names.to_vec()))
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;
        Ok(())
    }

    /// Detach classic load balancers from a group
    pub async fn detach_load_balancers(
        &self,
        group_name: &str,
        load_balancer_names: &[String],
    ) -> Result<(), AwsError> {
        debug!(group = %group_name, names = ?load_balancer_names, "DetachLoadBalancers");
        self.client
            .detach_load_balancers()
            .auto_scaling_group_name(group_name)
            .set_load_balancer_names(Some(load_balancer_names.to_vec()))
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;
        Ok(())
    }

    /// Attach target groups to a group
    pub async fn attach_target_groups(
        &self,
        group_name: &str,
        target_group_ids: &[String],
    ) -> Result<(), AwsError> {
        debug!(group = %group_name, arns = ?target_group_ids, "AttachLoadBalancerTargetGroups");
        self.client
            .attach_load_balancer_target_groups()
            .auto_scaling_group_name(group_name)
            .set_target_group_arns(Some(target_group_ids.to_vec()))
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;
        Ok(())
    }

    /// Detach target groups from a group
    pub async fn detach_target_groups(
        &self,
        group_name: &str,
        target_group_ids: &[String],
    ) -> Result<(), AwsError> {
        debug!(group = %group_name, arns = ?target_group_ids, "DetachLoadBalancerTargetGroups");
        self.client
            .detach_load_balancer_target_groups()
            .auto_scaling_group_name(group_name)
            .set_target_group_arns(Some(target_group_ids.to_vec()))
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;
        Ok(())
    }
}

impl GroupDirectory for AutoScalingClient {
    async fn describe_group(&self, group_name: &str) -> Result<GroupState, AwsError> {
        AutoScalingClient::describe_group(self, group_name).await
    }
}

impl AttachmentApi for AutoScalingClient {
    async fn attach_load_balancers(
        &self,
        group_name: &str,
        load_balancer_names: &[String],
    ) -> Result<(), AwsError> {
        AutoScalingClient::attach_load_balancers(self, group_name, load_balancer_names).await
    }

    async fn detach_load_balancers(
        &self,
        group_name: &str,
        load_balancer_names: &[String],
    ) -> Result<(), AwsError> {
        AutoScalingClient::detach_load_balancers(self, group_name, load_balancer_names).await
    }

    async fn attach_target_groups(
        &self,
        group_name: &str,
        target_group_ids: &[String],
    ) -> Result<(), AwsError> {
        AutoScalingClient::attach_target_groups(self, group_name, target_group_ids).await
    }

    async fn detach_target_groups(
        &self,
        group_name: &str,
        target_group_ids: &[String],
    ) -> Result<(), AwsError> {
        AutoScalingClient::detach_target_groups(self, group_name, target_group_ids).await
    }
}
