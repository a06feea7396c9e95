//! In-memory Auto Scaling service
//!
//! Behaves like the real API where the controller can tell the difference:
//! attaching is idempotent, mutating or describing a missing group fails with
//! a `ValidationError` that classifies as not-found, and detaching a value
//! that is not a member is a no-op. Failures, drift and hangs can be injected.

use asg_attach::aws::{AttachmentApi, AwsError, GroupDirectory, GroupState, classify_aws_error};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// A call the fake received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Describe(String),
    AttachLoadBalancers(String, Vec<String>),
    DetachLoadBalancers(String, Vec<String>),
    AttachTargetGroups(String, Vec<String>),
    DetachTargetGroups(String, Vec<String>),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Call::Describe(_))
    }
}

/// The "too many membership updates" rejection
pub fn transient_capacity_error() -> AwsError {
    classify_aws_error(
        Some("ValidationError"),
        Some("Trying to update too many Load Balancers/Target Groups at once. The limit is 10"),
    )
}

/// What the service returns when a group does not exist
pub fn group_not_found_error(group_name: &str) -> AwsError {
    classify_aws_error(
        Some("ValidationError"),
        Some(&format!(
            "AutoScalingGroup name not found - AutoScalingGroup '{group_name}' not found"
        )),
    )
}

#[derive(Default)]
struct Inner {
    groups: HashMap<String, GroupState>,
    mutation_failures: VecDeque<AwsError>,
    describe_failures: VecDeque<AwsError>,
    calls: Vec<Call>,
    ignore_attaches: bool,
    hang: bool,
}

/// Fake Auto Scaling API backed by a map of groups
#[derive(Default)]
pub struct FakeAutoScaling {
    inner: Mutex<Inner>,
}

impl FakeAutoScaling {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fake with one empty group
    pub fn with_group(group_name: &str) -> Self {
        let fake = Self::new();
        fake.add_group(GroupState::new(group_name));
        fake
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_group(&self, group: GroupState) {
        self.lock().groups.insert(group.name.clone(), group);
    }

    pub fn remove_group(&self, group_name: &str) {
        self.lock().groups.remove(group_name);
    }

    pub fn group(&self, group_name: &str) -> Option<GroupState> {
        self.lock().groups.get(group_name).cloned()
    }

    /// Remove a value from both membership lists, as an out-of-band detach would
    pub fn detach_out_of_band(&self, group_name: &str, value: &str) {
        if let Some(group) = self.lock().groups.get_mut(group_name) {
            group.load_balancer_names.retain(|v| v != value);
            group.target_group_ids.retain(|v| v != value);
        }
    }

    /// Fail the next mutating call with `error`; queued errors are used in order
    pub fn fail_next_mutation(&self, error: AwsError) {
        self.lock().mutation_failures.push_back(error);
    }

    /// Fail the next `count` mutating calls with the transient capacity error
    pub fn fail_transiently(&self, count: usize) {
        let mut inner = self.lock();
        for _ in 0..count {
            inner.mutation_failures.push_back(transient_capacity_error());
        }
    }

    /// Fail the next describe call with `error`
    pub fn fail_next_describe(&self, error: AwsError) {
        self.lock().describe_failures.push_back(error);
    }

    /// Accept attach calls without recording the membership
    pub fn ignore_attaches(&self, ignore: bool) {
        self.lock().ignore_attaches = ignore;
    }

    /// Make every subsequent call wait forever
    pub fn hang(&self, hang: bool) {
        self.lock().hang = hang;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn mutation_calls(&self) -> Vec<Call> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    /// Record `call` and decide its outcome without holding the lock across an await
    async fn begin(&self, call: Call) -> Result<(), AwsError> {
        let hang = {
            let mut inner = self.lock();
            inner.calls.push(call);
            inner.hang
        };
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn mutate(
        &self,
        call: Call,
        group_name: &str,
        apply: impl FnOnce(&mut GroupState, bool),
    ) -> Result<(), AwsError> {
        self.begin(call).await?;

        let mut inner = self.lock();
        if let Some(error) = inner.mutation_failures.pop_front() {
            return Err(error);
        }
        let ignore_attaches = inner.ignore_attaches;
        match inner.groups.get_mut(group_name) {
            Some(group) => {
                apply(group, ignore_attaches);
                Ok(())
            }
            None => Err(group_not_found_error(group_name)),
        }
    }
}

fn add_all(list: &mut Vec<String>, values: &[String]) {
    for value in values {
        if !list.contains(value) {
            list.push(value.clone());
        }
    }
}

fn remove_all(list: &mut Vec<String>, values: &[String]) {
    list.retain(|v| !values.contains(v));
}

impl GroupDirectory for FakeAutoScaling {
    async fn describe_group(&self, group_name: &str) -> Result<GroupState, AwsError> {
        self.begin(Call::Describe(group_name.to_string())).await?;

        let mut inner = self.lock();
        if let Some(error) = inner.describe_failures.pop_front() {
            return Err(error);
        }
        inner
            .groups
            .get(group_name)
            .cloned()
            .ok_or_else(|| AwsError::group_not_found(group_name))
    }
}

impl AttachmentApi for FakeAutoScaling {
    async fn attach_load_balancers(
        &self,
        group_name: &str,
        load_balancer_names: &[String],
    ) -> Result<(), AwsError> {
        let call = Call::AttachLoadBalancers(group_name.to_string(), load_balancer_names.to_vec());
        self.mutate(call, group_name, |group, ignore| {
            if !ignore {
                add_all(&mut group.load_balancer_names, load_balancer_names);
            }
        })
        .await
    }

    async fn detach_load_balancers(
        &self,
        group_name: &str,
        load_balancer_names: &[String],
    ) -> Result<(), AwsError> {
        let call = Call::DetachLoadBalancers(group_name.to_string(), load_balancer_names.to_vec());
        self.mutate(call, group_name, |group, _| {
            remove_all(&mut group.load_balancer_names, load_balancer_names);
        })
        .await
    }

    async fn attach_target_groups(
        &self,
        group_name: &str,
        target_group_ids: &[String],
    ) -> Result<(), AwsError> {
        let call = Call::AttachTargetGroups(group_name.to_string(), target_group_ids.to_vec());
        self.mutate(call, group_name, |group, ignore| {
            if !ignore {
                add_all(&mut group.target_group_ids, target_group_ids);
            }
        })
        .await
    }

    async fn detach_target_groups(
        &self,
        group_name: &str,
        target_group_ids: &[String],
    ) -> Result<(), AwsError> {
        let call = Call::DetachTargetGroups(group_name.to_string(), target_group_ids.to_vec());
        self.mutate(call, group_name, |group, _| {
            remove_all(&mut group.target_group_ids, target_group_ids);
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_errors_classify_like_the_service() {
        assert!(asg_attach::aws::is_transient_capacity_error(
            &transient_capacity_error()
        ));
        assert!(group_not_found_error("asg-1").is_not_found());
    }

    #[test]
    fn out_of_band_detach_clears_both_lists() {
        let fake = FakeAutoScaling::new();
        fake.add_group(
            GroupState::new("asg-1")
                .with_load_balancer("x")
                .with_target_group("x"),
        );
        fake.detach_out_of_band("asg-1", "x");
        assert_eq!(fake.group("asg-1"), Some(GroupState::new("asg-1")));
    }
}
