//! AWS boundary for the attachment controller
//!
//! - context: SDK configuration loading (region, profile)
//! - autoscaling: Auto Scaling client implementing the operation traits
//! - operations: `GroupDirectory` / `AttachmentApi` traits the controller consumes
//! - error: classification of SDK errors, including the transient capacity predicate

pub mod autoscaling;
pub mod context;
pub mod error;
pub mod operations;
pub mod types;

pub use autoscaling::AutoScalingClient;
pub use context::AwsContext;
pub use error::{AwsError, classify_aws_error, classify_sdk_error, is_transient_capacity_error};
pub use operations::{AttachmentApi, GroupDirectory};
pub use types::GroupState;
