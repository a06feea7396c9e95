//! Shared test utilities for asg-attach
//!
//! ## Modules
//!
//! - [`aws`]: AWS region detection and live-test fixtures read from the environment
//! - [`fake`]: in-memory Auto Scaling service implementing the operation traits

pub mod aws;
pub mod fake;

// Re-export commonly used items
pub use aws::{get_test_region, test_run_id};
pub use fake::{Call, FakeAutoScaling, group_not_found_error, transient_capacity_error};
