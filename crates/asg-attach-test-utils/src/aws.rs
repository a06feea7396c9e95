//! AWS test utilities
//!
//! Live tests need an existing Auto Scaling group plus something to attach to
//! it; both are taken from the environment so no account state is created.

use chrono::Utc;

/// Get the AWS region for tests.
///
/// Checks environment variables in order:
/// 1. AWS_REGION
/// 2. AWS_DEFAULT_REGION
/// 3. Falls back to us-east-2
pub fn get_test_region() -> String {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|_| "us-east-2".to_string())
}

/// Auto Scaling group used by live tests (`ASG_ATTACH_TEST_GROUP`)
pub fn test_group_name() -> Option<String> {
    std::env::var("ASG_ATTACH_TEST_GROUP").ok()
}

/// Target group ARN used by live tests (`ASG_ATTACH_TEST_TARGET_GROUP`)
pub fn test_target_group_arn() -> Option<String> {
    std::env::var("ASG_ATTACH_TEST_TARGET_GROUP").ok()
}

/// Generate a unique run ID.
///
/// Format: `test-{timestamp_ms}-{counter}`, unique even when tests start
/// simultaneously. Used for group names that must not exist.
pub fn test_run_id() -> String {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let ts = Utc::now().timestamp_millis();
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("test-{}-{}", ts, counter)
}
