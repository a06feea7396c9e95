//! Default configuration values
//!
//! Shared between the CLI, the controller and the retry policy so that every
//! entry point reconciles with the same budgets.

use std::time::Duration;

/// Default budget for a create (attach) call, including retries (20 minutes)
pub const DEFAULT_CREATE_TIMEOUT_SECS: u64 = 1200;

/// Default budget for a delete (detach) call, including retries (20 minutes)
pub const DEFAULT_DELETE_TIMEOUT_SECS: u64 = 1200;

/// Default budget for a single group lookup (5 minutes)
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 300;

/// First delay between attempts after a transient capacity error
pub const DEFAULT_INITIAL_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Cap for the exponential backoff between attempts
pub const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Default AWS region when neither the CLI flag nor the environment provide one
pub const DEFAULT_REGION: &str = "us-east-2";

/// Returns the default create timeout
pub fn default_create_timeout() -> Duration {
    Duration::from_secs(DEFAULT_CREATE_TIMEOUT_SECS)
}

/// Returns the default delete timeout
pub fn default_delete_timeout() -> Duration {
    Duration::from_secs(DEFAULT_DELETE_TIMEOUT_SECS)
}

/// Returns the default read timeout
pub fn default_read_timeout() -> Duration {
    Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS)
}
