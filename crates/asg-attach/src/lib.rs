//! asg-attach - Auto Scaling group load balancer attachments
//!
//! Treats "target X is attached to group G" as a resource with create, read
//! and delete, even though Auto Scaling only offers imperative attach and
//! detach calls. Existence is always re-derived from the group's membership
//! lists; the identity handed back after create is purely local.
//!
//! ## Modules
//!
//! - [`config`]: attachment spec and mode selection
//! - [`controller`]: create / read / delete lifecycle
//! - [`oracle`]: membership existence checks
//! - [`retry`]: deadline-bounded retries for transient capacity errors
//! - [`resource`] / [`state`]: caller-side identity tracking
//! - [`aws`]: Auto Scaling client and error classification

pub mod aws;
pub mod config;
pub mod controller;
pub mod defaults;
pub mod error;
pub mod identity;
pub mod oracle;
pub mod resource;
pub mod retry;
pub mod state;

pub use config::{AttachmentSpec, AttachmentTarget, ControllerConfig, Kind, ResolvedAttachment};
pub use controller::{AttachmentController, Freshness};
pub use error::{AttachmentError, ConfigError, Operation};
pub use identity::AttachmentId;
pub use oracle::{LookupError, Missing};
pub use resource::{ApplyOutcome, ManagedAttachment};
pub use state::{AttachmentState, StateFile};
