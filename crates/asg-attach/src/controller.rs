//! Attachment lifecycle controller
//!
//! Create, read and delete for a relationship the service does not model as
//! an object. Create attaches and then reads back; read re-derives existence
//! from the group's membership lists; delete detaches and treats an already
//! absent attachment as success.

use crate::aws::{AttachmentApi, AwsError, GroupDirectory, is_transient_capacity_error};
use crate::config::{ControllerConfig, Kind, ResolvedAttachment};
use crate::error::{AttachmentError, Operation};
use crate::identity::AttachmentId;
use crate::oracle::{self, LookupError};
use crate::retry::{RetryConfig, RetryError, retry_transient};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Whether the caller has ever observed an attachment as existing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Just created and never observed; absence is a hard error
    New,
    /// Observed before; absence means it was removed out of band
    Existing,
}

/// Reconciles attachments against an Auto Scaling API
pub struct AttachmentController<C> {
    client: C,
    config: ControllerConfig,
    cancel: CancellationToken,
}

impl<C> AttachmentController<C>
where
    C: GroupDirectory + AttachmentApi,
{
    pub fn new(client: C) -> Self {
        Self {
            client,
            config: ControllerConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace timeouts and backoff
    pub fn with_config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Abort in-flight calls and retry sleeps when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    fn retry_config(&self, timeout: std::time::Duration) -> RetryConfig {
        RetryConfig {
            initial_delay: self.config.initial_retry_delay,
            max_delay: self.config.max_retry_delay,
            timeout,
        }
    }

    /// Attach the target and return a fresh identity.
    ///
    /// The read-back after attaching runs as [`Freshness::New`]; if it fails
    /// the returned error still carries the assigned identity.
    pub async fn create(
        &self,
        attachment: &ResolvedAttachment,
    ) -> Result<AttachmentId, AttachmentError> {
        info!(
            group = %attachment.group_name,
            kind = %attachment.kind(),
            value = %attachment.value(),
            "Attaching"
        );

        let client = &self.client;
        let group = attachment.group_name.as_str();
        let kind = attachment.kind();
        let values = [attachment.value().to_string()];
        let values: &[String] = &values;

        retry_transient(
            &self.retry_config(self.config.create_timeout),
            &self.cancel,
            "attach",
            is_transient_capacity_error,
            move || async move {
                match kind {
                    Kind::ByName => client.attach_load_balancers(group, values).await,
                    Kind::ByTargetGroupId => client.attach_target_groups(group, values).await,
                }
            },
        )
        .await
        .map_err(|e| lifecycle_error(Operation::Attach, attachment, e))?;

        let id = AttachmentId::generate(group);
        info!(id = %id, group = %group, kind = %kind, "Attached");

        match self.read(&id, attachment, Freshness::New).await {
            Ok(_) => Ok(id),
            Err(source) => Err(AttachmentError::Unverified {
                id,
                source: Box::new(source),
            }),
        }
    }

    /// Check whether the attachment still exists.
    ///
    /// Returns `Ok(false)` for a previously observed attachment that is gone
    /// (the caller should drop its identity); for [`Freshness::New`] the same
    /// condition is `AttachmentError::NotFound`.
    pub async fn read(
        &self,
        id: &AttachmentId,
        attachment: &ResolvedAttachment,
        freshness: Freshness,
    ) -> Result<bool, AttachmentError> {
        let start = Instant::now();
        let lookup = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(AttachmentError::Cancelled {
                    operation: Operation::Read,
                    attachment: attachment.clone(),
                    attempts: 1,
                });
            }
            _ = tokio::time::sleep(self.config.read_timeout) => {
                return Err(AttachmentError::Timeout {
                    operation: Operation::Read,
                    attachment: attachment.clone(),
                    elapsed: start.elapsed(),
                    attempts: 1,
                    last: None,
                });
            }
            lookup = oracle::exists(&self.client, &attachment.group_name, &attachment.target) => lookup,
        };

        match lookup {
            Ok(present) => {
                debug!(id = %id, group = %attachment.group_name, "Attachment present");
                Ok(present)
            }
            Err(LookupError::NotFound(missing)) => match freshness {
                Freshness::Existing => {
                    warn!(
                        id = %id,
                        group = %attachment.group_name,
                        kind = %attachment.kind(),
                        value = %attachment.value(),
                        missing = %missing,
                        "Auto Scaling Group attachment not found, removing from state"
                    );
                    Ok(false)
                }
                Freshness::New => Err(AttachmentError::NotFound {
                    attachment: attachment.clone(),
                    missing,
                }),
            },
            Err(LookupError::Api(source)) => Err(AttachmentError::ReadFailed {
                attachment: attachment.clone(),
                source,
            }),
        }
    }

    /// Detach the target. Succeeds if it is already detached.
    pub async fn delete(
        &self,
        id: &AttachmentId,
        attachment: &ResolvedAttachment,
    ) -> Result<(), AttachmentError> {
        info!(
            id = %id,
            group = %attachment.group_name,
            kind = %attachment.kind(),
            value = %attachment.value(),
            "Detaching"
        );

        let client = &self.client;
        let group = attachment.group_name.as_str();
        let kind = attachment.kind();
        let values = [attachment.value().to_string()];
        let values: &[String] = &values;

        let result = retry_transient(
            &self.retry_config(self.config.delete_timeout),
            &self.cancel,
            "detach",
            is_transient_capacity_error,
            move || async move {
                match kind {
                    Kind::ByName => client.detach_load_balancers(group, values).await,
                    Kind::ByTargetGroupId => client.detach_target_groups(group, values).await,
                }
            },
        )
        .await;

        match result {
            Ok(()) => {
                info!(id = %id, group = %group, kind = %kind, "Detached");
                Ok(())
            }
            Err(RetryError::Failed(e)) if e.is_not_found() => {
                debug!(id = %id, group = %group, error = %e, "Attachment already detached");
                Ok(())
            }
            Err(e) => Err(lifecycle_error(Operation::Detach, attachment, e)),
        }
    }
}

fn lifecycle_error(
    operation: Operation,
    attachment: &ResolvedAttachment,
    error: RetryError<AwsError>,
) -> AttachmentError {
    let attachment = attachment.clone();
    match error {
        RetryError::Timeout {
            elapsed,
            attempts,
            last,
        } => AttachmentError::Timeout {
            operation,
            attachment,
            elapsed,
            attempts,
            last,
        },
        RetryError::Cancelled { attempts } => AttachmentError::Cancelled {
            operation,
            attachment,
            attempts,
        },
        RetryError::Failed(source) => match operation {
            Operation::Attach => AttachmentError::AttachmentFailed { attachment, source },
            Operation::Detach => AttachmentError::DetachmentFailed { attachment, source },
            Operation::Read => AttachmentError::ReadFailed { attachment, source },
        },
    }
}
