//! Caller-side attachment management
//!
//! [`ManagedAttachment`] owns the recorded [`AttachmentState`] and drives the
//! controller the way a resource framework would. It keeps the identity in
//! sync with what reads observe and replaces the attachment when the declared
//! spec changes, since every field of an attachment is immutable.

use crate::aws::{AttachmentApi, GroupDirectory};
use crate::config::AttachmentSpec;
use crate::controller::{AttachmentController, Freshness};
use crate::error::AttachmentError;
use crate::identity::AttachmentId;
use crate::state::AttachmentState;
use tracing::info;

/// What `apply` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// No prior state; attached
    Created(AttachmentId),
    /// Prior state matched and the attachment still exists
    Unchanged(AttachmentId),
    /// Prior state matched but the attachment had disappeared; attached again
    Recreated(AttachmentId),
    /// The spec changed or the prior attachment was tainted; detached the old
    /// one and attached the new one
    Replaced {
        old: AttachmentId,
        new: AttachmentId,
    },
}

impl ApplyOutcome {
    /// Identity of the attachment now in effect
    pub fn id(&self) -> &AttachmentId {
        match self {
            ApplyOutcome::Created(id)
            | ApplyOutcome::Unchanged(id)
            | ApplyOutcome::Recreated(id)
            | ApplyOutcome::Replaced { new: id, .. } => id,
        }
    }
}

/// An attachment tracked across invocations
pub struct ManagedAttachment<'a, C> {
    controller: &'a AttachmentController<C>,
    state: Option<AttachmentState>,
}

impl<'a, C> ManagedAttachment<'a, C>
where
    C: GroupDirectory + AttachmentApi,
{
    pub fn new(controller: &'a AttachmentController<C>, state: Option<AttachmentState>) -> Self {
        Self { controller, state }
    }

    pub fn state(&self) -> Option<&AttachmentState> {
        self.state.as_ref()
    }

    pub fn into_state(self) -> Option<AttachmentState> {
        self.state
    }

    /// Converge on `spec`.
    pub async fn apply(&mut self, spec: &AttachmentSpec) -> Result<ApplyOutcome, AttachmentError> {
        let desired = spec.resolve()?;

        let Some(prior) = self.state.clone() else {
            return self.create(spec).await.map(ApplyOutcome::Created);
        };

        let prior_attachment = prior.spec.resolve()?;
        if prior_attachment == desired && !prior.tainted {
            if self.refresh().await? {
                return Ok(ApplyOutcome::Unchanged(prior.id));
            }
            return self.create(spec).await.map(ApplyOutcome::Recreated);
        }

        info!(
            old = %prior_attachment,
            new = %desired,
            tainted = prior.tainted,
            "Replacing attachment"
        );
        self.controller.delete(&prior.id, &prior_attachment).await?;
        self.state = None;

        let new = self.create(spec).await?;
        Ok(ApplyOutcome::Replaced { old: prior.id, new })
    }

    /// Re-read the recorded attachment, forgetting it if it is gone.
    ///
    /// Returns whether an attachment is still recorded.
    pub async fn refresh(&mut self) -> Result<bool, AttachmentError> {
        let Some(state) = &self.state else {
            return Ok(false);
        };

        let attachment = state.spec.resolve()?;
        let present = self
            .controller
            .read(&state.id, &attachment, Freshness::Existing)
            .await?;

        if !present {
            self.state = None;
        }
        Ok(present)
    }

    /// Detach the recorded attachment and forget it.
    ///
    /// Returns the identity that was removed, `None` if nothing was recorded.
    pub async fn destroy(&mut self) -> Result<Option<AttachmentId>, AttachmentError> {
        let Some(state) = &self.state else {
            return Ok(None);
        };

        let attachment = state.spec.resolve()?;
        self.controller.delete(&state.id, &attachment).await?;
        Ok(self.state.take().map(|s| s.id))
    }

    async fn create(&mut self, spec: &AttachmentSpec) -> Result<AttachmentId, AttachmentError> {
        let attachment = spec.resolve()?;
        match self.controller.create(&attachment).await {
            Ok(id) => {
                self.state = Some(AttachmentState::new(id.clone(), spec.clone()));
                Ok(id)
            }
            Err(AttachmentError::Unverified { id, source }) => {
                self.state = Some(AttachmentState::new(id.clone(), spec.clone()).tainted());
                Err(AttachmentError::Unverified { id, source })
            }
            Err(e) => Err(e),
        }
    }
}
