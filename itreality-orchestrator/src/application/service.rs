//! On-demand snapshot requests

use chrono::{DateTime, Utc};
use tracing::info;

use itreality_core::domain::{DomainName, Snapshot};

use super::workflow::{SnapshotWorkflow, WorkflowError};
use crate::domain::{EntitlementDenial, EntitlementPolicy, SnapshotRequester, SnapshotRun};

/// Why an on-demand request produced no snapshot
#[derive(Debug, thiserror::Error)]
pub enum SnapshotRequestError {
    /// The requester's plan does not allow this snapshot now
    #[error("Request denied: {0}")]
    Denied(#[from] EntitlementDenial),

    #[error("Snapshot pipeline error: {0}")]
    Pipeline(#[from] WorkflowError),
}

impl SnapshotRequestError {
    pub fn denial(&self) -> Option<&EntitlementDenial> {
        match self {
            Self::Denied(denial) => Some(denial),
            Self::Pipeline(_) => None,
        }
    }
}

pub struct SnapshotService {
    workflow: SnapshotWorkflow,
    policy: EntitlementPolicy,
}

impl SnapshotService {
    pub fn new(workflow: SnapshotWorkflow, policy: EntitlementPolicy) -> Self {
        Self { workflow, policy }
    }

    /// Apply the requester's entitlements at `now` without running anything
    pub async fn check_entitlement(
        &self,
        requester: &SnapshotRequester,
        domain: &DomainName,
        now: DateTime<Utc>,
    ) -> Result<(), SnapshotRequestError> {
        let history = self
            .workflow
            .store()
            .snapshots_by_owner(&requester.owner)
            .await
            .map_err(WorkflowError::from)?;
        self.policy
            .check(requester.tier, domain, &history, now)
            .map_err(SnapshotRequestError::from)
    }

    /// Check entitlements, then run the full snapshot pipeline.
    ///
    /// A run that fails inside the pipeline still returns the stored failed
    /// snapshot; `Err` means nothing was run or nothing could be stored.
    pub async fn request_snapshot(
        &self,
        requester: &SnapshotRequester,
        domain: &DomainName,
        contact_email: Option<&str>,
    ) -> Result<Snapshot, SnapshotRequestError> {
        if let Err(e) = self.check_entitlement(requester, domain, Utc::now()).await {
            if let Some(denial) = e.denial() {
                info!(%domain, owner = %requester.owner, tier = %requester.tier, %denial, "Snapshot request denied");
            }
            return Err(e);
        }

        let run = SnapshotRun::for_requester(
            domain.clone(),
            requester,
            contact_email.map(str::to_string),
        );
        Ok(self.workflow.execute(run).await?)
    }
}
