use std::sync::Arc;

use rasoi_core::{DraftFields, OnboardingStep, RemoteSession, now_millis};
use rasoi_db::RasoiDb;
use rasoi_remote::SessionApi;

use crate::error::Result;

/// Outcome of the best-effort push to the remote session mirror. By the
/// time this is produced the local draft is already saved; callers decide
/// what, if anything, to do about a failed push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Synced,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SaveResult {
    pub draft: DraftFields,
    pub remote: PushOutcome,
}

/// Local-first save pipeline for the onboarding wizard: the local draft is
/// the source of truth, the remote session is a broadcast for the approval
/// pipeline to observe.
pub struct DraftReconciler<S> {
    db: Arc<RasoiDb>,
    sessions: Arc<S>,
}

impl<S: SessionApi> DraftReconciler<S> {
    pub fn new(db: Arc<RasoiDb>, sessions: Arc<S>) -> Self {
        Self { db, sessions }
    }

    /// One screen's save: overlay the newly entered fields on the stored
    /// draft, persist locally, then push the merged draft to the remote
    /// mirror. A failed push never blocks the flow; it is reported in the
    /// returned `SaveResult` and otherwise ignored.
    pub async fn merge_and_persist(&self, partial: DraftFields) -> Result<SaveResult> {
        partial.validate()?;

        let current = match self.db.load_draft().await {
            Ok(draft) => draft,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read local draft, treating it as empty");
                DraftFields::default()
            }
        };

        let next = current.merged_with(&partial);
        self.db.save_draft(&next).await?;

        let remote = self.push(&next).await;
        Ok(SaveResult { draft: next, remote })
    }

    async fn push(&self, draft: &DraftFields) -> PushOutcome {
        let Some(phone) = draft.phone.clone() else {
            tracing::debug!("Draft has no phone number yet, skipping remote push");
            return PushOutcome::Failed("draft has no phone number".into());
        };

        let session = RemoteSession {
            phone: phone.clone(),
            fields: draft.clone(),
            updated_at: now_millis(),
        };

        match self.sessions.update_session(session).await {
            Ok(()) => {
                tracing::debug!(phone = %phone, "Draft pushed to remote session");
                PushOutcome::Synced
            }
            Err(e) => {
                tracing::warn!(
                    phone = %phone,
                    error = %e,
                    "Remote session push failed, continuing with local draft"
                );
                PushOutcome::Failed(e.to_string())
            }
        }
    }

    /// Draft to resume the wizard from: the local copy when one exists,
    /// otherwise whatever the remote mirror has for this phone. Remote
    /// lookup failures degrade to an empty draft, never an error screen.
    pub async fn resume(&self, phone: &str) -> Result<DraftFields> {
        let local = match self.db.load_draft().await {
            Ok(draft) => draft,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read local draft, treating it as empty");
                DraftFields::default()
            }
        };
        if !local.is_empty() {
            return Ok(local);
        }

        match self.sessions.get_session(phone).await {
            Ok(Some(session)) => {
                self.db.save_draft(&session.fields).await?;
                tracing::info!(phone = %phone, "Resumed onboarding draft from remote session");
                Ok(session.fields)
            }
            Ok(None) => Ok(DraftFields::default()),
            Err(e) => {
                tracing::warn!(error = %e, "Remote session lookup failed, starting fresh");
                Ok(DraftFields::default())
            }
        }
    }

    /// Final submission: stamp the draft as submitted and push it. The
    /// local copy is cleared only once the mirror has it; on a failed push
    /// it is kept so the partner can retry without re-entering anything.
    pub async fn finish(&self) -> Result<PushOutcome> {
        let stamp = DraftFields {
            step: Some(OnboardingStep::Submitted),
            ..DraftFields::default()
        };
        let draft = self.db.load_draft().await?.merged_with(&stamp);
        self.db.save_draft(&draft).await?;

        let outcome = self.push(&draft).await;
        if outcome == PushOutcome::Synced {
            self.db.clear_draft().await?;
            tracing::info!("Onboarding submitted, local draft cleared");
        }
        Ok(outcome)
    }

    pub async fn clear(&self) -> Result<()> {
        Ok(self.db.clear_draft().await?)
    }
}
