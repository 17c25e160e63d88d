use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::moderation::error::{Decision, ModerationError, ValidationError};
use crate::moderation::identity::UserId;
use crate::moderation::pagination::{Listing, PageRequest};
use crate::moderation::profiles::{differ, ProfileChangeDesk, ProfileRepository, TeacherProfile};

use super::domain::{
    NewVerification, VerificationEvidence, VerificationId, VerificationRequest, VerificationStatus,
    VerificationVerdict,
};
use super::repository::VerificationRepository;

/// Approval of a request, with the profile it updated for teacher evidence.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationApproval {
    #[serde(flatten)]
    pub decision: Decision<VerificationRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<TeacherProfile>,
}

/// submitted → approved | rejected; both terminal.
pub struct VerificationTracker<S> {
    store: Arc<S>,
    profiles: ProfileChangeDesk<S>,
}

impl<S> VerificationTracker<S>
where
    S: VerificationRepository + ProfileRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        let profiles = ProfileChangeDesk::new(Arc::clone(&store));
        Self { store, profiles }
    }

    /// Files a new request. A rejected user re-submits through here too, which keeps the
    /// rejected request as history.
    pub fn submit(
        &self,
        user: &UserId,
        evidence: VerificationEvidence,
    ) -> Result<VerificationRequest, ModerationError> {
        evidence.validate()?;
        if let VerificationEvidence::TeacherProfile { teacher_id, .. } = &evidence {
            self.profiles.get(teacher_id)?;
        }

        let request = NewVerification {
            user: user.clone(),
            evidence,
            submitted_at: Utc::now(),
        };
        Ok(self.store.insert_verification(request)?)
    }

    pub fn get(&self, id: &VerificationId) -> Result<VerificationRequest, ModerationError> {
        self.store
            .fetch_verification(id)?
            .ok_or_else(|| ModerationError::not_found("verification request", id.0.as_str()))
    }

    /// Approves a submitted request. Teacher evidence is merged into the profile by the same
    /// storage step that flips the status; a request rejected in the meantime leaves the
    /// profile untouched.
    pub fn approve(
        &self,
        id: &VerificationId,
        reviewer: &UserId,
    ) -> Result<VerificationApproval, ModerationError> {
        let request = self.get(id)?;
        if request.status.is_terminal() {
            return Ok(VerificationApproval {
                decision: Decision::unchanged(request),
                profile: None,
            });
        }

        let verdict = VerificationVerdict {
            status: VerificationStatus::Approved,
            reviewer: reviewer.clone(),
            reviewed_at: Utc::now(),
            rejection_reason: None,
        };

        match &request.evidence {
            VerificationEvidence::TeacherProfile {
                teacher_id,
                changes,
            } => {
                differ::validate(changes)?;
                let approved = self
                    .store
                    .approve_profile_verification(id, verdict, teacher_id, changes)
                    .map_err(|err| {
                        ModerationError::from_repository(err, "teacher", teacher_id.0.as_str())
                    })?
                    .ok_or_else(|| {
                        ModerationError::not_found("verification request", id.0.as_str())
                    })?;
                let decision = if approved.request.applied {
                    Decision::applied(approved.request.record)
                } else {
                    Decision::unchanged(approved.request.record)
                };
                Ok(VerificationApproval {
                    decision,
                    profile: approved.profile,
                })
            }
            VerificationEvidence::Student { .. } => Ok(VerificationApproval {
                decision: self.decide(id, verdict)?,
                profile: None,
            }),
        }
    }

    /// Rejects a submitted request. The reason is required and stored trimmed.
    pub fn reject(
        &self,
        id: &VerificationId,
        reviewer: &UserId,
        reason: &str,
    ) -> Result<Decision<VerificationRequest>, ModerationError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::MissingReason.into());
        }

        let verdict = VerificationVerdict {
            status: VerificationStatus::Rejected,
            reviewer: reviewer.clone(),
            reviewed_at: Utc::now(),
            rejection_reason: Some(reason.to_string()),
        };
        self.decide(id, verdict)
    }

    pub fn list(
        &self,
        status: Option<VerificationStatus>,
        request: PageRequest,
    ) -> Result<Listing<VerificationRequest>, ModerationError> {
        let total = self.store.count_verifications(status)?;
        let slice = request.resolve(total);
        let items = self
            .store
            .list_verifications(status, slice.offset, slice.limit())?;
        Ok(Listing { items, slice })
    }

    pub fn count(&self, status: Option<VerificationStatus>) -> Result<usize, ModerationError> {
        Ok(self.store.count_verifications(status)?)
    }

    fn decide(
        &self,
        id: &VerificationId,
        verdict: VerificationVerdict,
    ) -> Result<Decision<VerificationRequest>, ModerationError> {
        let transitioned = self
            .store
            .decide_verification(id, verdict)
            .map_err(|err| {
                ModerationError::from_repository(err, "verification request", id.0.as_str())
            })?
            .ok_or_else(|| ModerationError::not_found("verification request", id.0.as_str()))?;

        Ok(if transitioned.applied {
            Decision::applied(transitioned.record)
        } else {
            Decision::unchanged(transitioned.record)
        })
    }
}
