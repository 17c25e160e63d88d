use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::moderation::error::{ActionOutcome, ModerationError};
use crate::moderation::identity::UserId;
use crate::moderation::pagination::{Listing, PageRequest};
use crate::moderation::store::RepositoryError;

use super::differ;
use super::domain::{
    PendingChanges, ProfileChanges, ProfileDiff, ProfileField, ResubmissionPolicy, ReviewDecision,
    ReviewMetrics, TeacherId, TeacherProfile,
};
use super::repository::{CommitOutcome, ProfileRepository};

/// A pending change-set rendered for the review console.
#[derive(Debug, Clone, Serialize)]
pub struct PendingProfileChange {
    pub teacher_id: TeacherId,
    pub name: String,
    pub revision: u64,
    pub submitted_at: DateTime<Utc>,
    pub submitted_by: UserId,
    pub diff: ProfileDiff,
}

impl PendingProfileChange {
    fn from_profile(profile: &TeacherProfile, pending: &PendingChanges) -> Self {
        Self {
            teacher_id: profile.id.clone(),
            name: profile.name.clone(),
            revision: pending.revision,
            submitted_at: pending.submitted_at,
            submitted_by: pending.submitted_by.clone(),
            diff: differ::diff(&profile.fields, &pending.changes),
        }
    }
}

/// Outcome of an administrator decision on a pending change-set.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileReview {
    pub profile: TeacherProfile,
    pub decision: ReviewDecision,
    pub outcome: ActionOutcome,
    /// Revision the decision applied to; `None` when nothing was pending.
    pub revision: Option<u64>,
    /// Fields whose authoritative value actually changed.
    pub changed_fields: Vec<ProfileField>,
    pub newer_submission_pending: bool,
}

/// Submission and review of teacher profile change requests.
pub struct ProfileChangeDesk<P> {
    repository: Arc<P>,
}

impl<P> ProfileChangeDesk<P>
where
    P: ProfileRepository,
{
    pub fn new(repository: Arc<P>) -> Self {
        Self { repository }
    }

    pub fn get(&self, id: &TeacherId) -> Result<TeacherProfile, ModerationError> {
        self.repository
            .fetch_profile(id)
            .map_err(|err| ModerationError::from_repository(err, "teacher", id.0.as_str()))?
            .ok_or_else(|| ModerationError::not_found("teacher", id.0.as_str()))
    }

    pub fn submit(
        &self,
        id: &TeacherId,
        changes: ProfileChanges,
        submitted_by: &UserId,
        policy: ResubmissionPolicy,
    ) -> Result<PendingChanges, ModerationError> {
        differ::validate(&changes)?;
        self.repository
            .store_pending_changes(id, changes, submitted_by, policy)
            .map_err(|err| match err {
                RepositoryError::Conflict(_) => ModerationError::ConflictingUniqueConstraint(
                    "a profile change request is already awaiting review".to_string(),
                ),
                other => ModerationError::from_repository(other, "teacher", id.0.as_str()),
            })
    }

    /// Diff of the currently pending change-set, if any.
    pub fn pending_diff(&self, id: &TeacherId) -> Result<Option<PendingProfileChange>, ModerationError> {
        let profile = self.get(id)?;
        Ok(profile
            .pending_changes
            .as_ref()
            .map(|pending| PendingProfileChange::from_profile(&profile, pending)))
    }

    pub fn list_pending(
        &self,
        request: PageRequest,
    ) -> Result<Listing<PendingProfileChange>, ModerationError> {
        let total = self.repository.count_pending_profiles()?;
        let slice = request.resolve(total);
        let items = self
            .repository
            .list_pending_profiles(slice.offset, slice.limit())?
            .iter()
            .filter_map(|profile| {
                profile
                    .pending_changes
                    .as_ref()
                    .map(|pending| PendingProfileChange::from_profile(profile, pending))
            })
            .collect();
        Ok(Listing { items, slice })
    }

    /// Decides the change-set pending at the time of the call. A newer submission that lands
    /// before the commit stays pending and is flagged on the result.
    pub fn review(
        &self,
        id: &TeacherId,
        decision: ReviewDecision,
    ) -> Result<ProfileReview, ModerationError> {
        let profile = self.get(id)?;
        let Some(reviewed) = profile.pending_changes.clone() else {
            debug!(teacher_id = %id, "no pending profile changes to review");
            return Ok(ProfileReview {
                profile,
                decision,
                outcome: ActionOutcome::AlreadyTerminal,
                revision: None,
                changed_fields: Vec::new(),
                newer_submission_pending: false,
            });
        };

        let changed_fields = match decision {
            ReviewDecision::Approve => {
                differ::diff(&profile.fields, &reviewed.changes).changed_fields()
            }
            ReviewDecision::Reject => Vec::new(),
        };

        let commit = self
            .repository
            .commit_profile_review(id, &reviewed, decision)
            .map_err(|err| ModerationError::from_repository(err, "teacher", id.0.as_str()))?;

        let (outcome, changed_fields) = match commit.outcome {
            CommitOutcome::Committed => (ActionOutcome::Applied, changed_fields),
            CommitOutcome::AlreadyDecided => (ActionOutcome::AlreadyTerminal, Vec::new()),
        };

        Ok(ProfileReview {
            profile: commit.profile,
            decision,
            outcome,
            revision: Some(reviewed.revision),
            changed_fields,
            newer_submission_pending: commit.newer_submission_pending,
        })
    }

    pub fn update_metrics(
        &self,
        id: &TeacherId,
        ratings: impl IntoIterator<Item = u8>,
    ) -> Result<TeacherProfile, ModerationError> {
        let metrics = ReviewMetrics::from_ratings(ratings);
        self.repository
            .update_metrics(id, metrics)
            .map_err(|err| ModerationError::from_repository(err, "teacher", id.0.as_str()))
    }

    pub fn count_pending(&self) -> Result<usize, ModerationError> {
        Ok(self.repository.count_pending_profiles()?)
    }
}
