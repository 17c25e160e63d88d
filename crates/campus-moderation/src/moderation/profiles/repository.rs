use serde::Serialize;

use crate::moderation::identity::UserId;
use crate::moderation::store::RepositoryError;

use super::domain::{
    PendingChanges, ProfileChanges, ResubmissionPolicy, ReviewDecision, ReviewMetrics, TeacherId,
    TeacherProfile,
};

/// How an atomic profile review landed in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitOutcome {
    Committed,
    /// The reviewed revision had already been decided by someone else.
    AlreadyDecided,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileCommit {
    pub profile: TeacherProfile,
    pub outcome: CommitOutcome,
    /// A submission newer than the reviewed one arrived and is still pending.
    pub newer_submission_pending: bool,
}

/// Storage abstraction for teacher profiles and their pending change-sets.
pub trait ProfileRepository: Send + Sync {
    fn fetch_profile(&self, id: &TeacherId) -> Result<Option<TeacherProfile>, RepositoryError>;

    fn insert_profile(&self, profile: TeacherProfile) -> Result<TeacherProfile, RepositoryError>;

    /// Stamps `changes` with the next revision and stores them as pending. Under
    /// `RejectWhilePending` an existing pending change-set yields `Conflict`.
    fn store_pending_changes(
        &self,
        id: &TeacherId,
        changes: ProfileChanges,
        submitted_by: &UserId,
        policy: ResubmissionPolicy,
    ) -> Result<PendingChanges, RepositoryError>;

    /// Atomically decides `reviewed`. Approval merges exactly the reviewed change-set; the
    /// pending slot is cleared only if it still holds that revision.
    fn commit_profile_review(
        &self,
        id: &TeacherId,
        reviewed: &PendingChanges,
        decision: ReviewDecision,
    ) -> Result<ProfileCommit, RepositoryError>;

    fn update_metrics(
        &self,
        id: &TeacherId,
        metrics: ReviewMetrics,
    ) -> Result<TeacherProfile, RepositoryError>;

    /// Profiles with a pending change-set, most recent submission first.
    fn list_pending_profiles(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<TeacherProfile>, RepositoryError>;

    fn count_pending_profiles(&self) -> Result<usize, RepositoryError>;
}
