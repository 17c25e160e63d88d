use crate::moderation::profiles::{ProfileChanges, TeacherId, TeacherProfile};
use crate::moderation::store::{RepositoryError, Transitioned};

use super::domain::{
    NewVerification, VerificationId, VerificationRequest, VerificationStatus, VerificationVerdict,
};

/// Result of [`VerificationRepository::approve_profile_verification`].
#[derive(Debug, Clone)]
pub struct ProfileVerification {
    pub request: Transitioned<VerificationRequest>,
    pub profile: Option<TeacherProfile>,
}

/// Storage abstraction for verification requests.
pub trait VerificationRepository: Send + Sync {
    fn insert_verification(
        &self,
        request: NewVerification,
    ) -> Result<VerificationRequest, RepositoryError>;

    fn fetch_verification(
        &self,
        id: &VerificationId,
    ) -> Result<Option<VerificationRequest>, RepositoryError>;

    /// Writes `verdict` only while the request is still submitted. `None` for unknown ids.
    fn decide_verification(
        &self,
        id: &VerificationId,
        verdict: VerificationVerdict,
    ) -> Result<Option<Transitioned<VerificationRequest>>, RepositoryError>;

    /// Approves a request carrying teacher evidence and merges `changes` into the profile in
    /// the same step. A request that is no longer submitted is returned untouched with no
    /// profile; a missing profile is `NotFound` and leaves the request submitted.
    fn approve_profile_verification(
        &self,
        id: &VerificationId,
        verdict: VerificationVerdict,
        teacher_id: &TeacherId,
        changes: &ProfileChanges,
    ) -> Result<Option<ProfileVerification>, RepositoryError>;

    /// Newest submissions first, optionally restricted to one status.
    fn list_verifications(
        &self,
        status: Option<VerificationStatus>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<VerificationRequest>, RepositoryError>;

    fn count_verifications(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<usize, RepositoryError>;
}
