use crate::moderation::identity::UserId;
use crate::moderation::store::{RepositoryError, Transitioned};

use super::domain::{
    Account, NameChangeRequest, NewNameChange, NewTeacherClaim, RequestId, RequestStatus,
    RequestVerdict, TeacherClaimRequest,
};

/// Storage abstraction for accounts and the change requests filed against them.
pub trait AccountRequestRepository: Send + Sync {
    fn fetch_account(&self, user: &UserId) -> Result<Option<Account>, RepositoryError>;

    /// `Conflict` while the same user still has a pending name change.
    fn insert_name_change(
        &self,
        request: NewNameChange,
    ) -> Result<NameChangeRequest, RepositoryError>;

    fn fetch_name_change(&self, id: &RequestId) -> Result<Option<NameChangeRequest>, RepositoryError>;

    /// Most recent request filed by `user`, whatever its status.
    fn latest_name_change(
        &self,
        user: &UserId,
    ) -> Result<Option<NameChangeRequest>, RepositoryError>;

    /// Writes `verdict` only while the request is pending. Approval copies the proposed name
    /// onto the account in the same step; a vanished account is `NotFound` and leaves the
    /// request pending. `None` for unknown ids.
    fn decide_name_change(
        &self,
        id: &RequestId,
        verdict: RequestVerdict,
    ) -> Result<Option<Transitioned<NameChangeRequest>>, RepositoryError>;

    /// Newest requests first, optionally restricted to one status.
    fn list_name_changes(
        &self,
        status: Option<RequestStatus>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<NameChangeRequest>, RepositoryError>;

    fn count_name_changes(&self, status: Option<RequestStatus>) -> Result<usize, RepositoryError>;

    /// `Conflict` while the same user already has a pending claim on the same profile.
    fn insert_teacher_claim(
        &self,
        claim: NewTeacherClaim,
    ) -> Result<TeacherClaimRequest, RepositoryError>;

    fn fetch_teacher_claim(
        &self,
        id: &RequestId,
    ) -> Result<Option<TeacherClaimRequest>, RepositoryError>;

    /// Writes `verdict` only while the claim is pending. Approval links the profile to the
    /// claimant in the same step and is refused with `Conflict` when another account holds
    /// the profile. `None` for unknown ids.
    fn decide_teacher_claim(
        &self,
        id: &RequestId,
        verdict: RequestVerdict,
    ) -> Result<Option<Transitioned<TeacherClaimRequest>>, RepositoryError>;

    fn list_teacher_claims(
        &self,
        status: Option<RequestStatus>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<TeacherClaimRequest>, RepositoryError>;

    fn count_teacher_claims(&self, status: Option<RequestStatus>)
        -> Result<usize, RepositoryError>;
}
