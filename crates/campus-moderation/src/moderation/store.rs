use super::accounts::AccountRequestRepository;
use super::activity::ActivityLog;
use super::content::ContentRepository;
use super::identity::UserDirectory;
use super::profiles::ProfileRepository;
use super::reports::ReportRepository;
use super::verification::VerificationRepository;

/// Error enumeration for persistence failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Result of an atomic transition performed by the storage layer.
///
/// `applied` is false when the record was already terminal and came back untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Transitioned<T> {
    pub record: T,
    pub applied: bool,
}

/// Every collection the orchestrator needs, served by one backend.
pub trait ModerationStore:
    ContentRepository
    + ReportRepository
    + ProfileRepository
    + VerificationRepository
    + AccountRequestRepository
    + ActivityLog
    + UserDirectory
{
}

impl<T> ModerationStore for T where
    T: ContentRepository
        + ReportRepository
        + ProfileRepository
        + VerificationRepository
        + AccountRequestRepository
        + ActivityLog
        + UserDirectory
{
}
