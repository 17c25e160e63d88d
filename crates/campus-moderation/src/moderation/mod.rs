//! Moderation and change-review workflows for the admin console.
//!
//! Each component owns one slice of state behind a repository trait. The orchestrator
//! composes them, enforces moderator access, and turns their results into the
//! idempotent action outcomes the console renders.

pub mod accounts;
pub mod activity;
pub mod content;
pub mod error;
pub mod identity;
pub mod memory;
pub mod notify;
pub mod orchestrator;
pub mod pagination;
pub mod profiles;
pub mod reports;
pub mod router;
pub mod store;
pub mod verification;

#[cfg(test)]
mod tests;

pub use accounts::{
    Account, AccountName, AccountRequestDesk, NameChangeForm, NameChangeRequest, RequestId,
    RequestStatus, TeacherClaimRequest,
};
pub use activity::{ActivityAction, ActivityEntry, ActivityLog, ActivityView, NewActivity, Severity};
pub use content::{
    ContentDetails, ContentFilter, ContentId, ContentItem, ContentKind, ContentRegistry,
    ContentStatus, NewContent, ReviewDetails,
};
pub use error::{ActionOutcome, Decision, ModerationError, ValidationError};
pub use identity::{Principal, Role, UserDirectory, UserId};
pub use memory::InMemoryModerationStore;
pub use notify::{Notice, Notifier, NotifyError, SilentNotifier};
pub use orchestrator::{
    AccountRequestResult, BulkDeleteResult, ContentActionResult, ModerationOrchestrator,
    ModerationStatistics, ReportAction, ReportActionResult,
};
pub use pagination::{compute_window, Page, PageRequest, PageToken, PaginationMeta};
pub use profiles::{
    ProfileChangeDesk, ProfileChanges, ProfileDiff, ProfileField, ProfileFields,
    ResubmissionPolicy, ReviewDecision, TeacherId, TeacherProfile,
};
pub use reports::{Report, ReportId, ReportLedger, ReportStatus, ReportTarget, ReportTargetKind};
pub use router::moderation_router;
pub use store::{ModerationStore, RepositoryError};
pub use verification::{
    VerificationDecision, VerificationEvidence, VerificationId, VerificationRequest,
    VerificationStatus, VerificationTracker,
};
