use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::UserId;
use super::pagination::{Listing, PageRequest};
use super::store::RepositoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    ContentApproved,
    ContentHidden,
    ContentDeleted,
    ReportCreated,
    ReportResolved,
    ReportRejected,
    ProfileChangeSubmitted,
    ProfileChangeApproved,
    ProfileChangeRejected,
    VerificationSubmitted,
    VerificationApproved,
    VerificationRejected,
    NameChangeSubmitted,
    NameChangeApproved,
    NameChangeRejected,
    TeacherClaimSubmitted,
    TeacherClaimApproved,
    TeacherClaimRejected,
}

/// Console badge colour for an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl ActivityAction {
    pub const fn label(self) -> &'static str {
        match self {
            ActivityAction::ContentApproved => "content_approved",
            ActivityAction::ContentHidden => "content_hidden",
            ActivityAction::ContentDeleted => "content_deleted",
            ActivityAction::ReportCreated => "report_created",
            ActivityAction::ReportResolved => "report_resolved",
            ActivityAction::ReportRejected => "report_rejected",
            ActivityAction::ProfileChangeSubmitted => "profile_change_submitted",
            ActivityAction::ProfileChangeApproved => "profile_change_approved",
            ActivityAction::ProfileChangeRejected => "profile_change_rejected",
            ActivityAction::VerificationSubmitted => "verification_submitted",
            ActivityAction::VerificationApproved => "verification_approved",
            ActivityAction::VerificationRejected => "verification_rejected",
            ActivityAction::NameChangeSubmitted => "name_change_submitted",
            ActivityAction::NameChangeApproved => "name_change_approved",
            ActivityAction::NameChangeRejected => "name_change_rejected",
            ActivityAction::TeacherClaimSubmitted => "teacher_claim_submitted",
            ActivityAction::TeacherClaimApproved => "teacher_claim_approved",
            ActivityAction::TeacherClaimRejected => "teacher_claim_rejected",
        }
    }

    pub const fn severity(self) -> Severity {
        match self {
            ActivityAction::ContentApproved
            | ActivityAction::ProfileChangeApproved
            | ActivityAction::VerificationApproved
            | ActivityAction::NameChangeApproved
            | ActivityAction::TeacherClaimApproved => Severity::Success,
            ActivityAction::ReportCreated | ActivityAction::ContentHidden => Severity::Warning,
            ActivityAction::ReportRejected
            | ActivityAction::ProfileChangeRejected
            | ActivityAction::VerificationRejected
            | ActivityAction::NameChangeRejected
            | ActivityAction::TeacherClaimRejected => Severity::Error,
            _ => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: u64,
    pub actor: UserId,
    pub action: ActivityAction,
    pub description: String,
    /// `kind:id` of the record the action touched.
    pub subject: String,
    pub created_at: DateTime<Utc>,
}

/// Entry as appended; the log assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub actor: UserId,
    pub action: ActivityAction,
    pub description: String,
    pub subject: String,
}

impl NewActivity {
    pub fn new(
        actor: &UserId,
        action: ActivityAction,
        subject: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            actor: actor.clone(),
            action,
            description: description.into(),
            subject: subject.into(),
        }
    }
}

/// Feed row with its severity resolved for the console.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityView {
    #[serde(flatten)]
    pub entry: ActivityEntry,
    pub severity: Severity,
}

impl From<ActivityEntry> for ActivityView {
    fn from(entry: ActivityEntry) -> Self {
        let severity = entry.action.severity();
        Self { entry, severity }
    }
}

/// Append-only audit trail of moderator decisions.
pub trait ActivityLog: Send + Sync {
    fn append_activity(&self, entry: NewActivity) -> Result<ActivityEntry, RepositoryError>;

    /// Newest entries first.
    fn list_activity(&self, offset: usize, limit: usize)
        -> Result<Vec<ActivityEntry>, RepositoryError>;

    fn count_activity(&self) -> Result<usize, RepositoryError>;
}

/// Pages through the log newest-first.
pub fn activity_page<L>(log: &L, request: PageRequest) -> Result<Listing<ActivityView>, RepositoryError>
where
    L: ActivityLog + ?Sized,
{
    let slice = request.resolve(log.count_activity()?);
    let items = log
        .list_activity(slice.offset, slice.limit())?
        .into_iter()
        .map(ActivityView::from)
        .collect();
    Ok(Listing { items, slice })
}
