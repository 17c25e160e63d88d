use serde::Serialize;

use super::accounts::{RequestId, RequestStatus};
use super::identity::UserId;
use super::profiles::TeacherId;
use super::reports::{ReportId, ReportStatus};
use super::verification::{VerificationId, VerificationStatus};

/// Message for the affected user after a moderator decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    VerificationDecided {
        user: UserId,
        request: VerificationId,
        status: VerificationStatus,
        reason: Option<String>,
    },
    ReportClosed {
        reporter: UserId,
        report: ReportId,
        status: ReportStatus,
        target_removed: bool,
    },
    NameChangeDecided {
        user: UserId,
        request: RequestId,
        status: RequestStatus,
        comment: Option<String>,
    },
    TeacherClaimDecided {
        user: UserId,
        request: RequestId,
        teacher: TeacherId,
        status: RequestStatus,
    },
}

impl Notice {
    pub fn recipient(&self) -> &UserId {
        match self {
            Notice::VerificationDecided { user, .. } => user,
            Notice::ReportClosed { reporter, .. } => reporter,
            Notice::NameChangeDecided { user, .. } | Notice::TeacherClaimDecided { user, .. } => {
                user
            }
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            Notice::VerificationDecided { .. } => "verification_decided",
            Notice::ReportClosed { .. } => "report_closed",
            Notice::NameChangeDecided { .. } => "name_change_decided",
            Notice::TeacherClaimDecided { .. } => "teacher_claim_decided",
        }
    }
}

/// Outbound hook to the e-mail / notification layer.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Drops every notice; for deployments without a mail relay.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _notice: Notice) -> Result<(), NotifyError> {
        Ok(())
    }
}
