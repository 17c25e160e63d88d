use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::moderation::content::{ContentId, ContentKind};
use crate::moderation::error::ValidationError;
use crate::moderation::identity::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub String);

impl ReportId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a report points at: a content item or an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportTargetKind {
    Discussion,
    Comment,
    Review,
    User,
}

impl ReportTargetKind {
    pub const fn label(self) -> &'static str {
        match self {
            ReportTargetKind::Discussion => "discussion",
            ReportTargetKind::Comment => "comment",
            ReportTargetKind::Review => "review",
            ReportTargetKind::User => "user",
        }
    }

    pub const fn is_account(self) -> bool {
        matches!(self, ReportTargetKind::User)
    }

    /// `None` for account targets, which live outside the content registry.
    pub const fn content_kind(self) -> Option<ContentKind> {
        match self {
            ReportTargetKind::Discussion => Some(ContentKind::Discussion),
            ReportTargetKind::Comment => Some(ContentKind::Comment),
            ReportTargetKind::Review => Some(ContentKind::Review),
            ReportTargetKind::User => None,
        }
    }
}

impl From<ContentKind> for ReportTargetKind {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Discussion => ReportTargetKind::Discussion,
            ContentKind::Comment => ReportTargetKind::Comment,
            ContentKind::Review => ReportTargetKind::Review,
        }
    }
}

impl FromStr for ReportTargetKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("user") {
            return Ok(ReportTargetKind::User);
        }
        value
            .parse::<ContentKind>()
            .map(ReportTargetKind::from)
            .map_err(|_| ValidationError::UnknownValue {
                field: "report target kind",
                value: value.trim().to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportTarget {
    pub id: String,
    pub kind: ReportTargetKind,
}

impl ReportTarget {
    pub fn new(id: impl Into<String>, kind: ReportTargetKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn content(id: &ContentId, kind: ContentKind) -> Self {
        Self::new(id.0.clone(), kind.into())
    }

    /// The content address of this target, if it is content.
    pub fn as_content(&self) -> Option<(ContentId, ContentKind)> {
        self.kind
            .content_kind()
            .map(|kind| (ContentId(self.id.clone()), kind))
    }
}

impl fmt::Display for ReportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind.label(), self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Open,
    Resolved,
    Rejected,
}

impl ReportStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ReportStatus::Open => "open",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, ReportStatus::Open)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub reporter: UserId,
    pub target: ReportTarget,
    pub reason: Option<String>,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub handled_by: Option<UserId>,
    pub handled_at: Option<DateTime<Utc>>,
    pub resolution_note: Option<String>,
}

/// Report as filed, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReport {
    pub reporter: UserId,
    pub target: ReportTarget,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewReport {
    /// Trims the reason; a blank reason is stored as absent.
    pub fn new(
        reporter: UserId,
        target: ReportTarget,
        reason: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let reason = reason
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .map(str::to_string);
        Self {
            reporter,
            target,
            reason,
            created_at,
        }
    }
}

/// Terminal state written onto an open report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportClosure {
    pub status: ReportStatus,
    pub handled_by: UserId,
    pub handled_at: DateTime<Utc>,
    pub note: Option<String>,
}
