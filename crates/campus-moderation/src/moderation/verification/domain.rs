use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::moderation::error::ValidationError;
use crate::moderation::identity::UserId;
use crate::moderation::profiles::{differ, ProfileChanges, TeacherId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationId(pub String);

impl VerificationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for VerificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Submitted,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VerificationStatus::Submitted => "submitted",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, VerificationStatus::Submitted)
    }
}

impl FromStr for VerificationStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "submitted" => Ok(VerificationStatus::Submitted),
            "approved" => Ok(VerificationStatus::Approved),
            "rejected" => Ok(VerificationStatus::Rejected),
            other => Err(ValidationError::UnknownValue {
                field: "verification status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Photo,
    Card,
    #[default]
    Other,
}

/// Reference to an uploaded file; the upload itself happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_id: String,
    #[serde(default)]
    pub kind: AttachmentKind,
}

/// Proof attached to a verification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "flavor", rename_all = "snake_case")]
pub enum VerificationEvidence {
    Student {
        #[serde(default)]
        university_email: String,
        #[serde(default)]
        student_card_number: String,
        #[serde(default)]
        attachments: Vec<Attachment>,
    },
    TeacherProfile {
        teacher_id: TeacherId,
        changes: ProfileChanges,
    },
}

impl VerificationEvidence {
    pub fn label(&self) -> &'static str {
        match self {
            VerificationEvidence::Student { .. } => "student",
            VerificationEvidence::TeacherProfile { .. } => "teacher_profile",
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            VerificationEvidence::Student {
                university_email,
                student_card_number,
                attachments,
            } => {
                let email = university_email.trim();
                if email.is_empty() && student_card_number.trim().is_empty() {
                    return Err(ValidationError::IncompleteEvidence(
                        "a university email or student card number is required",
                    ));
                }
                if !email.is_empty() && !email.contains('@') {
                    return Err(ValidationError::IncompleteEvidence(
                        "the university email is malformed",
                    ));
                }
                if attachments.iter().any(|file| file.file_id.trim().is_empty()) {
                    return Err(ValidationError::IncompleteEvidence(
                        "every attachment needs a file id",
                    ));
                }
                Ok(())
            }
            VerificationEvidence::TeacherProfile { changes, .. } => differ::validate(changes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub id: VerificationId,
    pub user: UserId,
    pub evidence: VerificationEvidence,
    pub status: VerificationStatus,
    pub reviewer: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVerification {
    pub user: UserId,
    pub evidence: VerificationEvidence,
    pub submitted_at: DateTime<Utc>,
}

/// Terminal state written onto a submitted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationVerdict {
    pub status: VerificationStatus,
    pub reviewer: UserId,
    pub reviewed_at: DateTime<Utc>,
    pub rejection_reason: Option<String>,
}

/// Moderator decision as sent by the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum VerificationDecision {
    Approve,
    Reject { reason: String },
}
