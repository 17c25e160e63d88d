use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::moderation::error::ValidationError;
use crate::moderation::identity::UserId;

/// Longest accepted bio, in characters.
pub const MAX_BIO_CHARS: usize = 2000;

/// Most subjects a profile may list.
pub const MAX_SUBJECTS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeacherId(pub String);

impl TeacherId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for TeacherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Editable profile fields, in console display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Position,
    Phone,
    University,
    Faculty,
    Department,
    Subjects,
    Image,
    Bio,
}

impl ProfileField {
    pub const ALL: [ProfileField; 8] = [
        ProfileField::Position,
        ProfileField::Phone,
        ProfileField::University,
        ProfileField::Faculty,
        ProfileField::Department,
        ProfileField::Subjects,
        ProfileField::Image,
        ProfileField::Bio,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ProfileField::Position => "position",
            ProfileField::Phone => "phone",
            ProfileField::University => "university",
            ProfileField::Faculty => "faculty",
            ProfileField::Department => "department",
            ProfileField::Subjects => "subjects",
            ProfileField::Image => "image",
            ProfileField::Bio => "bio",
        }
    }
}

/// A field's value as shown side by side in the review console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

/// Authoritative, publicly visible profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub university: String,
    #[serde(default)]
    pub faculty: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub bio: String,
}

impl ProfileFields {
    pub fn value(&self, field: ProfileField) -> FieldValue {
        match field {
            ProfileField::Position => FieldValue::Text(self.position.clone()),
            ProfileField::Phone => FieldValue::Text(self.phone.clone()),
            ProfileField::University => FieldValue::Text(self.university.clone()),
            ProfileField::Faculty => FieldValue::Text(self.faculty.clone()),
            ProfileField::Department => FieldValue::Text(self.department.clone()),
            ProfileField::Subjects => FieldValue::List(self.subjects.clone()),
            ProfileField::Image => FieldValue::Text(self.image.clone()),
            ProfileField::Bio => FieldValue::Text(self.bio.clone()),
        }
    }
}

/// A partial profile: only the fields a teacher proposes to change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl ProfileChanges {
    pub fn get(&self, field: ProfileField) -> Option<FieldValue> {
        match field {
            ProfileField::Position => self.position.clone().map(FieldValue::Text),
            ProfileField::Phone => self.phone.clone().map(FieldValue::Text),
            ProfileField::University => self.university.clone().map(FieldValue::Text),
            ProfileField::Faculty => self.faculty.clone().map(FieldValue::Text),
            ProfileField::Department => self.department.clone().map(FieldValue::Text),
            ProfileField::Subjects => self.subjects.clone().map(FieldValue::List),
            ProfileField::Image => self.image.clone().map(FieldValue::Text),
            ProfileField::Bio => self.bio.clone().map(FieldValue::Text),
        }
    }

    /// Proposed fields in display order.
    pub fn fields(&self) -> Vec<ProfileField> {
        ProfileField::ALL
            .into_iter()
            .filter(|field| self.get(*field).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

/// Denormalised review aggregate shown on the teacher card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewMetrics {
    pub avg_rating: f64,
    pub reviews: u32,
}

impl ReviewMetrics {
    /// Plain mean of the remaining ratings; zero when nothing is left.
    pub fn from_ratings(ratings: impl IntoIterator<Item = u8>) -> Self {
        let (sum, count) = ratings
            .into_iter()
            .fold((0u32, 0u32), |(sum, count), rating| (sum + u32::from(rating), count + 1));
        if count == 0 {
            return Self::default();
        }
        Self {
            avg_rating: f64::from(sum) / f64::from(count),
            reviews: count,
        }
    }
}

/// A stored change-set awaiting review, stamped with its revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChanges {
    pub revision: u64,
    pub submitted_at: DateTime<Utc>,
    pub submitted_by: UserId,
    pub changes: ProfileChanges,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherProfile {
    pub id: TeacherId,
    pub name: String,
    /// Account allowed to submit changes for this profile.
    pub account: Option<UserId>,
    #[serde(flatten)]
    pub fields: ProfileFields,
    #[serde(default)]
    pub metrics: ReviewMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_changes: Option<PendingChanges>,
    /// Highest revision an administrator has decided on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_revision: Option<u64>,
    pub updated_at: DateTime<Utc>,
}

impl TeacherProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>, fields: ProfileFields) -> Self {
        Self {
            id: TeacherId(id.into()),
            name: name.into(),
            account: None,
            fields,
            metrics: ReviewMetrics::default(),
            pending_changes: None,
            reviewed_revision: None,
            updated_at: Utc::now(),
        }
    }

    /// Next revision number for a submission against this profile.
    pub fn next_revision(&self) -> u64 {
        let pending = self.pending_changes.as_ref().map_or(0, |pending| pending.revision);
        pending.max(self.reviewed_revision.unwrap_or(0)) + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewDecision::Approve => "approve",
            ReviewDecision::Reject => "reject",
        }
    }
}

impl FromStr for ReviewDecision {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approve" => Ok(ReviewDecision::Approve),
            "reject" => Ok(ReviewDecision::Reject),
            other => Err(ValidationError::UnknownValue {
                field: "decision",
                value: other.to_string(),
            }),
        }
    }
}

/// What to do when a teacher submits while an earlier change-set is still pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResubmissionPolicy {
    /// The newer change-set replaces the pending one under a new revision.
    #[default]
    Overwrite,
    /// The submission is refused until the pending one is decided.
    RejectWhilePending,
}

impl FromStr for ResubmissionPolicy {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(ResubmissionPolicy::Overwrite),
            "reject" | "reject_while_pending" => Ok(ResubmissionPolicy::RejectWhilePending),
            other => Err(ValidationError::UnknownValue {
                field: "resubmission policy",
                value: other.to_string(),
            }),
        }
    }
}

/// Comparison of one proposed field against the authoritative value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDiff {
    pub changed: bool,
    pub authoritative_value: FieldValue,
    pub proposed_value: FieldValue,
}

/// Per-field comparison, keyed by the proposed fields only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProfileDiff(pub BTreeMap<ProfileField, FieldDiff>);

impl ProfileDiff {
    pub fn changed_fields(&self) -> Vec<ProfileField> {
        self.0
            .iter()
            .filter(|(_, diff)| diff.changed)
            .map(|(field, _)| *field)
            .collect()
    }

    pub fn has_changes(&self) -> bool {
        self.0.values().any(|diff| diff.changed)
    }

    pub fn get(&self, field: ProfileField) -> Option<&FieldDiff> {
        self.0.get(&field)
    }
}
