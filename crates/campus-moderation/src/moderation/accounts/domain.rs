use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::moderation::error::ValidationError;
use crate::moderation::identity::UserId;
use crate::moderation::profiles::TeacherId;

pub const MIN_NAME_CHARS: usize = 2;
pub const MAX_NAME_CHARS: usize = 50;
/// Longest accepted justification on a name change, in characters.
pub const MAX_REASON_CHARS: usize = 500;

/// Identifier shared by name-change and teacher-claim requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl FromStr for RequestStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(ValidationError::UnknownValue {
                field: "request status",
                value: other.to_string(),
            }),
        }
    }
}

/// Legal name as shown on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountName {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub display_name: String,
}

impl AccountName {
    pub fn new(first_name: &str, last_name: &str, middle_name: Option<&str>) -> Self {
        let first_name = first_name.trim().to_string();
        let last_name = last_name.trim().to_string();
        Self {
            display_name: format!("{first_name} {last_name}"),
            first_name,
            last_name,
            middle_name: middle_name
                .map(str::trim)
                .filter(|middle| !middle.is_empty())
                .map(str::to_string),
        }
    }

    /// Same person on paper: first, middle and last names match exactly.
    pub fn same_legal_name(&self, other: &AccountName) -> bool {
        self.first_name == other.first_name
            && self.last_name == other.last_name
            && self.middle_name == other.middle_name
    }
}

/// Platform account as far as change requests need it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: UserId,
    pub email: String,
    #[serde(flatten)]
    pub name: AccountName,
}

impl Account {
    pub fn new(id: impl Into<String>, email: &str, name: AccountName) -> Self {
        Self {
            id: UserId(id.into()),
            email: email.trim().to_lowercase(),
            name,
        }
    }
}

/// Alphabet a name is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameScript {
    Latin,
    Cyrillic,
}

fn is_cyrillic_letter(ch: char) -> bool {
    ('А'..='я').contains(&ch) || matches!(ch, 'І' | 'і' | 'Ї' | 'ї' | 'Є' | 'є' | 'Ґ' | 'ґ')
}

fn is_name_separator(ch: char) -> bool {
    matches!(ch, ' ' | '-' | '\'' | '’')
}

/// The single alphabet `name` uses, or `None` when it mixes alphabets, carries other
/// characters, or has no letters at all.
pub fn name_script(name: &str) -> Option<NameScript> {
    let mut script = None;
    for ch in name.chars() {
        let current = if ch.is_ascii_alphabetic() {
            NameScript::Latin
        } else if is_cyrillic_letter(ch) {
            NameScript::Cyrillic
        } else if is_name_separator(ch) {
            continue;
        } else {
            return None;
        };
        match script {
            None => script = Some(current),
            Some(seen) if seen != current => return None,
            Some(_) => {}
        }
    }
    script
}

fn checked_name(field: &'static str, value: &str) -> Result<NameScript, ValidationError> {
    let length = value.trim().chars().count();
    if !(MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&length) {
        return Err(ValidationError::NameLength {
            field,
            min: MIN_NAME_CHARS,
            max: MAX_NAME_CHARS,
        });
    }
    name_script(value).ok_or(ValidationError::UnsupportedNameCharacters(field))
}

/// Name change as submitted by the account owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameChangeForm {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl NameChangeForm {
    /// Checks lengths and alphabets, returning the normalised name the form proposes.
    pub fn validate(&self) -> Result<AccountName, ValidationError> {
        let first = checked_name("first name", &self.first_name)?;
        let last = checked_name("last name", &self.last_name)?;
        if first != last {
            return Err(ValidationError::MixedNameScripts);
        }

        let proposed = AccountName::new(
            &self.first_name,
            &self.last_name,
            self.middle_name.as_deref(),
        );
        if let Some(middle) = &proposed.middle_name {
            if checked_name("middle name", middle)? != first {
                return Err(ValidationError::MixedNameScripts);
            }
        }

        if let Some(reason) = &self.reason {
            let length = reason.trim().chars().count();
            if length > MAX_REASON_CHARS {
                return Err(ValidationError::ReasonTooLong(length));
            }
        }
        Ok(proposed)
    }

    pub fn trimmed_reason(&self) -> Option<String> {
        self.reason
            .as_deref()
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameChangeRequest {
    pub id: RequestId,
    pub user: UserId,
    pub current: AccountName,
    pub proposed: AccountName,
    pub reason: Option<String>,
    pub status: RequestStatus,
    pub reviewer: Option<UserId>,
    pub review_comment: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNameChange {
    pub user: UserId,
    pub current: AccountName,
    pub proposed: AccountName,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request to be linked to an existing teacher profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherClaimRequest {
    pub id: RequestId,
    pub teacher_id: TeacherId,
    pub user: UserId,
    pub user_email: String,
    pub teacher_name: String,
    pub status: RequestStatus,
    pub admin_notes: Option<String>,
    pub processed_by: Option<UserId>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeacherClaim {
    pub teacher_id: TeacherId,
    pub user: UserId,
    pub user_email: String,
    pub teacher_name: String,
    pub created_at: DateTime<Utc>,
}

/// Terminal state written onto a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestVerdict {
    pub status: RequestStatus,
    pub reviewer: UserId,
    pub reviewed_at: DateTime<Utc>,
    pub comment: Option<String>,
}
