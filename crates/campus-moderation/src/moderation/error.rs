use serde::Serialize;

use super::store::RepositoryError;

/// Failure surfaced by moderation operations.
///
/// Recoverable conditions (a vanished report target, a repeated decision) never appear here;
/// they are reported through [`ActionOutcome`] on an otherwise successful result.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error("conflicting record: {0}")]
    ConflictingUniqueConstraint(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("moderator role required")]
    Forbidden,
    #[error("storage failure: {0}")]
    Storage(String),
}

impl ModerationError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Maps a repository failure for the record identified by `entity`/`id`.
    pub(crate) fn from_repository(
        err: RepositoryError,
        entity: &'static str,
        id: impl Into<String>,
    ) -> Self {
        match err {
            RepositoryError::NotFound => Self::not_found(entity, id),
            RepositoryError::Conflict(detail) => Self::ConflictingUniqueConstraint(detail),
            RepositoryError::Unavailable(detail) => Self::Storage(detail),
        }
    }
}

impl From<RepositoryError> for ModerationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => Self::NotFound {
                entity: "record",
                id: String::new(),
            },
            RepositoryError::Conflict(detail) => Self::ConflictingUniqueConstraint(detail),
            RepositoryError::Unavailable(detail) => Self::Storage(detail),
        }
    }
}

/// Malformed input rejected before anything is diffed or stored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("content body must not be empty")]
    EmptyBody,
    #[error("discussion title must not be empty")]
    EmptyTitle,
    #[error("rating {0} is outside 1..=10")]
    RatingOutOfRange(u8),
    #[error("review semester must not be empty")]
    MissingSemester,
    #[error("change request does not propose any field")]
    EmptyChangeSet,
    #[error("bio is {0} characters long; the limit is {max}", max = super::profiles::MAX_BIO_CHARS)]
    BioTooLong(usize),
    #[error("phone number '{0}' contains unsupported characters")]
    InvalidPhone(String),
    #[error("{0} subjects proposed; the limit is {max}", max = super::profiles::MAX_SUBJECTS)]
    TooManySubjects(usize),
    #[error("a rejection reason is required")]
    MissingReason,
    #[error("verification evidence is incomplete: {0}")]
    IncompleteEvidence(&'static str),
    #[error("content cannot move from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error("account reports cannot be resolved by deleting content")]
    AccountTarget,
    #[error("{field} must be between {min} and {max} characters")]
    NameLength {
        field: &'static str,
        min: usize,
        max: usize,
    },
    #[error("{0} may only contain Ukrainian or English letters, spaces, apostrophes and hyphens")]
    UnsupportedNameCharacters(&'static str),
    #[error("names must be written in one alphabet")]
    MixedNameScripts,
    #[error("the proposed name matches the current one")]
    UnchangedName,
    #[error("reason is {0} characters long; the limit is {max}", max = super::accounts::MAX_REASON_CHARS)]
    ReasonTooLong(usize),
    #[error("unknown {field} '{value}'")]
    UnknownValue { field: &'static str, value: String },
}

/// How a moderator action landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The action changed state.
    Applied,
    /// The record was already in a terminal state; nothing changed.
    AlreadyTerminal,
    /// The target had already been removed through another path.
    AlreadyRemoved,
}

impl ActionOutcome {
    pub const fn label(self) -> &'static str {
        match self {
            ActionOutcome::Applied => "applied",
            ActionOutcome::AlreadyTerminal => "already_terminal",
            ActionOutcome::AlreadyRemoved => "already_removed",
        }
    }

    pub const fn changed_state(self) -> bool {
        matches!(self, ActionOutcome::Applied)
    }
}

/// A record together with how the requested transition landed.
#[derive(Debug, Clone, Serialize)]
pub struct Decision<T> {
    pub record: T,
    pub outcome: ActionOutcome,
}

impl<T> Decision<T> {
    pub fn applied(record: T) -> Self {
        Self {
            record,
            outcome: ActionOutcome::Applied,
        }
    }

    pub fn unchanged(record: T) -> Self {
        Self {
            record,
            outcome: ActionOutcome::AlreadyTerminal,
        }
    }
}
