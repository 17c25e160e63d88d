use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::moderation::error::ValidationError;
use crate::moderation::identity::UserId;
use crate::moderation::profiles::TeacherId;

/// Identifier wrapper for forum content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub String);

impl ContentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Discussion,
    Comment,
    Review,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [
        ContentKind::Discussion,
        ContentKind::Comment,
        ContentKind::Review,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ContentKind::Discussion => "discussion",
            ContentKind::Comment => "comment",
            ContentKind::Review => "review",
        }
    }
}

impl FromStr for ContentKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "discussion" | "discussions" | "announcement" => Ok(ContentKind::Discussion),
            "comment" | "comments" => Ok(ContentKind::Comment),
            "review" | "reviews" => Ok(ContentKind::Review),
            other => Err(ValidationError::UnknownValue {
                field: "content kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Listing filter: one kind, or every kind merged into a single feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFilter {
    All,
    Only(ContentKind),
}

impl ContentFilter {
    pub fn kinds(self) -> Vec<ContentKind> {
        match self {
            ContentFilter::All => ContentKind::ALL.to_vec(),
            ContentFilter::Only(kind) => vec![kind],
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ContentFilter::All => "all",
            ContentFilter::Only(kind) => kind.label(),
        }
    }
}

impl FromStr for ContentFilter {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(ContentFilter::All);
        }
        value.parse().map(ContentFilter::Only)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Pending,
    Published,
    Hidden,
}

/// How a requested status change relates to the content state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Applied,
    Unchanged,
    /// The item is hidden; only removal leaves that state.
    Terminal,
    /// The transition runs backwards (published to pending).
    Invalid,
}

impl ContentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ContentStatus::Pending => "pending",
            ContentStatus::Published => "published",
            ContentStatus::Hidden => "hidden",
        }
    }

    pub fn transition_to(self, target: ContentStatus) -> StatusChange {
        use ContentStatus::*;
        match (self, target) {
            (current, target) if current == target => StatusChange::Unchanged,
            (Pending, Published) | (Pending, Hidden) | (Published, Hidden) => StatusChange::Applied,
            (Hidden, _) => StatusChange::Terminal,
            (Published, Pending) => StatusChange::Invalid,
            _ => StatusChange::Invalid,
        }
    }
}

/// Review-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDetails {
    pub teacher_id: TeacherId,
    pub rating: u8,
    pub semester: String,
    #[serde(default)]
    pub anonymous: bool,
}

/// Kind-specific payload; the variant is the item's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentDetails {
    Discussion { title: String },
    Comment { discussion_id: ContentId },
    Review(ReviewDetails),
}

impl ContentDetails {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentDetails::Discussion { .. } => ContentKind::Discussion,
            ContentDetails::Comment { .. } => ContentKind::Comment,
            ContentDetails::Review(_) => ContentKind::Review,
        }
    }
}

/// A moderated piece of user content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    pub author: UserId,
    pub created_at: DateTime<Utc>,
    pub status: ContentStatus,
    pub body: String,
    #[serde(flatten)]
    pub details: ContentDetails,
}

impl ContentItem {
    pub fn kind(&self) -> ContentKind {
        self.details.kind()
    }

    pub fn review(&self) -> Option<&ReviewDetails> {
        match &self.details {
            ContentDetails::Review(review) => Some(review),
            _ => None,
        }
    }
}

/// Feed order: newest first, ties broken by id (descending) so pages never shuffle.
pub fn feed_order(a: &ContentItem, b: &ContentItem) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

/// Author-supplied content before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContent {
    pub author: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub details: ContentDetails,
}

impl NewContent {
    pub fn kind(&self) -> ContentKind {
        self.details.kind()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.details {
            ContentDetails::Discussion { title } if title.trim().is_empty() => {
                return Err(ValidationError::EmptyTitle)
            }
            ContentDetails::Review(review) => {
                if !(1..=10).contains(&review.rating) {
                    return Err(ValidationError::RatingOutOfRange(review.rating));
                }
                if review.semester.trim().is_empty() {
                    return Err(ValidationError::MissingSemester);
                }
                // reviews may carry a rating without text
                return Ok(());
            }
            _ => {}
        }

        if self.body.trim().is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        Ok(())
    }
}
