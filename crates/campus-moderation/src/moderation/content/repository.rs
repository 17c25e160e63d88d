use crate::moderation::profiles::TeacherId;
use crate::moderation::store::{RepositoryError, Transitioned};

use super::domain::{ContentId, ContentItem, ContentKind, ContentStatus, NewContent};

/// Storage abstraction for forum content, one collection per kind.
///
/// Listings must come back in feed order (newest first, ties by id descending).
pub trait ContentRepository: Send + Sync {
    /// Inserts and assigns an id. Fails with `Conflict` when a review for the same
    /// (author, teacher, semester) already exists.
    fn insert_content(&self, item: NewContent) -> Result<ContentItem, RepositoryError>;

    fn fetch_content(
        &self,
        id: &ContentId,
        kind: ContentKind,
    ) -> Result<Option<ContentItem>, RepositoryError>;

    /// Moves `id` to `next` only while it is still `expected`. The stored record comes back
    /// with `applied = false` when another writer got there first. `NotFound` when absent.
    fn compare_and_set_status(
        &self,
        id: &ContentId,
        kind: ContentKind,
        expected: ContentStatus,
        next: ContentStatus,
    ) -> Result<Transitioned<ContentItem>, RepositoryError>;

    /// Removes the item, returning it, or `None` when it was already gone.
    fn delete_content(
        &self,
        id: &ContentId,
        kind: ContentKind,
    ) -> Result<Option<ContentItem>, RepositoryError>;

    fn list_content(
        &self,
        kind: ContentKind,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ContentItem>, RepositoryError>;

    fn count_content(
        &self,
        kind: ContentKind,
        status: Option<ContentStatus>,
    ) -> Result<usize, RepositoryError>;

    fn reviews_for_teacher(&self, teacher: &TeacherId)
        -> Result<Vec<ContentItem>, RepositoryError>;
}
