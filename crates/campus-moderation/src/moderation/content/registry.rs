use std::sync::Arc;

use tracing::debug;

use crate::moderation::error::{Decision, ModerationError, ValidationError};
use crate::moderation::pagination::{Listing, PageRequest};
use crate::moderation::profiles::TeacherId;
use crate::moderation::store::RepositoryError;

use super::domain::{
    feed_order, ContentDetails, ContentFilter, ContentId, ContentItem, ContentKind, ContentStatus,
    NewContent, StatusChange,
};
use super::repository::ContentRepository;

const STATUS_RETRIES: usize = 3;

/// Uniform view over discussions, comments, and reviews.
pub struct ContentRegistry<C> {
    repository: Arc<C>,
}

impl<C> Clone for ContentRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<C> ContentRegistry<C>
where
    C: ContentRepository,
{
    pub fn new(repository: Arc<C>) -> Self {
        Self { repository }
    }

    pub fn create(&self, item: NewContent) -> Result<ContentItem, ModerationError> {
        item.validate()?;
        if let ContentDetails::Comment { discussion_id } = &item.details {
            self.get_by_id(discussion_id, ContentKind::Discussion)?;
        }
        let kind = item.kind();
        self.repository.insert_content(item).map_err(|err| match err {
            RepositoryError::Conflict(_) => ModerationError::ConflictingUniqueConstraint(
                "a review for this teacher and semester already exists".to_string(),
            ),
            other => ModerationError::from_repository(other, kind.label(), "new"),
        })
    }

    pub fn get_by_id(&self, id: &ContentId, kind: ContentKind) -> Result<ContentItem, ModerationError> {
        self.repository
            .fetch_content(id, kind)
            .map_err(|err| ModerationError::from_repository(err, kind.label(), id.0.as_str()))?
            .ok_or_else(|| ModerationError::not_found(kind.label(), id.0.as_str()))
    }

    /// Drives the item towards `target`, absorbing repeats and hidden items as unchanged.
    pub fn set_status(
        &self,
        id: &ContentId,
        kind: ContentKind,
        target: ContentStatus,
    ) -> Result<Decision<ContentItem>, ModerationError> {
        for _ in 0..STATUS_RETRIES {
            let current = self.get_by_id(id, kind)?;
            match current.status.transition_to(target) {
                StatusChange::Unchanged | StatusChange::Terminal => {
                    return Ok(Decision::unchanged(current))
                }
                StatusChange::Invalid => {
                    return Err(ValidationError::InvalidTransition {
                        from: current.status.label(),
                        to: target.label(),
                    }
                    .into())
                }
                StatusChange::Applied => {}
            }

            let swapped = self
                .repository
                .compare_and_set_status(id, kind, current.status, target)
                .map_err(|err| ModerationError::from_repository(err, kind.label(), id.0.as_str()))?;
            if swapped.applied {
                return Ok(Decision::applied(swapped.record));
            }
            debug!(content_id = %id, kind = kind.label(), "status changed underneath; retrying");
        }

        Err(ModerationError::Storage(format!(
            "{} '{}' kept changing status",
            kind.label(),
            id
        )))
    }

    pub fn delete(&self, id: &ContentId, kind: ContentKind) -> Result<ContentItem, ModerationError> {
        self.repository
            .delete_content(id, kind)
            .map_err(|err| ModerationError::from_repository(err, kind.label(), id.0.as_str()))?
            .ok_or_else(|| ModerationError::not_found(kind.label(), id.0.as_str()))
    }

    /// Newest-first listing. `All` takes the first `offset + limit` of every kind, merges them
    /// in feed order, then cuts the requested window.
    pub fn list_by_filter(
        &self,
        filter: ContentFilter,
        request: PageRequest,
    ) -> Result<Listing<ContentItem>, ModerationError> {
        let kinds = filter.kinds();
        let mut total = 0usize;
        for kind in &kinds {
            total += self.repository.count_content(*kind, None)?;
        }

        let slice = request.resolve(total);
        let items = match filter {
            ContentFilter::Only(kind) => {
                self.repository
                    .list_content(kind, slice.offset, slice.limit())?
            }
            ContentFilter::All => {
                let head = slice.offset + slice.limit();
                let mut merged = Vec::with_capacity(head * kinds.len());
                for kind in kinds {
                    merged.extend(self.repository.list_content(kind, 0, head)?);
                }
                merged.sort_by(feed_order);
                merged
                    .into_iter()
                    .skip(slice.offset)
                    .take(slice.limit())
                    .collect()
            }
        };

        Ok(Listing { items, slice })
    }

    pub fn count(&self, kind: ContentKind, status: Option<ContentStatus>) -> Result<usize, ModerationError> {
        Ok(self.repository.count_content(kind, status)?)
    }

    pub fn reviews_for_teacher(&self, teacher: &TeacherId) -> Result<Vec<ContentItem>, ModerationError> {
        Ok(self.repository.reviews_for_teacher(teacher)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::content::ReviewDetails;
    use crate::moderation::error::ActionOutcome;
    use crate::moderation::identity::UserId;
    use crate::moderation::memory::InMemoryModerationStore;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn registry() -> ContentRegistry<InMemoryModerationStore> {
        ContentRegistry::new(Arc::new(InMemoryModerationStore::new()))
    }

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn discussion(title: &str, minute: i64) -> NewContent {
        NewContent {
            author: UserId::new("s-1"),
            body: format!("{title} body"),
            created_at: at(minute),
            details: ContentDetails::Discussion {
                title: title.to_string(),
            },
        }
    }

    fn review(minute: i64, body: &str) -> NewContent {
        NewContent {
            author: UserId::new("s-2"),
            body: body.to_string(),
            created_at: at(minute),
            details: ContentDetails::Review(ReviewDetails {
                teacher_id: TeacherId::new("t-1"),
                rating: 8,
                semester: "2024-spring".to_string(),
                anonymous: false,
            }),
        }
    }

    #[test]
    fn all_feed_merges_kinds_newest_first_with_id_tiebreak() {
        let registry = registry();
        let first = registry.create(discussion("first", 0)).unwrap();
        let second = registry.create(discussion("second", 0)).unwrap();
        let newest = registry.create(review(1, "solid course")).unwrap();

        let page_one = registry
            .list_by_filter(ContentFilter::All, PageRequest::new(1, 2))
            .unwrap();
        let ids: Vec<_> = page_one.items.iter().map(|item| item.id.clone()).collect();
        assert_eq!(ids, vec![newest.id, second.id]);
        assert_eq!(page_one.total_count(), 3);

        let page_two = registry
            .list_by_filter(ContentFilter::All, PageRequest::new(2, 2))
            .unwrap();
        assert_eq!(page_two.items.len(), 1);
        assert_eq!(page_two.items[0].id, first.id);
    }

    #[test]
    fn single_kind_listing_ignores_other_kinds() {
        let registry = registry();
        registry.create(discussion("thread", 0)).unwrap();
        registry.create(review(1, "")).unwrap();

        let reviews = registry
            .list_by_filter(ContentFilter::Only(ContentKind::Review), PageRequest::new(1, 10))
            .unwrap();
        assert_eq!(reviews.items.len(), 1);
        assert_eq!(reviews.items[0].kind(), ContentKind::Review);
    }

    #[test]
    fn published_items_cannot_return_to_pending() {
        let registry = registry();
        let item = registry.create(discussion("thread", 0)).unwrap();
        registry
            .set_status(&item.id, ContentKind::Discussion, ContentStatus::Published)
            .unwrap();

        let err = registry
            .set_status(&item.id, ContentKind::Discussion, ContentStatus::Pending)
            .unwrap_err();
        assert!(matches!(
            err,
            ModerationError::Validation(ValidationError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn hidden_items_stay_hidden() {
        let registry = registry();
        let item = registry.create(discussion("thread", 0)).unwrap();
        let hidden = registry
            .set_status(&item.id, ContentKind::Discussion, ContentStatus::Hidden)
            .unwrap();
        assert_eq!(hidden.outcome, ActionOutcome::Applied);

        let approved = registry
            .set_status(&item.id, ContentKind::Discussion, ContentStatus::Published)
            .unwrap();
        assert_eq!(approved.outcome, ActionOutcome::AlreadyTerminal);
        assert_eq!(approved.record.status, ContentStatus::Hidden);
    }

    #[test]
    fn deleting_twice_reports_not_found() {
        let registry = registry();
        let item = registry.create(discussion("thread", 0)).unwrap();
        registry.delete(&item.id, ContentKind::Discussion).unwrap();

        let err = registry.delete(&item.id, ContentKind::Discussion).unwrap_err();
        assert!(matches!(err, ModerationError::NotFound { .. }));
    }

    #[test]
    fn only_reviews_may_skip_the_body() {
        let registry = registry();
        assert!(registry.create(review(0, "   ")).is_ok());

        let mut empty = discussion("thread", 1);
        empty.body = String::new();
        let err = registry.create(empty).unwrap_err();
        assert!(matches!(
            err,
            ModerationError::Validation(ValidationError::EmptyBody)
        ));
    }

    #[test]
    fn comments_need_an_existing_discussion() {
        let registry = registry();
        let orphan = NewContent {
            author: UserId::new("s-3"),
            body: "replying to nothing".to_string(),
            created_at: at(0),
            details: ContentDetails::Comment {
                discussion_id: ContentId::new("discussion-404"),
            },
        };
        let err = registry.create(orphan).unwrap_err();
        assert!(matches!(
            err,
            ModerationError::NotFound { entity: "discussion", .. }
        ));
        assert_eq!(registry.count(ContentKind::Comment, None).unwrap(), 0);

        let thread = registry.create(discussion("thread", 1)).unwrap();
        let reply = registry
            .create(NewContent {
                author: UserId::new("s-3"),
                body: "first reply".to_string(),
                created_at: at(2),
                details: ContentDetails::Comment {
                    discussion_id: thread.id.clone(),
                },
            })
            .unwrap();
        assert_eq!(reply.kind(), ContentKind::Comment);
    }
}
