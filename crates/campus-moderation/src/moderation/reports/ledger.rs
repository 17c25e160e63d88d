use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::moderation::content::{ContentItem, ContentRegistry, ContentRepository};
use crate::moderation::error::{ActionOutcome, Decision, ModerationError, ValidationError};
use crate::moderation::identity::{UserDirectory, UserId};
use crate::moderation::pagination::{Listing, PageRequest};
use crate::moderation::store::RepositoryError;

use super::domain::{NewReport, Report, ReportClosure, ReportId, ReportStatus, ReportTarget};
use super::repository::ReportRepository;

/// Result of resolving a report by removing what it points at.
#[derive(Debug, Clone, Serialize)]
pub struct TargetResolution {
    pub report: Report,
    pub outcome: ActionOutcome,
    pub target_deleted: bool,
    #[serde(skip)]
    pub removed: Option<ContentItem>,
}

/// Report lifecycle over a store that can also resolve content and accounts.
pub struct ReportLedger<S> {
    store: Arc<S>,
    content: ContentRegistry<S>,
}

impl<S> ReportLedger<S>
where
    S: ReportRepository + ContentRepository + UserDirectory,
{
    pub fn new(store: Arc<S>) -> Self {
        let content = ContentRegistry::new(Arc::clone(&store));
        Self { store, content }
    }

    /// Files a report. The target must exist and the reporter may file only once per target.
    pub fn create(
        &self,
        reporter: &UserId,
        target: ReportTarget,
        reason: Option<&str>,
    ) -> Result<Report, ModerationError> {
        match target.as_content() {
            Some((id, kind)) => {
                self.content.get_by_id(&id, kind)?;
            }
            None => {
                let exists = self.store.user_exists(&UserId(target.id.clone()))?;
                if !exists {
                    return Err(ModerationError::not_found("user", target.id.as_str()));
                }
            }
        }

        let report = NewReport::new(reporter.clone(), target, reason, Utc::now());
        self.store.insert_report(report).map_err(|err| match err {
            RepositoryError::Conflict(_) => ModerationError::ConflictingUniqueConstraint(
                "you have already reported this content".to_string(),
            ),
            other => other.into(),
        })
    }

    pub fn get(&self, id: &ReportId) -> Result<Report, ModerationError> {
        self.store
            .fetch_report(id)?
            .ok_or_else(|| ModerationError::not_found("report", id.0.as_str()))
    }

    pub fn list_open(&self, request: PageRequest) -> Result<Listing<Report>, ModerationError> {
        let total = self.store.count_open_reports()?;
        let slice = request.resolve(total);
        let items = self.store.list_open_reports(slice.offset, slice.limit())?;
        Ok(Listing { items, slice })
    }

    pub fn resolve(
        &self,
        id: &ReportId,
        actor: &UserId,
        note: Option<String>,
    ) -> Result<Decision<Report>, ModerationError> {
        self.close(id, ReportStatus::Resolved, actor, note)
    }

    pub fn reject(&self, id: &ReportId, actor: &UserId) -> Result<Decision<Report>, ModerationError> {
        self.close(id, ReportStatus::Rejected, actor, None)
    }

    /// Deletes the reported content and resolves the report. A target that already vanished
    /// still resolves the report, with `target_deleted = false`.
    pub fn resolve_by_deleting_target(
        &self,
        id: &ReportId,
        actor: &UserId,
    ) -> Result<TargetResolution, ModerationError> {
        let report = self.get(id)?;
        if report.status.is_terminal() {
            return Ok(TargetResolution {
                report,
                outcome: ActionOutcome::AlreadyTerminal,
                target_deleted: false,
                removed: None,
            });
        }

        let (content_id, kind) = report
            .target
            .as_content()
            .ok_or(ValidationError::AccountTarget)?;

        let removed = match self.content.delete(&content_id, kind) {
            Ok(item) => Some(item),
            Err(ModerationError::NotFound { .. }) => {
                debug!(report_id = %id, target = %report.target, "report target already removed");
                None
            }
            Err(other) => return Err(other),
        };

        let note = if removed.is_some() {
            "content removed"
        } else {
            "content already removed"
        };
        let decision = self.close(id, ReportStatus::Resolved, actor, Some(note.to_string()))?;

        let outcome = match (decision.outcome, removed.is_some()) {
            (ActionOutcome::Applied, false) => ActionOutcome::AlreadyRemoved,
            (outcome, _) => outcome,
        };

        Ok(TargetResolution {
            report: decision.record,
            outcome,
            target_deleted: removed.is_some(),
            removed,
        })
    }

    /// Resolves every still-open report against `target`.
    pub fn resolve_for_target(
        &self,
        target: &ReportTarget,
        actor: &UserId,
        note: &str,
    ) -> Result<Vec<Report>, ModerationError> {
        let open = self.store.open_reports_for_target(target)?;
        let mut resolved = Vec::with_capacity(open.len());
        for report in open {
            let decision =
                self.close(&report.id, ReportStatus::Resolved, actor, Some(note.to_string()))?;
            if decision.outcome.changed_state() {
                resolved.push(decision.record);
            }
        }
        Ok(resolved)
    }

    pub fn list_by_reporter(&self, reporter: &UserId) -> Result<Vec<Report>, ModerationError> {
        Ok(self.store.reports_by_reporter(reporter)?)
    }

    pub fn count_open(&self) -> Result<usize, ModerationError> {
        Ok(self.store.count_open_reports()?)
    }

    fn close(
        &self,
        id: &ReportId,
        status: ReportStatus,
        actor: &UserId,
        note: Option<String>,
    ) -> Result<Decision<Report>, ModerationError> {
        let closure = ReportClosure {
            status,
            handled_by: actor.clone(),
            handled_at: Utc::now(),
            note,
        };
        let transitioned = self
            .store
            .close_report(id, closure)
            .map_err(|err| ModerationError::from_repository(err, "report", id.0.as_str()))?
            .ok_or_else(|| ModerationError::not_found("report", id.0.as_str()))?;

        Ok(if transitioned.applied {
            Decision::applied(transitioned.record)
        } else {
            Decision::unchanged(transitioned.record)
        })
    }
}
