use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ModerationConfig;

use super::accounts::{
    AccountRequestDesk, NameChangeForm, NameChangeRequest, RequestId, RequestStatus,
    TeacherClaimRequest,
};
use super::activity::{activity_page, ActivityAction, ActivityView, NewActivity};
use super::content::{
    ContentFilter, ContentId, ContentItem, ContentKind, ContentRegistry, ContentStatus, NewContent,
};
use super::error::{ActionOutcome, Decision, ModerationError, ValidationError};
use super::identity::{Principal, UserId};
use super::notify::{Notice, Notifier};
use super::pagination::{Page, PageRequest};
use super::profiles::{
    differ, PendingChanges, PendingProfileChange, ProfileChangeDesk, ProfileChanges, ProfileDiff,
    ProfileReview, ReviewDecision, TeacherId, TeacherProfile,
};
use super::reports::{Report, ReportId, ReportLedger, ReportStatus, ReportTarget};
use super::store::ModerationStore;
use super::verification::{
    VerificationDecision, VerificationEvidence, VerificationId, VerificationRequest,
    VerificationStatus, VerificationTracker,
};

/// Rows per page of the mixed feed when the console names no size.
pub const ALL_FEED_PAGE_SIZE: u32 = 5;

/// Moderator action on a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportAction {
    Resolve,
    Reject,
    DeleteContent,
}

impl ReportAction {
    pub const fn label(self) -> &'static str {
        match self {
            ReportAction::Resolve => "resolve",
            ReportAction::Reject => "reject",
            ReportAction::DeleteContent => "delete_content",
        }
    }
}

impl FromStr for ReportAction {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "resolve" => Ok(ReportAction::Resolve),
            "reject" => Ok(ReportAction::Reject),
            "delete_content" | "delete" => Ok(ReportAction::DeleteContent),
            other => Err(ValidationError::UnknownValue {
                field: "report action",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentActionResult {
    pub id: ContentId,
    pub kind: ContentKind,
    pub outcome: ActionOutcome,
    pub item: Option<ContentItem>,
    pub message: String,
    /// Open reports closed because their target went away.
    pub reports_resolved: usize,
    pub refresh: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkFailure {
    pub id: ContentId,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkDeleteResult {
    pub deleted: Vec<ContentId>,
    pub already_removed: Vec<ContentId>,
    pub failed: Vec<BulkFailure>,
    pub refresh: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportActionResult {
    pub report: Report,
    pub action: ReportAction,
    pub outcome: ActionOutcome,
    pub target_deleted: bool,
    pub message: String,
    pub refresh: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileSubmissionResult {
    pub pending: PendingChanges,
    pub diff: ProfileDiff,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileReviewResult {
    #[serde(flatten)]
    pub review: ProfileReview,
    pub message: String,
    pub refresh: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationDecisionResult {
    pub request: VerificationRequest,
    pub outcome: ActionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<TeacherProfile>,
    pub message: String,
    pub refresh: bool,
}

/// Decision on a name change or teacher claim.
#[derive(Debug, Clone, Serialize)]
pub struct AccountRequestResult<T> {
    pub request: T,
    pub outcome: ActionOutcome,
    pub message: String,
    pub refresh: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PendingContentCounts {
    pub discussion: usize,
    pub comment: usize,
    pub review: usize,
}

/// Counters for the console dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModerationStatistics {
    pub total_content: usize,
    pub pending_content: PendingContentCounts,
    pub hidden_content: usize,
    pub open_reports: usize,
    pub pending_profile_changes: usize,
    pub submitted_verifications: usize,
    pub pending_name_changes: usize,
    pub pending_teacher_claims: usize,
}

/// Façade consumed by the admin console.
pub struct ModerationOrchestrator<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    content: ContentRegistry<S>,
    reports: ReportLedger<S>,
    profiles: ProfileChangeDesk<S>,
    verifications: VerificationTracker<S>,
    accounts: AccountRequestDesk<S>,
    config: ModerationConfig,
}

impl<S, N> ModerationOrchestrator<S, N>
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: ModerationConfig) -> Self {
        Self {
            content: ContentRegistry::new(Arc::clone(&store)),
            reports: ReportLedger::new(Arc::clone(&store)),
            profiles: ProfileChangeDesk::new(Arc::clone(&store)),
            verifications: VerificationTracker::new(Arc::clone(&store)),
            accounts: AccountRequestDesk::new(Arc::clone(&store)),
            store,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &ModerationConfig {
        &self.config
    }

    pub fn list_moderation_queue(
        &self,
        principal: &Principal,
        filter: ContentFilter,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<Page<ContentItem>, ModerationError> {
        require_moderator(principal)?;
        let fallback = match filter {
            ContentFilter::All => ALL_FEED_PAGE_SIZE,
            ContentFilter::Only(_) => self.config.page_size,
        };
        let request = self.page_request(page, page_size, fallback);
        let listing = self.content.list_by_filter(filter, request)?;
        debug!(
            filter = filter.label(),
            page = listing.slice.current_page,
            total = listing.total_count(),
            "moderation queue listed"
        );
        Ok(listing.into_page(self.config.max_visible_pages))
    }

    /// Posts new content as the acting principal. New items wait in `pending`.
    pub fn create_content(
        &self,
        principal: &Principal,
        mut draft: NewContent,
    ) -> Result<ContentItem, ModerationError> {
        draft.author = principal.id.clone();
        let item = self.content.create(draft)?;
        if let Some(review) = item.review() {
            self.refresh_teacher_metrics(&review.teacher_id);
        }
        info!(content_id = %item.id, kind = item.kind().label(), "content created");
        Ok(item)
    }

    pub fn approve_item(
        &self,
        principal: &Principal,
        id: &ContentId,
        kind: ContentKind,
    ) -> Result<ContentActionResult, ModerationError> {
        require_moderator(principal)?;
        let decision = self.content.set_status(id, kind, ContentStatus::Published)?;
        let message = match (decision.outcome, decision.record.status) {
            (ActionOutcome::Applied, _) => format!("{} {id} approved", kind.label()),
            (_, ContentStatus::Hidden) => {
                format!("{} {id} is hidden; only removal changes it", kind.label())
            }
            _ => format!("{} {id} was already approved", kind.label()),
        };

        if decision.outcome.changed_state() {
            self.record(
                &principal.id,
                ActivityAction::ContentApproved,
                content_subject(id, kind),
                message.clone(),
            );
            info!(content_id = %id, kind = kind.label(), moderator = %principal.id, "content approved");
        }

        Ok(content_result(id, kind, decision, message))
    }

    pub fn hide_item(
        &self,
        principal: &Principal,
        id: &ContentId,
        kind: ContentKind,
    ) -> Result<ContentActionResult, ModerationError> {
        require_moderator(principal)?;
        let decision = self.content.set_status(id, kind, ContentStatus::Hidden)?;
        let message = if decision.outcome.changed_state() {
            format!("{} {id} hidden", kind.label())
        } else {
            format!("{} {id} was already hidden", kind.label())
        };

        if decision.outcome.changed_state() {
            self.record(
                &principal.id,
                ActivityAction::ContentHidden,
                content_subject(id, kind),
                message.clone(),
            );
            info!(content_id = %id, kind = kind.label(), moderator = %principal.id, "content hidden");
        }

        Ok(content_result(id, kind, decision, message))
    }

    /// Removes an item. Removing an item that is already gone succeeds as `already_removed`.
    pub fn delete_item(
        &self,
        principal: &Principal,
        id: &ContentId,
        kind: ContentKind,
    ) -> Result<ContentActionResult, ModerationError> {
        require_moderator(principal)?;
        match self.content.delete(id, kind) {
            Ok(item) => {
                let message = format!("{} {id} deleted", kind.label());
                self.record(
                    &principal.id,
                    ActivityAction::ContentDeleted,
                    content_subject(id, kind),
                    message.clone(),
                );
                let reports_resolved = self.after_removal(&principal.id, &item);
                info!(
                    content_id = %id,
                    kind = kind.label(),
                    moderator = %principal.id,
                    reports_resolved,
                    "content deleted"
                );
                Ok(ContentActionResult {
                    id: id.clone(),
                    kind,
                    outcome: ActionOutcome::Applied,
                    item: Some(item),
                    message,
                    reports_resolved,
                    refresh: true,
                })
            }
            Err(ModerationError::NotFound { .. }) => Ok(ContentActionResult {
                id: id.clone(),
                kind,
                outcome: ActionOutcome::AlreadyRemoved,
                item: None,
                message: format!("{} {id} was already removed", kind.label()),
                reports_resolved: 0,
                refresh: true,
            }),
            Err(other) => Err(other),
        }
    }

    /// Deletes every id independently; failures are collected, never raised.
    pub fn bulk_delete(
        &self,
        principal: &Principal,
        ids: &[ContentId],
        kind: ContentKind,
    ) -> Result<BulkDeleteResult, ModerationError> {
        require_moderator(principal)?;
        let mut result = BulkDeleteResult {
            refresh: true,
            ..BulkDeleteResult::default()
        };

        for id in ids {
            match self.delete_item(principal, id, kind) {
                Ok(action) if action.outcome.changed_state() => result.deleted.push(id.clone()),
                Ok(_) => result.already_removed.push(id.clone()),
                Err(err) => {
                    warn!(content_id = %id, kind = kind.label(), error = %err, "bulk delete entry failed");
                    result.failed.push(BulkFailure {
                        id: id.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            kind = kind.label(),
            deleted = result.deleted.len(),
            already_removed = result.already_removed.len(),
            failed = result.failed.len(),
            "bulk delete finished"
        );
        Ok(result)
    }

    pub fn create_report(
        &self,
        principal: &Principal,
        target: ReportTarget,
        reason: Option<&str>,
    ) -> Result<Report, ModerationError> {
        let report = self.reports.create(&principal.id, target, reason)?;
        self.record(
            &principal.id,
            ActivityAction::ReportCreated,
            format!("report:{}", report.id),
            format!("{} reported {}", principal.id, report.target),
        );
        info!(report_id = %report.id, target = %report.target, "report filed");
        Ok(report)
    }

    pub fn list_open_reports(
        &self,
        principal: &Principal,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<Page<Report>, ModerationError> {
        require_moderator(principal)?;
        let request = self.page_request(page, page_size, self.config.page_size);
        Ok(self
            .reports
            .list_open(request)?
            .into_page(self.config.max_visible_pages))
    }

    /// The caller's own reports, newest first.
    pub fn list_my_reports(&self, principal: &Principal) -> Result<Vec<Report>, ModerationError> {
        self.reports.list_by_reporter(&principal.id)
    }

    pub fn handle_report_action(
        &self,
        principal: &Principal,
        report_id: &ReportId,
        action: ReportAction,
    ) -> Result<ReportActionResult, ModerationError> {
        require_moderator(principal)?;

        let (report, outcome, target_deleted) = match action {
            ReportAction::Resolve => {
                let decision = self.reports.resolve(report_id, &principal.id, None)?;
                (decision.record, decision.outcome, false)
            }
            ReportAction::Reject => {
                let decision = self.reports.reject(report_id, &principal.id)?;
                (decision.record, decision.outcome, false)
            }
            ReportAction::DeleteContent => {
                let resolution = self
                    .reports
                    .resolve_by_deleting_target(report_id, &principal.id)?;
                if let Some(item) = &resolution.removed {
                    self.record(
                        &principal.id,
                        ActivityAction::ContentDeleted,
                        content_subject(&item.id, item.kind()),
                        format!("{} {} deleted from report {report_id}", item.kind().label(), item.id),
                    );
                    self.after_removal(&principal.id, item);
                }
                (resolution.report, resolution.outcome, resolution.target_deleted)
            }
        };

        let message = report_message(&report, action, outcome);
        if outcome.changed_state() || outcome == ActionOutcome::AlreadyRemoved {
            let activity = match report.status {
                ReportStatus::Rejected => ActivityAction::ReportRejected,
                _ => ActivityAction::ReportResolved,
            };
            self.record(
                &principal.id,
                activity,
                format!("report:{report_id}"),
                message.clone(),
            );
            self.notify(Notice::ReportClosed {
                reporter: report.reporter.clone(),
                report: report.id.clone(),
                status: report.status,
                target_removed: target_deleted,
            });
            info!(
                report_id = %report_id,
                action = action.label(),
                outcome = outcome.label(),
                moderator = %principal.id,
                "report handled"
            );
        }

        Ok(ReportActionResult {
            report,
            action,
            outcome,
            target_deleted,
            message,
            refresh: true,
        })
    }

    /// Stores a change request for review. Only the linked account or a moderator may submit.
    pub fn submit_profile_change(
        &self,
        principal: &Principal,
        teacher_id: &TeacherId,
        changes: ProfileChanges,
    ) -> Result<ProfileSubmissionResult, ModerationError> {
        let profile = self.profiles.get(teacher_id)?;
        let owns_profile = profile.account.as_ref() == Some(&principal.id);
        if !owns_profile && !principal.can_moderate() {
            return Err(ModerationError::Forbidden);
        }

        let pending = self.profiles.submit(
            teacher_id,
            changes,
            &principal.id,
            self.config.resubmission,
        )?;
        let diff = differ::diff(&profile.fields, &pending.changes);

        self.record(
            &principal.id,
            ActivityAction::ProfileChangeSubmitted,
            format!("teacher:{teacher_id}"),
            format!(
                "profile change revision {} submitted for {}",
                pending.revision, profile.name
            ),
        );
        info!(teacher_id = %teacher_id, revision = pending.revision, "profile change submitted");
        Ok(ProfileSubmissionResult { pending, diff })
    }

    pub fn list_pending_profile_changes(
        &self,
        principal: &Principal,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<Page<PendingProfileChange>, ModerationError> {
        require_moderator(principal)?;
        let request = self.page_request(page, page_size, self.config.page_size);
        Ok(self
            .profiles
            .list_pending(request)?
            .into_page(self.config.max_visible_pages))
    }

    pub fn pending_profile_change(
        &self,
        principal: &Principal,
        teacher_id: &TeacherId,
    ) -> Result<Option<PendingProfileChange>, ModerationError> {
        require_moderator(principal)?;
        self.profiles.pending_diff(teacher_id)
    }

    /// Decides the change-set pending right now. Approval merges it; rejection discards it.
    pub fn review_profile_change(
        &self,
        principal: &Principal,
        teacher_id: &TeacherId,
        decision: ReviewDecision,
    ) -> Result<ProfileReviewResult, ModerationError> {
        require_moderator(principal)?;
        let review = self.profiles.review(teacher_id, decision)?;

        let mut message = match (review.outcome, decision) {
            (ActionOutcome::Applied, ReviewDecision::Approve) => format!(
                "profile changes for {} approved ({} field(s) updated)",
                review.profile.name,
                review.changed_fields.len()
            ),
            (ActionOutcome::Applied, ReviewDecision::Reject) => {
                format!("profile changes for {} rejected", review.profile.name)
            }
            _ => format!(
                "no undecided profile changes for {}",
                review.profile.name
            ),
        };
        if review.newer_submission_pending {
            message.push_str("; a newer submission is waiting for review");
        }

        if review.outcome.changed_state() {
            let action = match decision {
                ReviewDecision::Approve => ActivityAction::ProfileChangeApproved,
                ReviewDecision::Reject => ActivityAction::ProfileChangeRejected,
            };
            self.record(
                &principal.id,
                action,
                format!("teacher:{teacher_id}"),
                message.clone(),
            );
            info!(
                teacher_id = %teacher_id,
                decision = decision.label(),
                revision = ?review.revision,
                newer_submission_pending = review.newer_submission_pending,
                "profile change reviewed"
            );
        }

        Ok(ProfileReviewResult {
            review,
            message,
            refresh: true,
        })
    }

    pub fn submit_verification(
        &self,
        principal: &Principal,
        evidence: VerificationEvidence,
    ) -> Result<VerificationRequest, ModerationError> {
        let request = self.verifications.submit(&principal.id, evidence)?;
        self.record(
            &principal.id,
            ActivityAction::VerificationSubmitted,
            format!("verification:{}", request.id),
            format!(
                "{} verification submitted by {}",
                request.evidence.label(),
                principal.id
            ),
        );
        info!(request_id = %request.id, flavor = request.evidence.label(), "verification submitted");
        Ok(request)
    }

    pub fn decide_verification(
        &self,
        principal: &Principal,
        request_id: &VerificationId,
        decision: VerificationDecision,
    ) -> Result<VerificationDecisionResult, ModerationError> {
        require_moderator(principal)?;

        let (decided, profile): (Decision<VerificationRequest>, Option<TeacherProfile>) =
            match &decision {
                VerificationDecision::Approve => {
                    let approval = self.verifications.approve(request_id, &principal.id)?;
                    (approval.decision, approval.profile)
                }
                VerificationDecision::Reject { reason } => (
                    self.verifications
                        .reject(request_id, &principal.id, reason)?,
                    None,
                ),
            };

        let request = decided.record;
        let outcome = decided.outcome;
        let message = if outcome.changed_state() {
            format!("verification {request_id} {}", request.status.label())
        } else {
            format!(
                "verification {request_id} was already {}",
                request.status.label()
            )
        };

        if outcome.changed_state() {
            let action = match request.status {
                VerificationStatus::Rejected => ActivityAction::VerificationRejected,
                _ => ActivityAction::VerificationApproved,
            };
            self.record(
                &principal.id,
                action,
                format!("verification:{request_id}"),
                message.clone(),
            );
            self.notify(Notice::VerificationDecided {
                user: request.user.clone(),
                request: request.id.clone(),
                status: request.status,
                reason: request.rejection_reason.clone(),
            });
            info!(
                request_id = %request_id,
                status = request.status.label(),
                moderator = %principal.id,
                "verification decided"
            );
        }

        Ok(VerificationDecisionResult {
            request,
            outcome,
            profile,
            message,
            refresh: true,
        })
    }

    pub fn list_verifications(
        &self,
        principal: &Principal,
        status: Option<VerificationStatus>,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<Page<VerificationRequest>, ModerationError> {
        require_moderator(principal)?;
        let request = self.page_request(page, page_size, self.config.page_size);
        Ok(self
            .verifications
            .list(status, request)?
            .into_page(self.config.max_visible_pages))
    }

    /// Files a legal name change for the caller's own account.
    pub fn submit_name_change(
        &self,
        principal: &Principal,
        form: &NameChangeForm,
    ) -> Result<NameChangeRequest, ModerationError> {
        let request = self.accounts.submit_name_change(&principal.id, form)?;
        self.record(
            &principal.id,
            ActivityAction::NameChangeSubmitted,
            format!("name_change:{}", request.id),
            format!(
                "{} asked to be renamed from {} to {}",
                principal.id, request.current.display_name, request.proposed.display_name
            ),
        );
        info!(request_id = %request.id, user = %principal.id, "name change submitted");
        Ok(request)
    }

    /// The caller's most recent name change, if any.
    pub fn my_name_change(
        &self,
        principal: &Principal,
    ) -> Result<Option<NameChangeRequest>, ModerationError> {
        self.accounts.latest_name_change(&principal.id)
    }

    pub fn list_name_changes(
        &self,
        principal: &Principal,
        status: Option<RequestStatus>,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<Page<NameChangeRequest>, ModerationError> {
        require_moderator(principal)?;
        let request = self.page_request(page, page_size, self.config.page_size);
        Ok(self
            .accounts
            .list_name_changes(status, request)?
            .into_page(self.config.max_visible_pages))
    }

    pub fn decide_name_change(
        &self,
        principal: &Principal,
        request_id: &RequestId,
        decision: ReviewDecision,
        comment: Option<&str>,
    ) -> Result<AccountRequestResult<NameChangeRequest>, ModerationError> {
        require_moderator(principal)?;
        let decided =
            self.accounts
                .decide_name_change(request_id, &principal.id, decision, comment)?;
        let request = decided.record;
        let message = request_message("name change", request_id, request.status, decided.outcome);

        if decided.outcome.changed_state() {
            let action = match request.status {
                RequestStatus::Approved => ActivityAction::NameChangeApproved,
                _ => ActivityAction::NameChangeRejected,
            };
            self.record(
                &principal.id,
                action,
                format!("name_change:{request_id}"),
                message.clone(),
            );
            self.notify(Notice::NameChangeDecided {
                user: request.user.clone(),
                request: request.id.clone(),
                status: request.status,
                comment: request.review_comment.clone(),
            });
            info!(
                request_id = %request_id,
                status = request.status.label(),
                moderator = %principal.id,
                "name change decided"
            );
        }

        Ok(AccountRequestResult {
            request,
            outcome: decided.outcome,
            message,
            refresh: true,
        })
    }

    /// Asks to be linked to an existing teacher profile.
    pub fn submit_teacher_claim(
        &self,
        principal: &Principal,
        teacher_id: &TeacherId,
    ) -> Result<TeacherClaimRequest, ModerationError> {
        let claim = self.accounts.submit_teacher_claim(&principal.id, teacher_id)?;
        self.record(
            &principal.id,
            ActivityAction::TeacherClaimSubmitted,
            format!("teacher_claim:{}", claim.id),
            format!("{} claimed the profile of {}", principal.id, claim.teacher_name),
        );
        info!(request_id = %claim.id, teacher_id = %teacher_id, user = %principal.id, "teacher claim submitted");
        Ok(claim)
    }

    pub fn list_teacher_claims(
        &self,
        principal: &Principal,
        status: Option<RequestStatus>,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<Page<TeacherClaimRequest>, ModerationError> {
        require_moderator(principal)?;
        let request = self.page_request(page, page_size, self.config.page_size);
        Ok(self
            .accounts
            .list_teacher_claims(status, request)?
            .into_page(self.config.max_visible_pages))
    }

    pub fn decide_teacher_claim(
        &self,
        principal: &Principal,
        request_id: &RequestId,
        decision: ReviewDecision,
        notes: Option<&str>,
    ) -> Result<AccountRequestResult<TeacherClaimRequest>, ModerationError> {
        require_moderator(principal)?;
        let decided =
            self.accounts
                .decide_teacher_claim(request_id, &principal.id, decision, notes)?;
        let claim = decided.record;
        let message = request_message("teacher claim", request_id, claim.status, decided.outcome);

        if decided.outcome.changed_state() {
            let action = match claim.status {
                RequestStatus::Approved => ActivityAction::TeacherClaimApproved,
                _ => ActivityAction::TeacherClaimRejected,
            };
            self.record(
                &principal.id,
                action,
                format!("teacher_claim:{request_id}"),
                message.clone(),
            );
            self.notify(Notice::TeacherClaimDecided {
                user: claim.user.clone(),
                request: claim.id.clone(),
                teacher: claim.teacher_id.clone(),
                status: claim.status,
            });
            info!(
                request_id = %request_id,
                teacher_id = %claim.teacher_id,
                status = claim.status.label(),
                moderator = %principal.id,
                "teacher claim decided"
            );
        }

        Ok(AccountRequestResult {
            request: claim,
            outcome: decided.outcome,
            message,
            refresh: true,
        })
    }

    pub fn list_activity(
        &self,
        principal: &Principal,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<Page<ActivityView>, ModerationError> {
        require_moderator(principal)?;
        let request = self.page_request(page, page_size, self.config.page_size);
        Ok(activity_page(self.store.as_ref(), request)?.into_page(self.config.max_visible_pages))
    }

    pub fn statistics(&self, principal: &Principal) -> Result<ModerationStatistics, ModerationError> {
        require_moderator(principal)?;

        let mut stats = ModerationStatistics::default();
        for kind in ContentKind::ALL {
            stats.total_content += self.content.count(kind, None)?;
            stats.hidden_content += self.content.count(kind, Some(ContentStatus::Hidden))?;
            let pending = self.content.count(kind, Some(ContentStatus::Pending))?;
            match kind {
                ContentKind::Discussion => stats.pending_content.discussion = pending,
                ContentKind::Comment => stats.pending_content.comment = pending,
                ContentKind::Review => stats.pending_content.review = pending,
            }
        }
        stats.open_reports = self.reports.count_open()?;
        stats.pending_profile_changes = self.profiles.count_pending()?;
        stats.submitted_verifications = self
            .verifications
            .count(Some(VerificationStatus::Submitted))?;
        stats.pending_name_changes = self
            .accounts
            .count_name_changes(Some(RequestStatus::Pending))?;
        stats.pending_teacher_claims = self
            .accounts
            .count_teacher_claims(Some(RequestStatus::Pending))?;
        Ok(stats)
    }

    fn page_request(&self, page: Option<u32>, page_size: Option<u32>, fallback: u32) -> PageRequest {
        PageRequest::new(
            page.unwrap_or(1),
            self.config.page_size_for(page_size, fallback),
        )
    }

    /// Follow-up once an item is gone: recompute review metrics and close its open reports.
    /// The removal already committed, so failures here are logged, not returned.
    fn after_removal(&self, actor: &UserId, item: &ContentItem) -> usize {
        if let Some(review) = item.review() {
            self.refresh_teacher_metrics(&review.teacher_id);
        }

        let target = ReportTarget::content(&item.id, item.kind());
        match self
            .reports
            .resolve_for_target(&target, actor, "content removed by moderator")
        {
            Ok(resolved) => {
                for report in &resolved {
                    self.notify(Notice::ReportClosed {
                        reporter: report.reporter.clone(),
                        report: report.id.clone(),
                        status: report.status,
                        target_removed: true,
                    });
                }
                resolved.len()
            }
            Err(err) => {
                warn!(target = %target, error = %err, "failed to resolve reports for removed content");
                0
            }
        }
    }

    fn refresh_teacher_metrics(&self, teacher_id: &TeacherId) {
        let ratings = match self.content.reviews_for_teacher(teacher_id) {
            Ok(reviews) => reviews
                .iter()
                .filter_map(|item| item.review().map(|review| review.rating))
                .collect::<Vec<_>>(),
            Err(err) => {
                warn!(teacher_id = %teacher_id, error = %err, "failed to load reviews for metrics");
                return;
            }
        };

        match self.profiles.update_metrics(teacher_id, ratings) {
            Ok(profile) => debug!(
                teacher_id = %teacher_id,
                reviews = profile.metrics.reviews,
                avg_rating = profile.metrics.avg_rating,
                "teacher metrics recomputed"
            ),
            Err(ModerationError::NotFound { .. }) => {
                debug!(teacher_id = %teacher_id, "review references an unknown teacher profile")
            }
            Err(err) => warn!(teacher_id = %teacher_id, error = %err, "failed to update teacher metrics"),
        }
    }

    fn record(&self, actor: &UserId, action: ActivityAction, subject: String, description: String) {
        let entry = NewActivity::new(actor, action, subject, description);
        if let Err(err) = self.store.append_activity(entry) {
            warn!(action = action.label(), error = %err, "failed to append activity entry");
        }
    }

    fn notify(&self, notice: Notice) {
        let template = notice.template();
        let recipient = notice.recipient().clone();
        if let Err(err) = self.notifier.notify(notice) {
            warn!(template, recipient = %recipient, error = %err, "notification failed");
        }
    }
}

fn require_moderator(principal: &Principal) -> Result<(), ModerationError> {
    if principal.can_moderate() {
        Ok(())
    } else {
        Err(ModerationError::Forbidden)
    }
}

fn content_subject(id: &ContentId, kind: ContentKind) -> String {
    format!("{}:{id}", kind.label())
}

fn content_result(
    id: &ContentId,
    kind: ContentKind,
    decision: Decision<ContentItem>,
    message: String,
) -> ContentActionResult {
    ContentActionResult {
        id: id.clone(),
        kind,
        outcome: decision.outcome,
        item: Some(decision.record),
        message,
        reports_resolved: 0,
        refresh: true,
    }
}

fn report_message(report: &Report, action: ReportAction, outcome: ActionOutcome) -> String {
    match (action, outcome) {
        (_, ActionOutcome::AlreadyTerminal) => {
            format!("report {} was already {}", report.id, report.status.label())
        }
        (ReportAction::DeleteContent, ActionOutcome::AlreadyRemoved) => {
            format!("report {} resolved; content already removed", report.id)
        }
        (ReportAction::DeleteContent, _) => {
            format!("report {} resolved; content removed", report.id)
        }
        (ReportAction::Reject, _) => format!("report {} rejected", report.id),
        (ReportAction::Resolve, _) => format!("report {} resolved", report.id),
    }
}

fn request_message(
    what: &str,
    id: &RequestId,
    status: RequestStatus,
    outcome: ActionOutcome,
) -> String {
    if outcome.changed_state() {
        format!("{what} {id} {}", status.label())
    } else {
        format!("{what} {id} was already {}", status.label())
    }
}
