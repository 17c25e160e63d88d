//! In-process store backing the HTTP service, the demo, and the tests.
//!
//! Every collection sits behind one mutex, so each repository call is atomic with respect to
//! every other call, which is what the compare-and-set style methods rely on.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::accounts::{
    Account, AccountRequestRepository, NameChangeRequest, NewNameChange, NewTeacherClaim,
    RequestId, RequestStatus, RequestVerdict, TeacherClaimRequest,
};
use super::activity::{ActivityEntry, ActivityLog, NewActivity};
use super::content::{
    feed_order, ContentDetails, ContentId, ContentItem, ContentKind, ContentRepository,
    ContentStatus, NewContent,
};
use super::identity::{UserDirectory, UserId};
use super::notify::{Notice, Notifier, NotifyError};
use super::profiles::{
    differ, CommitOutcome, PendingChanges, ProfileChanges, ProfileCommit, ProfileRepository,
    ResubmissionPolicy, ReviewDecision, ReviewMetrics, TeacherId, TeacherProfile,
};
use super::reports::{
    NewReport, Report, ReportClosure, ReportId, ReportRepository, ReportStatus, ReportTarget,
};
use super::store::{RepositoryError, Transitioned};
use super::verification::{
    NewVerification, ProfileVerification, VerificationId, VerificationRepository,
    VerificationRequest, VerificationStatus, VerificationVerdict,
};

#[derive(Default)]
struct StoreState {
    content: HashMap<ContentKind, BTreeMap<ContentId, ContentItem>>,
    reports: BTreeMap<ReportId, Report>,
    profiles: BTreeMap<TeacherId, TeacherProfile>,
    verifications: BTreeMap<VerificationId, VerificationRequest>,
    accounts: BTreeMap<UserId, Account>,
    name_changes: BTreeMap<RequestId, NameChangeRequest>,
    teacher_claims: BTreeMap<RequestId, TeacherClaimRequest>,
    activity: Vec<ActivityEntry>,
    users: BTreeSet<UserId>,
    sequence: u64,
}

impl StoreState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{prefix}-{:06}", self.sequence)
    }

    fn content_of(&self, kind: ContentKind) -> impl Iterator<Item = &ContentItem> {
        self.content.get(&kind).into_iter().flat_map(BTreeMap::values)
    }
}

/// Mutex-guarded collections implementing every moderation repository trait.
#[derive(Default)]
pub struct InMemoryModerationStore {
    state: Mutex<StoreState>,
}

impl InMemoryModerationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_user(&self, user: UserId) -> Result<(), RepositoryError> {
        self.state()?.users.insert(user);
        Ok(())
    }

    /// Registers `account` with its current name; later calls replace the record.
    pub fn register_account(&self, account: Account) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        state.users.insert(account.id.clone());
        state.accounts.insert(account.id.clone(), account);
        Ok(())
    }

    fn state(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }
}

fn content_prefix(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Discussion => "disc",
        ContentKind::Comment => "cmt",
        ContentKind::Review => "rev",
    }
}

fn same_semester(a: &str, b: &str) -> bool {
    differ::normalize_text(a).eq_ignore_ascii_case(&differ::normalize_text(b))
}

fn newest_first<T, K: Ord>(items: &mut [T], key: impl Fn(&T) -> K) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn window<T>(items: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
    items.into_iter().skip(offset).take(limit).collect()
}

impl ContentRepository for InMemoryModerationStore {
    fn insert_content(&self, item: NewContent) -> Result<ContentItem, RepositoryError> {
        let mut state = self.state()?;
        let kind = item.kind();

        if let ContentDetails::Review(review) = &item.details {
            let duplicate = state.content_of(ContentKind::Review).any(|existing| {
                existing.author == item.author
                    && existing.review().is_some_and(|other| {
                        other.teacher_id == review.teacher_id
                            && same_semester(&other.semester, &review.semester)
                    })
            });
            if duplicate {
                return Err(RepositoryError::Conflict(format!(
                    "review by {} for {} in {}",
                    item.author, review.teacher_id, review.semester
                )));
            }
        }

        let id = ContentId(state.next_id(content_prefix(kind)));
        let stored = ContentItem {
            id: id.clone(),
            author: item.author,
            created_at: item.created_at,
            status: ContentStatus::Pending,
            body: item.body,
            details: item.details,
        };
        state
            .content
            .entry(kind)
            .or_default()
            .insert(id, stored.clone());
        Ok(stored)
    }

    fn fetch_content(
        &self,
        id: &ContentId,
        kind: ContentKind,
    ) -> Result<Option<ContentItem>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .content
            .get(&kind)
            .and_then(|items| items.get(id))
            .cloned())
    }

    fn compare_and_set_status(
        &self,
        id: &ContentId,
        kind: ContentKind,
        expected: ContentStatus,
        next: ContentStatus,
    ) -> Result<Transitioned<ContentItem>, RepositoryError> {
        let mut state = self.state()?;
        let item = state
            .content
            .get_mut(&kind)
            .and_then(|items| items.get_mut(id))
            .ok_or(RepositoryError::NotFound)?;

        if item.status != expected {
            return Ok(Transitioned {
                record: item.clone(),
                applied: false,
            });
        }
        item.status = next;
        Ok(Transitioned {
            record: item.clone(),
            applied: true,
        })
    }

    fn delete_content(
        &self,
        id: &ContentId,
        kind: ContentKind,
    ) -> Result<Option<ContentItem>, RepositoryError> {
        let mut state = self.state()?;
        Ok(state.content.get_mut(&kind).and_then(|items| items.remove(id)))
    }

    fn list_content(
        &self,
        kind: ContentKind,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ContentItem>, RepositoryError> {
        let state = self.state()?;
        let mut items: Vec<ContentItem> = state.content_of(kind).cloned().collect();
        items.sort_by(feed_order);
        Ok(window(items, offset, limit))
    }

    fn count_content(
        &self,
        kind: ContentKind,
        status: Option<ContentStatus>,
    ) -> Result<usize, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .content_of(kind)
            .filter(|item| status.map_or(true, |status| item.status == status))
            .count())
    }

    fn reviews_for_teacher(
        &self,
        teacher: &TeacherId,
    ) -> Result<Vec<ContentItem>, RepositoryError> {
        let state = self.state()?;
        let mut reviews: Vec<ContentItem> = state
            .content_of(ContentKind::Review)
            .filter(|item| item.review().is_some_and(|review| &review.teacher_id == teacher))
            .cloned()
            .collect();
        reviews.sort_by(feed_order);
        Ok(reviews)
    }
}

impl ReportRepository for InMemoryModerationStore {
    fn insert_report(&self, report: NewReport) -> Result<Report, RepositoryError> {
        let mut state = self.state()?;
        let duplicate = state
            .reports
            .values()
            .any(|existing| existing.reporter == report.reporter && existing.target == report.target);
        if duplicate {
            return Err(RepositoryError::Conflict(format!(
                "{} already reported {}",
                report.reporter, report.target
            )));
        }

        let id = ReportId(state.next_id("rpt"));
        let stored = Report {
            id: id.clone(),
            reporter: report.reporter,
            target: report.target,
            reason: report.reason,
            status: ReportStatus::Open,
            created_at: report.created_at,
            handled_by: None,
            handled_at: None,
            resolution_note: None,
        };
        state.reports.insert(id, stored.clone());
        Ok(stored)
    }

    fn fetch_report(&self, id: &ReportId) -> Result<Option<Report>, RepositoryError> {
        Ok(self.state()?.reports.get(id).cloned())
    }

    fn close_report(
        &self,
        id: &ReportId,
        closure: ReportClosure,
    ) -> Result<Option<Transitioned<Report>>, RepositoryError> {
        let mut state = self.state()?;
        let Some(report) = state.reports.get_mut(id) else {
            return Ok(None);
        };

        if report.status.is_terminal() {
            return Ok(Some(Transitioned {
                record: report.clone(),
                applied: false,
            }));
        }

        report.status = closure.status;
        report.handled_by = Some(closure.handled_by);
        report.handled_at = Some(closure.handled_at);
        report.resolution_note = closure.note;
        Ok(Some(Transitioned {
            record: report.clone(),
            applied: true,
        }))
    }

    fn list_open_reports(&self, offset: usize, limit: usize) -> Result<Vec<Report>, RepositoryError> {
        let state = self.state()?;
        let mut open: Vec<Report> = state
            .reports
            .values()
            .filter(|report| report.status == ReportStatus::Open)
            .cloned()
            .collect();
        newest_first(&mut open, |report| (report.created_at, report.id.clone()));
        Ok(window(open, offset, limit))
    }

    fn count_open_reports(&self) -> Result<usize, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .reports
            .values()
            .filter(|report| report.status == ReportStatus::Open)
            .count())
    }

    fn open_reports_for_target(&self, target: &ReportTarget) -> Result<Vec<Report>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .reports
            .values()
            .filter(|report| report.status == ReportStatus::Open && &report.target == target)
            .cloned()
            .collect())
    }

    fn reports_by_reporter(&self, reporter: &UserId) -> Result<Vec<Report>, RepositoryError> {
        let state = self.state()?;
        let mut reports: Vec<Report> = state
            .reports
            .values()
            .filter(|report| &report.reporter == reporter)
            .cloned()
            .collect();
        newest_first(&mut reports, |report| (report.created_at, report.id.clone()));
        Ok(reports)
    }
}

impl ProfileRepository for InMemoryModerationStore {
    fn fetch_profile(&self, id: &TeacherId) -> Result<Option<TeacherProfile>, RepositoryError> {
        Ok(self.state()?.profiles.get(id).cloned())
    }

    fn insert_profile(&self, profile: TeacherProfile) -> Result<TeacherProfile, RepositoryError> {
        let mut state = self.state()?;
        if state.profiles.contains_key(&profile.id) {
            return Err(RepositoryError::Conflict(format!("teacher {}", profile.id)));
        }
        state.profiles.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    fn store_pending_changes(
        &self,
        id: &TeacherId,
        changes: ProfileChanges,
        submitted_by: &UserId,
        policy: ResubmissionPolicy,
    ) -> Result<PendingChanges, RepositoryError> {
        let mut state = self.state()?;
        let profile = state.profiles.get_mut(id).ok_or(RepositoryError::NotFound)?;

        if policy == ResubmissionPolicy::RejectWhilePending && profile.pending_changes.is_some() {
            return Err(RepositoryError::Conflict(format!(
                "teacher {id} already has pending changes"
            )));
        }

        let pending = PendingChanges {
            revision: profile.next_revision(),
            submitted_at: Utc::now(),
            submitted_by: submitted_by.clone(),
            changes,
        };
        profile.pending_changes = Some(pending.clone());
        Ok(pending)
    }

    fn commit_profile_review(
        &self,
        id: &TeacherId,
        reviewed: &PendingChanges,
        decision: ReviewDecision,
    ) -> Result<ProfileCommit, RepositoryError> {
        let mut state = self.state()?;
        let profile = state.profiles.get_mut(id).ok_or(RepositoryError::NotFound)?;

        let current_revision = profile.pending_changes.as_ref().map(|pending| pending.revision);
        let already_decided = profile
            .reviewed_revision
            .is_some_and(|decided| decided >= reviewed.revision);
        if already_decided || current_revision.is_none() {
            return Ok(ProfileCommit {
                profile: profile.clone(),
                outcome: CommitOutcome::AlreadyDecided,
                newer_submission_pending: current_revision.is_some_and(|rev| rev > reviewed.revision),
            });
        }

        if decision == ReviewDecision::Approve {
            profile.fields = differ::apply(&profile.fields, &reviewed.changes);
        }

        let newer_submission_pending = current_revision != Some(reviewed.revision);
        if !newer_submission_pending {
            profile.pending_changes = None;
        }
        profile.reviewed_revision = Some(reviewed.revision);
        profile.updated_at = Utc::now();

        Ok(ProfileCommit {
            profile: profile.clone(),
            outcome: CommitOutcome::Committed,
            newer_submission_pending,
        })
    }

    fn update_metrics(
        &self,
        id: &TeacherId,
        metrics: ReviewMetrics,
    ) -> Result<TeacherProfile, RepositoryError> {
        let mut state = self.state()?;
        let profile = state.profiles.get_mut(id).ok_or(RepositoryError::NotFound)?;
        profile.metrics = metrics;
        Ok(profile.clone())
    }

    fn list_pending_profiles(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<TeacherProfile>, RepositoryError> {
        let state = self.state()?;
        let mut pending: Vec<TeacherProfile> = state
            .profiles
            .values()
            .filter(|profile| profile.pending_changes.is_some())
            .cloned()
            .collect();
        newest_first(&mut pending, |profile| {
            (
                profile.pending_changes.as_ref().map(|pending| pending.submitted_at),
                profile.id.clone(),
            )
        });
        Ok(window(pending, offset, limit))
    }

    fn count_pending_profiles(&self) -> Result<usize, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .profiles
            .values()
            .filter(|profile| profile.pending_changes.is_some())
            .count())
    }
}

impl VerificationRepository for InMemoryModerationStore {
    fn insert_verification(
        &self,
        request: NewVerification,
    ) -> Result<VerificationRequest, RepositoryError> {
        let mut state = self.state()?;
        let id = VerificationId(state.next_id("ver"));
        let stored = VerificationRequest {
            id: id.clone(),
            user: request.user,
            evidence: request.evidence,
            status: VerificationStatus::Submitted,
            reviewer: None,
            reviewed_at: None,
            rejection_reason: None,
            submitted_at: request.submitted_at,
        };
        state.verifications.insert(id, stored.clone());
        Ok(stored)
    }

    fn fetch_verification(
        &self,
        id: &VerificationId,
    ) -> Result<Option<VerificationRequest>, RepositoryError> {
        Ok(self.state()?.verifications.get(id).cloned())
    }

    fn decide_verification(
        &self,
        id: &VerificationId,
        verdict: VerificationVerdict,
    ) -> Result<Option<Transitioned<VerificationRequest>>, RepositoryError> {
        let mut state = self.state()?;
        let Some(request) = state.verifications.get_mut(id) else {
            return Ok(None);
        };

        if request.status.is_terminal() {
            return Ok(Some(Transitioned {
                record: request.clone(),
                applied: false,
            }));
        }

        request.status = verdict.status;
        request.reviewer = Some(verdict.reviewer);
        request.reviewed_at = Some(verdict.reviewed_at);
        request.rejection_reason = verdict.rejection_reason;
        Ok(Some(Transitioned {
            record: request.clone(),
            applied: true,
        }))
    }

    fn approve_profile_verification(
        &self,
        id: &VerificationId,
        verdict: VerificationVerdict,
        teacher_id: &TeacherId,
        changes: &ProfileChanges,
    ) -> Result<Option<ProfileVerification>, RepositoryError> {
        let mut guard = self.state()?;
        let state = &mut *guard;
        let Some(request) = state.verifications.get_mut(id) else {
            return Ok(None);
        };

        if request.status.is_terminal() {
            return Ok(Some(ProfileVerification {
                request: Transitioned {
                    record: request.clone(),
                    applied: false,
                },
                profile: None,
            }));
        }

        let profile = state
            .profiles
            .get_mut(teacher_id)
            .ok_or(RepositoryError::NotFound)?;
        profile.fields = differ::apply(&profile.fields, changes);
        profile.updated_at = verdict.reviewed_at;

        request.status = verdict.status;
        request.reviewer = Some(verdict.reviewer);
        request.reviewed_at = Some(verdict.reviewed_at);
        request.rejection_reason = verdict.rejection_reason;
        Ok(Some(ProfileVerification {
            request: Transitioned {
                record: request.clone(),
                applied: true,
            },
            profile: Some(profile.clone()),
        }))
    }

    fn list_verifications(
        &self,
        status: Option<VerificationStatus>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<VerificationRequest>, RepositoryError> {
        let state = self.state()?;
        let mut requests: Vec<VerificationRequest> = state
            .verifications
            .values()
            .filter(|request| status.map_or(true, |status| request.status == status))
            .cloned()
            .collect();
        newest_first(&mut requests, |request| (request.submitted_at, request.id.clone()));
        Ok(window(requests, offset, limit))
    }

    fn count_verifications(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<usize, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .verifications
            .values()
            .filter(|request| status.map_or(true, |status| request.status == status))
            .count())
    }
}

fn with_status(status: Option<RequestStatus>, actual: RequestStatus) -> bool {
    status.map_or(true, |status| status == actual)
}

impl AccountRequestRepository for InMemoryModerationStore {
    fn fetch_account(&self, user: &UserId) -> Result<Option<Account>, RepositoryError> {
        Ok(self.state()?.accounts.get(user).cloned())
    }

    fn insert_name_change(
        &self,
        request: NewNameChange,
    ) -> Result<NameChangeRequest, RepositoryError> {
        let mut state = self.state()?;
        let pending = state.name_changes.values().any(|existing| {
            existing.user == request.user && existing.status == RequestStatus::Pending
        });
        if pending {
            return Err(RepositoryError::Conflict(format!(
                "pending name change for {}",
                request.user
            )));
        }

        let id = RequestId(state.next_id("name"));
        let stored = NameChangeRequest {
            id: id.clone(),
            user: request.user,
            current: request.current,
            proposed: request.proposed,
            reason: request.reason,
            status: RequestStatus::Pending,
            reviewer: None,
            review_comment: None,
            reviewed_at: None,
            created_at: request.created_at,
        };
        state.name_changes.insert(id, stored.clone());
        Ok(stored)
    }

    fn fetch_name_change(&self, id: &RequestId) -> Result<Option<NameChangeRequest>, RepositoryError> {
        Ok(self.state()?.name_changes.get(id).cloned())
    }

    fn latest_name_change(
        &self,
        user: &UserId,
    ) -> Result<Option<NameChangeRequest>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .name_changes
            .values()
            .filter(|request| &request.user == user)
            .max_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)))
            .cloned())
    }

    fn decide_name_change(
        &self,
        id: &RequestId,
        verdict: RequestVerdict,
    ) -> Result<Option<Transitioned<NameChangeRequest>>, RepositoryError> {
        let mut guard = self.state()?;
        let state = &mut *guard;
        let Some(request) = state.name_changes.get_mut(id) else {
            return Ok(None);
        };

        if request.status.is_terminal() {
            return Ok(Some(Transitioned {
                record: request.clone(),
                applied: false,
            }));
        }

        if verdict.status == RequestStatus::Approved {
            let account = state
                .accounts
                .get_mut(&request.user)
                .ok_or(RepositoryError::NotFound)?;
            account.name = request.proposed.clone();
        }

        request.status = verdict.status;
        request.reviewer = Some(verdict.reviewer);
        request.review_comment = verdict.comment;
        request.reviewed_at = Some(verdict.reviewed_at);
        Ok(Some(Transitioned {
            record: request.clone(),
            applied: true,
        }))
    }

    fn list_name_changes(
        &self,
        status: Option<RequestStatus>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<NameChangeRequest>, RepositoryError> {
        let state = self.state()?;
        let mut requests: Vec<NameChangeRequest> = state
            .name_changes
            .values()
            .filter(|request| with_status(status, request.status))
            .cloned()
            .collect();
        newest_first(&mut requests, |request| (request.created_at, request.id.clone()));
        Ok(window(requests, offset, limit))
    }

    fn count_name_changes(&self, status: Option<RequestStatus>) -> Result<usize, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .name_changes
            .values()
            .filter(|request| with_status(status, request.status))
            .count())
    }

    fn insert_teacher_claim(
        &self,
        claim: NewTeacherClaim,
    ) -> Result<TeacherClaimRequest, RepositoryError> {
        let mut state = self.state()?;
        let pending = state.teacher_claims.values().any(|existing| {
            existing.user == claim.user
                && existing.teacher_id == claim.teacher_id
                && existing.status == RequestStatus::Pending
        });
        if pending {
            return Err(RepositoryError::Conflict(format!(
                "pending claim by {} on {}",
                claim.user, claim.teacher_id
            )));
        }

        let id = RequestId(state.next_id("claim"));
        let stored = TeacherClaimRequest {
            id: id.clone(),
            teacher_id: claim.teacher_id,
            user: claim.user,
            user_email: claim.user_email,
            teacher_name: claim.teacher_name,
            status: RequestStatus::Pending,
            admin_notes: None,
            processed_by: None,
            processed_at: None,
            created_at: claim.created_at,
        };
        state.teacher_claims.insert(id, stored.clone());
        Ok(stored)
    }

    fn fetch_teacher_claim(
        &self,
        id: &RequestId,
    ) -> Result<Option<TeacherClaimRequest>, RepositoryError> {
        Ok(self.state()?.teacher_claims.get(id).cloned())
    }

    fn decide_teacher_claim(
        &self,
        id: &RequestId,
        verdict: RequestVerdict,
    ) -> Result<Option<Transitioned<TeacherClaimRequest>>, RepositoryError> {
        let mut guard = self.state()?;
        let state = &mut *guard;
        let Some(claim) = state.teacher_claims.get_mut(id) else {
            return Ok(None);
        };

        if claim.status.is_terminal() {
            return Ok(Some(Transitioned {
                record: claim.clone(),
                applied: false,
            }));
        }

        if verdict.status == RequestStatus::Approved {
            let profile = state
                .profiles
                .get_mut(&claim.teacher_id)
                .ok_or(RepositoryError::NotFound)?;
            if let Some(owner) = profile.account.as_ref().filter(|owner| **owner != claim.user) {
                return Err(RepositoryError::Conflict(format!(
                    "{} is linked to {owner}",
                    claim.teacher_id
                )));
            }
            profile.account = Some(claim.user.clone());
            profile.updated_at = verdict.reviewed_at;
        }

        claim.status = verdict.status;
        claim.admin_notes = verdict.comment;
        claim.processed_by = Some(verdict.reviewer);
        claim.processed_at = Some(verdict.reviewed_at);
        Ok(Some(Transitioned {
            record: claim.clone(),
            applied: true,
        }))
    }

    fn list_teacher_claims(
        &self,
        status: Option<RequestStatus>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<TeacherClaimRequest>, RepositoryError> {
        let state = self.state()?;
        let mut claims: Vec<TeacherClaimRequest> = state
            .teacher_claims
            .values()
            .filter(|claim| with_status(status, claim.status))
            .cloned()
            .collect();
        newest_first(&mut claims, |claim| (claim.created_at, claim.id.clone()));
        Ok(window(claims, offset, limit))
    }

    fn count_teacher_claims(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<usize, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .teacher_claims
            .values()
            .filter(|claim| with_status(status, claim.status))
            .count())
    }
}

impl ActivityLog for InMemoryModerationStore {
    fn append_activity(&self, entry: NewActivity) -> Result<ActivityEntry, RepositoryError> {
        let mut state = self.state()?;
        let stored = ActivityEntry {
            id: state.activity.len() as u64 + 1,
            actor: entry.actor,
            action: entry.action,
            description: entry.description,
            subject: entry.subject,
            created_at: Utc::now(),
        };
        state.activity.push(stored.clone());
        Ok(stored)
    }

    fn list_activity(&self, offset: usize, limit: usize) -> Result<Vec<ActivityEntry>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .activity
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn count_activity(&self) -> Result<usize, RepositoryError> {
        Ok(self.state()?.activity.len())
    }
}

impl UserDirectory for InMemoryModerationStore {
    fn user_exists(&self, user: &UserId) -> Result<bool, RepositoryError> {
        Ok(self.state()?.users.contains(user))
    }
}

/// Notifier that keeps every notice in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .map_err(|_| NotifyError::Transport("notice buffer poisoned".to_string()))?
            .push(notice);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::profiles::ProfileFields;
    use crate::moderation::reports::ReportTargetKind;
    use chrono::TimeZone;

    fn profile() -> TeacherProfile {
        TeacherProfile::new(
            "t-1",
            "Dr. Koval",
            ProfileFields {
                bio: "A".to_string(),
                phone: "000".to_string(),
                ..ProfileFields::default()
            },
        )
    }

    #[test]
    fn duplicate_reviews_for_the_same_semester_conflict() {
        let store = InMemoryModerationStore::new();
        let review = |semester: &str| NewContent {
            author: UserId::new("s-1"),
            body: "Clear lectures".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap(),
            details: ContentDetails::Review(crate::moderation::content::ReviewDetails {
                teacher_id: TeacherId::new("t-1"),
                rating: 9,
                semester: semester.to_string(),
                anonymous: true,
            }),
        };

        store.insert_content(review("2024 Spring")).expect("first review");
        assert!(matches!(
            store.insert_content(review(" 2024  spring")),
            Err(RepositoryError::Conflict(_))
        ));
        store.insert_content(review("2024 Fall")).expect("other semester");
    }

    #[test]
    fn closing_a_report_twice_leaves_the_first_closure() {
        let store = InMemoryModerationStore::new();
        let report = store
            .insert_report(NewReport::new(
                UserId::new("s-1"),
                ReportTarget::new("u-2", ReportTargetKind::User),
                Some("spam"),
                Utc::now(),
            ))
            .expect("inserted");

        let closure = |status, actor: &str| ReportClosure {
            status,
            handled_by: UserId::new(actor),
            handled_at: Utc::now(),
            note: None,
        };
        let first = store
            .close_report(&report.id, closure(ReportStatus::Resolved, "mod-1"))
            .expect("closes")
            .expect("present");
        assert!(first.applied);

        let second = store
            .close_report(&report.id, closure(ReportStatus::Rejected, "mod-2"))
            .expect("closes")
            .expect("present");
        assert!(!second.applied);
        assert_eq!(second.record.status, ReportStatus::Resolved);
        assert_eq!(second.record.handled_by, Some(UserId::new("mod-1")));
    }

    #[test]
    fn review_commit_keeps_a_newer_submission_pending() {
        let store = InMemoryModerationStore::new();
        store.insert_profile(profile()).expect("inserted");
        let teacher = TeacherId::new("t-1");
        let author = UserId::new("teacher-account");

        let first = store
            .store_pending_changes(
                &teacher,
                ProfileChanges {
                    bio: Some("B".to_string()),
                    ..ProfileChanges::default()
                },
                &author,
                ResubmissionPolicy::Overwrite,
            )
            .expect("stored");
        let second = store
            .store_pending_changes(
                &teacher,
                ProfileChanges {
                    phone: Some("111".to_string()),
                    ..ProfileChanges::default()
                },
                &author,
                ResubmissionPolicy::Overwrite,
            )
            .expect("stored");
        assert_eq!(second.revision, first.revision + 1);

        let commit = store
            .commit_profile_review(&teacher, &first, ReviewDecision::Approve)
            .expect("committed");
        assert_eq!(commit.outcome, CommitOutcome::Committed);
        assert!(commit.newer_submission_pending);
        assert_eq!(commit.profile.fields.bio, "B");
        assert_eq!(commit.profile.fields.phone, "000");
        assert_eq!(
            commit.profile.pending_changes.map(|pending| pending.revision),
            Some(second.revision)
        );

        let repeat = store
            .commit_profile_review(&teacher, &first, ReviewDecision::Reject)
            .expect("repeat");
        assert_eq!(repeat.outcome, CommitOutcome::AlreadyDecided);
    }

    #[test]
    fn reject_while_pending_refuses_a_second_submission() {
        let store = InMemoryModerationStore::new();
        store.insert_profile(profile()).expect("inserted");
        let teacher = TeacherId::new("t-1");
        let author = UserId::new("teacher-account");
        let changes = ProfileChanges {
            bio: Some("B".to_string()),
            ..ProfileChanges::default()
        };

        store
            .store_pending_changes(&teacher, changes.clone(), &author, ResubmissionPolicy::RejectWhilePending)
            .expect("first submission");
        assert!(matches!(
            store.store_pending_changes(&teacher, changes, &author, ResubmissionPolicy::RejectWhilePending),
            Err(RepositoryError::Conflict(_))
        ));
    }
}
