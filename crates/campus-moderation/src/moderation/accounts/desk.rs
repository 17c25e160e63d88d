use std::sync::Arc;

use chrono::Utc;

use crate::moderation::error::{Decision, ModerationError, ValidationError};
use crate::moderation::identity::UserId;
use crate::moderation::pagination::{Listing, PageRequest};
use crate::moderation::profiles::{ProfileRepository, ReviewDecision, TeacherId};
use crate::moderation::store::{RepositoryError, Transitioned};

use super::domain::{
    Account, NameChangeForm, NameChangeRequest, NewNameChange, NewTeacherClaim, RequestId,
    RequestStatus, RequestVerdict, TeacherClaimRequest,
};
use super::repository::AccountRequestRepository;

/// Name changes and teacher-profile claims: pending → approved | rejected; both terminal.
pub struct AccountRequestDesk<S> {
    store: Arc<S>,
}

impl<S> Clone for AccountRequestDesk<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> AccountRequestDesk<S>
where
    S: AccountRequestRepository + ProfileRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn account(&self, user: &UserId) -> Result<Account, ModerationError> {
        self.store
            .fetch_account(user)?
            .ok_or_else(|| ModerationError::not_found("account", user.0.as_str()))
    }

    /// Files a name change. One pending request per account; a proposal identical to the
    /// current name is refused.
    pub fn submit_name_change(
        &self,
        user: &UserId,
        form: &NameChangeForm,
    ) -> Result<NameChangeRequest, ModerationError> {
        let account = self.account(user)?;
        let proposed = form.validate()?;
        if proposed.same_legal_name(&account.name) {
            return Err(ValidationError::UnchangedName.into());
        }

        let request = NewNameChange {
            user: user.clone(),
            current: account.name,
            proposed,
            reason: form.trimmed_reason(),
            created_at: Utc::now(),
        };
        self.store.insert_name_change(request).map_err(|err| match err {
            RepositoryError::Conflict(_) => ModerationError::ConflictingUniqueConstraint(format!(
                "a name change for {user} is already waiting for review"
            )),
            other => ModerationError::from_repository(other, "account", user.0.as_str()),
        })
    }

    pub fn name_change(&self, id: &RequestId) -> Result<NameChangeRequest, ModerationError> {
        self.store
            .fetch_name_change(id)?
            .ok_or_else(|| ModerationError::not_found("name change request", id.0.as_str()))
    }

    pub fn latest_name_change(
        &self,
        user: &UserId,
    ) -> Result<Option<NameChangeRequest>, ModerationError> {
        Ok(self.store.latest_name_change(user)?)
    }

    /// Approval renames the account; rejection only closes the request.
    pub fn decide_name_change(
        &self,
        id: &RequestId,
        reviewer: &UserId,
        decision: ReviewDecision,
        comment: Option<&str>,
    ) -> Result<Decision<NameChangeRequest>, ModerationError> {
        let transitioned = self
            .store
            .decide_name_change(id, verdict(decision, reviewer, comment))
            .map_err(|err| ModerationError::from_repository(err, "account", id.0.as_str()))?
            .ok_or_else(|| ModerationError::not_found("name change request", id.0.as_str()))?;
        Ok(into_decision(transitioned))
    }

    pub fn list_name_changes(
        &self,
        status: Option<RequestStatus>,
        request: PageRequest,
    ) -> Result<Listing<NameChangeRequest>, ModerationError> {
        let total = self.store.count_name_changes(status)?;
        let slice = request.resolve(total);
        let items = self
            .store
            .list_name_changes(status, slice.offset, slice.limit())?;
        Ok(Listing { items, slice })
    }

    pub fn count_name_changes(&self, status: Option<RequestStatus>) -> Result<usize, ModerationError> {
        Ok(self.store.count_name_changes(status)?)
    }

    /// Files a claim on an unlinked teacher profile.
    pub fn submit_teacher_claim(
        &self,
        user: &UserId,
        teacher_id: &TeacherId,
    ) -> Result<TeacherClaimRequest, ModerationError> {
        let account = self.account(user)?;
        let profile = self
            .store
            .fetch_profile(teacher_id)?
            .ok_or_else(|| ModerationError::not_found("teacher", teacher_id.0.as_str()))?;

        match &profile.account {
            Some(owner) if owner == user => {
                return Err(ModerationError::ConflictingUniqueConstraint(format!(
                    "{user} is already linked to teacher {teacher_id}"
                )))
            }
            Some(_) => {
                return Err(ModerationError::ConflictingUniqueConstraint(format!(
                    "teacher {teacher_id} is already linked to another account"
                )))
            }
            None => {}
        }

        let claim = NewTeacherClaim {
            teacher_id: teacher_id.clone(),
            user: user.clone(),
            user_email: account.email,
            teacher_name: profile.name,
            created_at: Utc::now(),
        };
        self.store.insert_teacher_claim(claim).map_err(|err| match err {
            RepositoryError::Conflict(_) => ModerationError::ConflictingUniqueConstraint(format!(
                "a claim by {user} on teacher {teacher_id} is already waiting for review"
            )),
            other => ModerationError::from_repository(other, "teacher", teacher_id.0.as_str()),
        })
    }

    pub fn teacher_claim(&self, id: &RequestId) -> Result<TeacherClaimRequest, ModerationError> {
        self.store
            .fetch_teacher_claim(id)?
            .ok_or_else(|| ModerationError::not_found("teacher claim", id.0.as_str()))
    }

    /// Approval links the profile to the claimant; rejection only closes the claim.
    pub fn decide_teacher_claim(
        &self,
        id: &RequestId,
        reviewer: &UserId,
        decision: ReviewDecision,
        notes: Option<&str>,
    ) -> Result<Decision<TeacherClaimRequest>, ModerationError> {
        let transitioned = self
            .store
            .decide_teacher_claim(id, verdict(decision, reviewer, notes))
            .map_err(|err| match err {
                RepositoryError::Conflict(_) => ModerationError::ConflictingUniqueConstraint(
                    format!("teacher claim {id} targets a profile linked to another account"),
                ),
                other => ModerationError::from_repository(other, "teacher", id.0.as_str()),
            })?
            .ok_or_else(|| ModerationError::not_found("teacher claim", id.0.as_str()))?;
        Ok(into_decision(transitioned))
    }

    pub fn list_teacher_claims(
        &self,
        status: Option<RequestStatus>,
        request: PageRequest,
    ) -> Result<Listing<TeacherClaimRequest>, ModerationError> {
        let total = self.store.count_teacher_claims(status)?;
        let slice = request.resolve(total);
        let items = self
            .store
            .list_teacher_claims(status, slice.offset, slice.limit())?;
        Ok(Listing { items, slice })
    }

    pub fn count_teacher_claims(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<usize, ModerationError> {
        Ok(self.store.count_teacher_claims(status)?)
    }
}

fn verdict(decision: ReviewDecision, reviewer: &UserId, comment: Option<&str>) -> RequestVerdict {
    RequestVerdict {
        status: match decision {
            ReviewDecision::Approve => RequestStatus::Approved,
            ReviewDecision::Reject => RequestStatus::Rejected,
        },
        reviewer: reviewer.clone(),
        reviewed_at: Utc::now(),
        comment: comment
            .map(str::trim)
            .filter(|comment| !comment.is_empty())
            .map(str::to_string),
    }
}

fn into_decision<T>(transitioned: Transitioned<T>) -> Decision<T> {
    if transitioned.applied {
        Decision::applied(transitioned.record)
    } else {
        Decision::unchanged(transitioned.record)
    }
}
