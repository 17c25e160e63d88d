use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::accounts::{NameChangeForm, RequestId, RequestStatus};
use super::content::{ContentDetails, ContentFilter, ContentId, ContentKind, NewContent};
use super::error::ModerationError;
use super::identity::{Principal, Role};
use super::notify::Notifier;
use super::orchestrator::{ModerationOrchestrator, ReportAction};
use super::profiles::{ProfileChanges, ReviewDecision, TeacherId};
use super::reports::{ReportId, ReportTarget, ReportTargetKind};
use super::store::ModerationStore;
use super::verification::{
    VerificationDecision, VerificationEvidence, VerificationId, VerificationStatus,
};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

type Orchestrator<S, N> = Arc<ModerationOrchestrator<S, N>>;

/// Router exposing the console-facing and author-facing moderation endpoints.
pub fn moderation_router<S, N>(orchestrator: Orchestrator<S, N>) -> Router
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route("/api/v1/content", post(create_content_handler::<S, N>))
        .route("/api/v1/reports", post(create_report_handler::<S, N>))
        .route("/api/v1/reports/mine", get(my_reports_handler::<S, N>))
        .route(
            "/api/v1/teachers/:teacher_id/changes",
            post(submit_profile_change_handler::<S, N>),
        )
        .route(
            "/api/v1/verifications",
            post(submit_verification_handler::<S, N>),
        )
        .route(
            "/api/v1/name-changes",
            post(submit_name_change_handler::<S, N>),
        )
        .route(
            "/api/v1/name-changes/mine",
            get(my_name_change_handler::<S, N>),
        )
        .route(
            "/api/v1/teacher-claims",
            post(submit_teacher_claim_handler::<S, N>),
        )
        .route("/api/v1/admin/queue", get(queue_handler::<S, N>))
        .route(
            "/api/v1/admin/content/:kind/:content_id/approve",
            post(approve_handler::<S, N>),
        )
        .route(
            "/api/v1/admin/content/:kind/:content_id/hide",
            post(hide_handler::<S, N>),
        )
        .route(
            "/api/v1/admin/content/:kind/:content_id",
            delete(delete_handler::<S, N>),
        )
        .route(
            "/api/v1/admin/bulk-delete/:kind",
            post(bulk_delete_handler::<S, N>),
        )
        .route("/api/v1/admin/reports", get(open_reports_handler::<S, N>))
        .route(
            "/api/v1/admin/reports/:report_id/actions",
            post(report_action_handler::<S, N>),
        )
        .route(
            "/api/v1/admin/profile-changes",
            get(pending_profiles_handler::<S, N>),
        )
        .route(
            "/api/v1/admin/profile-changes/:teacher_id",
            get(pending_profile_handler::<S, N>),
        )
        .route(
            "/api/v1/admin/profile-changes/:teacher_id/review",
            post(review_profile_handler::<S, N>),
        )
        .route(
            "/api/v1/admin/verifications",
            get(verifications_handler::<S, N>),
        )
        .route(
            "/api/v1/admin/verifications/:request_id/decision",
            post(decide_verification_handler::<S, N>),
        )
        .route(
            "/api/v1/admin/name-changes",
            get(name_changes_handler::<S, N>),
        )
        .route(
            "/api/v1/admin/name-changes/:request_id/decision",
            post(decide_name_change_handler::<S, N>),
        )
        .route(
            "/api/v1/admin/teacher-claims",
            get(teacher_claims_handler::<S, N>),
        )
        .route(
            "/api/v1/admin/teacher-claims/:request_id/decision",
            post(decide_teacher_claim_handler::<S, N>),
        )
        .route("/api/v1/admin/activity", get(activity_handler::<S, N>))
        .route("/api/v1/admin/statistics", get(statistics_handler::<S, N>))
        .with_state(orchestrator)
}

/// Query string shared by the paginated admin listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub kind: Option<String>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ContentDraft {
    #[serde(default)]
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub details: ContentDetails,
}

#[derive(Debug, Deserialize)]
pub struct ReportPayload {
    pub target_id: String,
    pub target_kind: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeletePayload {
    pub ids: Vec<ContentId>,
}

#[derive(Debug, Deserialize)]
pub struct ReportActionPayload {
    pub action: ReportAction,
}

#[derive(Debug, Deserialize)]
pub struct ProfileReviewPayload {
    pub decision: ReviewDecision,
}

#[derive(Debug, Deserialize)]
pub struct TeacherClaimPayload {
    pub teacher_id: TeacherId,
}

/// Decision on a name change or teacher claim; `comment` is stored as the review note.
#[derive(Debug, Deserialize)]
pub struct AccountRequestDecisionPayload {
    pub decision: ReviewDecision,
    #[serde(default, alias = "notes")]
    pub comment: Option<String>,
}

/// Reads the trusted actor headers set by the session layer.
pub fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, Response> {
    let id = headers
        .get(ACTOR_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| error_body(StatusCode::UNAUTHORIZED, "missing x-actor-id header"))?;

    let role = headers
        .get(ACTOR_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| error_body(StatusCode::UNAUTHORIZED, "missing x-actor-role header"))?
        .parse::<Role>()
        .map_err(|err| error_body(StatusCode::UNAUTHORIZED, &err.to_string()))?;

    Ok(Principal::new(id, role))
}

pub fn status_for(error: &ModerationError) -> StatusCode {
    match error {
        ModerationError::NotFound { .. } => StatusCode::NOT_FOUND,
        ModerationError::ConflictingUniqueConstraint(_) => StatusCode::CONFLICT,
        ModerationError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ModerationError::Forbidden => StatusCode::FORBIDDEN,
        ModerationError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, ModerationError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_body(status_for(&error), &error.to_string()),
    }
}

fn parse_or_422<T>(raw: &str) -> Result<T, Response>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|err| error_body(StatusCode::UNPROCESSABLE_ENTITY, &err.to_string()))
}

macro_rules! principal_or_return {
    ($headers:expr) => {
        match principal_from_headers(&$headers) {
            Ok(principal) => principal,
            Err(response) => return response,
        }
    };
}

macro_rules! parsed_or_return {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(response) => return response,
        }
    };
}

pub(crate) async fn create_content_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Json(draft): Json<ContentDraft>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    let item = NewContent {
        author: principal.id.clone(),
        body: draft.body,
        created_at: draft.created_at.unwrap_or_else(Utc::now),
        details: draft.details,
    };
    respond(
        StatusCode::CREATED,
        orchestrator.create_content(&principal, item),
    )
}

pub(crate) async fn create_report_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Json(payload): Json<ReportPayload>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    let kind: ReportTargetKind = parsed_or_return!(parse_or_422(&payload.target_kind));
    let target = ReportTarget::new(payload.target_id.trim(), kind);
    respond(
        StatusCode::CREATED,
        orchestrator.create_report(&principal, target, payload.reason.as_deref()),
    )
}

pub(crate) async fn my_reports_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    respond(
        StatusCode::OK,
        orchestrator
            .list_my_reports(&principal)
            .map(|reports| json!({ "reports": reports })),
    )
}

pub(crate) async fn submit_profile_change_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Path(teacher_id): Path<String>,
    Json(changes): Json<ProfileChanges>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    respond(
        StatusCode::ACCEPTED,
        orchestrator.submit_profile_change(&principal, &TeacherId(teacher_id), changes),
    )
}

pub(crate) async fn submit_verification_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Json(evidence): Json<VerificationEvidence>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    respond(
        StatusCode::CREATED,
        orchestrator.submit_verification(&principal, evidence),
    )
}

pub(crate) async fn queue_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    let filter: ContentFilter =
        parsed_or_return!(parse_or_422(query.kind.as_deref().unwrap_or("all")));
    respond(
        StatusCode::OK,
        orchestrator.list_moderation_queue(&principal, filter, query.page, query.page_size),
    )
}

pub(crate) async fn approve_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Path((kind, content_id)): Path<(String, String)>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    let kind: ContentKind = parsed_or_return!(parse_or_422(&kind));
    respond(
        StatusCode::OK,
        orchestrator.approve_item(&principal, &ContentId(content_id), kind),
    )
}

pub(crate) async fn hide_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Path((kind, content_id)): Path<(String, String)>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    let kind: ContentKind = parsed_or_return!(parse_or_422(&kind));
    respond(
        StatusCode::OK,
        orchestrator.hide_item(&principal, &ContentId(content_id), kind),
    )
}

pub(crate) async fn delete_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Path((kind, content_id)): Path<(String, String)>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    let kind: ContentKind = parsed_or_return!(parse_or_422(&kind));
    respond(
        StatusCode::OK,
        orchestrator.delete_item(&principal, &ContentId(content_id), kind),
    )
}

pub(crate) async fn bulk_delete_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Path(kind): Path<String>,
    Json(payload): Json<BulkDeletePayload>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    let kind: ContentKind = parsed_or_return!(parse_or_422(&kind));
    respond(
        StatusCode::OK,
        orchestrator.bulk_delete(&principal, &payload.ids, kind),
    )
}

pub(crate) async fn open_reports_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    respond(
        StatusCode::OK,
        orchestrator.list_open_reports(&principal, query.page, query.page_size),
    )
}

pub(crate) async fn report_action_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Path(report_id): Path<String>,
    Json(payload): Json<ReportActionPayload>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    respond(
        StatusCode::OK,
        orchestrator.handle_report_action(&principal, &ReportId(report_id), payload.action),
    )
}

pub(crate) async fn pending_profiles_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    respond(
        StatusCode::OK,
        orchestrator.list_pending_profile_changes(&principal, query.page, query.page_size),
    )
}

pub(crate) async fn pending_profile_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Path(teacher_id): Path<String>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    let teacher_id = TeacherId(teacher_id);
    match orchestrator.pending_profile_change(&principal, &teacher_id) {
        Ok(Some(pending)) => (StatusCode::OK, Json(pending)).into_response(),
        Ok(None) => error_body(
            StatusCode::NOT_FOUND,
            &format!("teacher '{teacher_id}' has no pending changes"),
        ),
        Err(error) => error_body(status_for(&error), &error.to_string()),
    }
}

pub(crate) async fn review_profile_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Path(teacher_id): Path<String>,
    Json(payload): Json<ProfileReviewPayload>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    respond(
        StatusCode::OK,
        orchestrator.review_profile_change(&principal, &TeacherId(teacher_id), payload.decision),
    )
}

pub(crate) async fn verifications_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    let status: Option<VerificationStatus> = match query.status.as_deref() {
        Some(raw) => Some(parsed_or_return!(parse_or_422(raw))),
        None => None,
    };
    respond(
        StatusCode::OK,
        orchestrator.list_verifications(&principal, status, query.page, query.page_size),
    )
}

pub(crate) async fn decide_verification_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
    Json(decision): Json<VerificationDecision>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    respond(
        StatusCode::OK,
        orchestrator.decide_verification(&principal, &VerificationId(request_id), decision),
    )
}

pub(crate) async fn submit_name_change_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Json(form): Json<NameChangeForm>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    respond(
        StatusCode::CREATED,
        orchestrator.submit_name_change(&principal, &form),
    )
}

pub(crate) async fn my_name_change_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    respond(
        StatusCode::OK,
        orchestrator
            .my_name_change(&principal)
            .map(|request| json!({ "request": request })),
    )
}

pub(crate) async fn submit_teacher_claim_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Json(payload): Json<TeacherClaimPayload>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    respond(
        StatusCode::CREATED,
        orchestrator.submit_teacher_claim(&principal, &payload.teacher_id),
    )
}

fn request_status(query: &ListQuery) -> Result<Option<RequestStatus>, Response> {
    query.status.as_deref().map(parse_or_422::<RequestStatus>).transpose()
}

pub(crate) async fn name_changes_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    let status = parsed_or_return!(request_status(&query));
    respond(
        StatusCode::OK,
        orchestrator.list_name_changes(&principal, status, query.page, query.page_size),
    )
}

pub(crate) async fn decide_name_change_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
    Json(payload): Json<AccountRequestDecisionPayload>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    respond(
        StatusCode::OK,
        orchestrator.decide_name_change(
            &principal,
            &RequestId(request_id),
            payload.decision,
            payload.comment.as_deref(),
        ),
    )
}

pub(crate) async fn teacher_claims_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    let status = parsed_or_return!(request_status(&query));
    respond(
        StatusCode::OK,
        orchestrator.list_teacher_claims(&principal, status, query.page, query.page_size),
    )
}

pub(crate) async fn decide_teacher_claim_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
    Json(payload): Json<AccountRequestDecisionPayload>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    respond(
        StatusCode::OK,
        orchestrator.decide_teacher_claim(
            &principal,
            &RequestId(request_id),
            payload.decision,
            payload.comment.as_deref(),
        ),
    )
}

pub(crate) async fn activity_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    respond(
        StatusCode::OK,
        orchestrator.list_activity(&principal, query.page, query.page_size),
    )
}

pub(crate) async fn statistics_handler<S, N>(
    State(orchestrator): State<Orchestrator<S, N>>,
    headers: HeaderMap,
) -> Response
where
    S: ModerationStore + 'static,
    N: Notifier + 'static,
{
    let principal = principal_or_return!(headers);
    respond(StatusCode::OK, orchestrator.statistics(&principal))
}
