use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::config::ModerationConfig;
use crate::moderation::accounts::{Account, AccountName};
use crate::moderation::content::{ContentDetails, ContentId, ContentItem, NewContent, ReviewDetails};
use crate::moderation::identity::{Principal, Role, UserId};
use crate::moderation::memory::{InMemoryModerationStore, RecordingNotifier};
use crate::moderation::notify::{Notice, Notifier, NotifyError};
use crate::moderation::orchestrator::ModerationOrchestrator;
use crate::moderation::profiles::{ProfileFields, ProfileRepository, TeacherId, TeacherProfile};
use crate::moderation::router::moderation_router;

pub(super) type TestOrchestrator = ModerationOrchestrator<InMemoryModerationStore, RecordingNotifier>;

pub(super) const TEACHER: &str = "t-koval";
pub(super) const TEACHER_ACCOUNT: &str = "acct-koval";

pub(super) fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minute)
}

pub(super) fn moderator() -> Principal {
    Principal::new("mod-1", Role::Moderator)
}

pub(super) fn student(id: &str) -> Principal {
    Principal::new(id, Role::Student)
}

pub(super) fn teacher_account() -> Principal {
    Principal::new(TEACHER_ACCOUNT, Role::Teacher)
}

pub(super) fn build_orchestrator() -> (
    TestOrchestrator,
    Arc<InMemoryModerationStore>,
    Arc<RecordingNotifier>,
) {
    build_orchestrator_with(ModerationConfig::default())
}

pub(super) fn build_orchestrator_with(
    config: ModerationConfig,
) -> (
    TestOrchestrator,
    Arc<InMemoryModerationStore>,
    Arc<RecordingNotifier>,
) {
    let store = Arc::new(InMemoryModerationStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    seed_teacher(&store);
    let orchestrator = ModerationOrchestrator::new(store.clone(), notifier.clone(), config);
    (orchestrator, store, notifier)
}

pub(super) fn seed_teacher(store: &InMemoryModerationStore) -> TeacherProfile {
    let mut profile = TeacherProfile::new(
        TEACHER,
        "Dr. Koval",
        ProfileFields {
            position: "Associate Professor".to_string(),
            phone: "000".to_string(),
            university: "KPI".to_string(),
            subjects: vec!["Algorithms".to_string(), "Databases".to_string()],
            bio: "A".to_string(),
            ..ProfileFields::default()
        },
    );
    profile.account = Some(UserId::new(TEACHER_ACCOUNT));
    store.insert_profile(profile).expect("teacher seeded")
}

/// Registers a student account named `first last`.
pub(super) fn seed_account(store: &InMemoryModerationStore, id: &str, first: &str, last: &str) {
    let email = format!("{id}@kpi.ua");
    store
        .register_account(Account::new(id, &email, AccountName::new(first, last, None)))
        .expect("account seeded");
}

pub(super) fn discussion(title: &str, minute: i64) -> NewContent {
    NewContent {
        author: UserId::new("s-1"),
        body: format!("{title} body"),
        created_at: at(minute),
        details: ContentDetails::Discussion {
            title: title.to_string(),
        },
    }
}

pub(super) fn comment(discussion_id: &ContentId, minute: i64) -> NewContent {
    NewContent {
        author: UserId::new("s-2"),
        body: "Agreed".to_string(),
        created_at: at(minute),
        details: ContentDetails::Comment {
            discussion_id: discussion_id.clone(),
        },
    }
}

pub(super) fn review(rating: u8, semester: &str, minute: i64) -> NewContent {
    NewContent {
        author: UserId::new("s-1"),
        body: "Clear lectures".to_string(),
        created_at: at(minute),
        details: ContentDetails::Review(ReviewDetails {
            teacher_id: TeacherId::new(TEACHER),
            rating,
            semester: semester.to_string(),
            anonymous: false,
        }),
    }
}

/// Posts `draft` as `author`.
pub(super) fn post(orchestrator: &TestOrchestrator, author: &str, draft: NewContent) -> ContentItem {
    orchestrator
        .create_content(&student(author), draft)
        .expect("content created")
}

/// Notifier whose transport is always down.
#[derive(Default)]
pub(super) struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _notice: Notice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) fn router_with(orchestrator: TestOrchestrator) -> axum::Router {
    moderation_router(Arc::new(orchestrator))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
