use std::sync::Arc;

use campus_moderation::config::ModerationConfig;
use campus_moderation::moderation::content::ContentRepository;
use campus_moderation::moderation::profiles::{differ, ProfileRepository};
use campus_moderation::moderation::{
    compute_window, ActionOutcome, ContentDetails, ContentFilter, ContentKind, InMemoryModerationStore,
    ModerationOrchestrator, NewContent, PageToken, Principal, ProfileChanges, ProfileFields,
    ReportAction, ReportStatus, ReportTarget, ReviewDecision, Role, SilentNotifier, TeacherId,
    TeacherProfile, UserId,
};
use chrono::{Duration, TimeZone, Utc};

fn orchestrator() -> (
    ModerationOrchestrator<InMemoryModerationStore, SilentNotifier>,
    Arc<InMemoryModerationStore>,
) {
    let store = Arc::new(InMemoryModerationStore::new());
    let orchestrator = ModerationOrchestrator::new(
        store.clone(),
        Arc::new(SilentNotifier),
        ModerationConfig::default(),
    );
    (orchestrator, store)
}

fn discussion(title: &str, minute: i64) -> NewContent {
    NewContent {
        author: UserId::new("s-1"),
        body: format!("{title} details"),
        created_at: Utc.with_ymd_and_hms(2024, 9, 2, 8, 0, 0).unwrap() + Duration::minutes(minute),
        details: ContentDetails::Discussion {
            title: title.to_string(),
        },
    }
}

#[test]
fn page_bar_matches_console_expectations() {
    assert_eq!(
        compute_window(1, 3, 5),
        vec![PageToken::Page(1), PageToken::Page(2), PageToken::Page(3)]
    );
    assert_eq!(
        compute_window(7, 20, 5),
        vec![
            PageToken::Page(1),
            PageToken::Ellipsis,
            PageToken::Page(5),
            PageToken::Page(6),
            PageToken::Page(7),
            PageToken::Page(8),
            PageToken::Page(9),
            PageToken::Ellipsis,
            PageToken::Page(20),
        ]
    );
    assert_eq!(
        compute_window(5, 20, 5),
        vec![
            PageToken::Page(1),
            PageToken::Page(2),
            PageToken::Page(3),
            PageToken::Page(4),
            PageToken::Page(5),
            PageToken::Page(6),
            PageToken::Page(7),
            PageToken::Ellipsis,
            PageToken::Page(20),
        ],
        "a one-page gap renders the page itself"
    );
    assert!(compute_window(1, 0, 5).is_empty());
}

#[test]
fn moderator_clears_a_reported_thread() {
    let (orchestrator, store) = orchestrator();
    let moderator = Principal::new("mod-1", Role::Moderator);
    let reporter = Principal::new("s-2", Role::Student);
    let author = Principal::new("s-1", Role::Student);

    let spam = orchestrator
        .create_content(&author, discussion("Cheap essays", 1))
        .expect("spam posted");
    let keep = orchestrator
        .create_content(&author, discussion("Study group", 2))
        .expect("thread posted");

    let report = orchestrator
        .create_report(
            &reporter,
            ReportTarget::content(&spam.id, ContentKind::Discussion),
            Some("advertising"),
        )
        .expect("report filed");

    let handled = orchestrator
        .handle_report_action(&moderator, &report.id, ReportAction::DeleteContent)
        .expect("report handled");
    assert!(handled.target_deleted);
    assert_eq!(handled.report.status, ReportStatus::Resolved);

    let repeat = orchestrator
        .handle_report_action(&moderator, &report.id, ReportAction::DeleteContent)
        .expect("repeat absorbed");
    assert_eq!(repeat.outcome, ActionOutcome::AlreadyTerminal);

    orchestrator
        .approve_item(&moderator, &keep.id, ContentKind::Discussion)
        .expect("thread approved");

    let queue = orchestrator
        .list_moderation_queue(&moderator, ContentFilter::All, None, None)
        .expect("queue listed");
    assert_eq!(queue.items.len(), 1);
    assert_eq!(queue.items[0].id, keep.id);
    assert!(store
        .fetch_content(&spam.id, ContentKind::Discussion)
        .expect("fetch")
        .is_none());
}

#[test]
fn approved_profile_change_is_complete_and_idempotent() {
    let (orchestrator, store) = orchestrator();
    let moderator = Principal::new("admin-1", Role::Admin);
    let mut profile = TeacherProfile::new(
        "t-1",
        "Dr. Savchenko",
        ProfileFields {
            bio: "A".to_string(),
            phone: "000".to_string(),
            ..ProfileFields::default()
        },
    );
    profile.account = Some(UserId::new("acct-1"));
    store.insert_profile(profile).expect("profile seeded");

    let proposed = ProfileChanges {
        bio: Some("B".to_string()),
        subjects: Some(vec!["Calculus".to_string(), "  Linear   Algebra ".to_string()]),
        ..ProfileChanges::default()
    };
    orchestrator
        .submit_profile_change(
            &Principal::new("acct-1", Role::Teacher),
            &TeacherId::new("t-1"),
            proposed.clone(),
        )
        .expect("submitted");

    orchestrator
        .review_profile_change(&moderator, &TeacherId::new("t-1"), ReviewDecision::Approve)
        .expect("approved");

    let stored = store
        .fetch_profile(&TeacherId::new("t-1"))
        .expect("fetch")
        .expect("profile present");
    assert_eq!(stored.fields.bio, "B");
    assert_eq!(stored.fields.phone, "000");
    assert_eq!(stored.fields.subjects, vec!["Calculus", "Linear Algebra"]);
    assert!(stored.pending_changes.is_none());
    assert!(!differ::diff(&stored.fields, &proposed).has_changes());
}
