use campus_moderation::moderation::profiles::ProfileRepository;
use campus_moderation::moderation::{
    Account, AccountName, ContentDetails, ContentItem, InMemoryModerationStore, ModerationError, ModerationOrchestrator,
    NewContent, Notice, Notifier, NotifyError, Principal, ProfileFields, ReviewDetails, Role,
    TeacherId, TeacherProfile, UserId,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Hands notices to the log until a mail relay is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) -> Result<(), NotifyError> {
        info!(
            template = notice.template(),
            recipient = %notice.recipient(),
            "notification queued"
        );
        Ok(())
    }
}

pub(crate) const SEED_TEACHER: &str = "t-koval";
pub(crate) const SEED_TEACHER_ACCOUNT: &str = "acct-koval";
/// Profile imported from the staff list with no account attached yet.
pub(crate) const SEED_UNCLAIMED_TEACHER: &str = "t-marchenko";

pub(crate) fn moderator() -> Principal {
    Principal::new("mod-demo", Role::Moderator)
}

pub(crate) fn student(id: &str) -> Principal {
    Principal::new(id, Role::Student)
}

pub(crate) fn seed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 8, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Items created by [`seed_moderation_data`], in creation order.
#[derive(Debug, Clone)]
pub(crate) struct SeededContent {
    pub(crate) discussions: Vec<ContentItem>,
    pub(crate) comment: ContentItem,
    pub(crate) reviews: Vec<ContentItem>,
}

/// Loads a teacher, a few accounts, and a spread of pending content.
pub(crate) fn seed_moderation_data<N>(
    store: &InMemoryModerationStore,
    orchestrator: &ModerationOrchestrator<InMemoryModerationStore, N>,
) -> Result<SeededContent, ModerationError>
where
    N: Notifier + 'static,
{
    let mut profile = TeacherProfile::new(
        SEED_TEACHER,
        "Dr. Olena Koval",
        ProfileFields {
            position: "Associate Professor".to_string(),
            phone: "+380 44 204 0000".to_string(),
            university: "Igor Sikorsky KPI".to_string(),
            faculty: "Informatics and Computer Science".to_string(),
            department: "Software Engineering".to_string(),
            subjects: vec!["Algorithms".to_string(), "Databases".to_string()],
            image: String::new(),
            bio: "Teaches algorithms and data systems.".to_string(),
        },
    );
    profile.account = Some(UserId::new(SEED_TEACHER_ACCOUNT));
    store.insert_profile(profile)?;

    store.insert_profile(TeacherProfile::new(
        SEED_UNCLAIMED_TEACHER,
        "Dr. Taras Marchenko",
        ProfileFields {
            university: "Igor Sikorsky KPI".to_string(),
            subjects: vec!["Operating Systems".to_string()],
            ..ProfileFields::default()
        },
    ))?;

    for (user, first, last) in [
        ("s-anna", "Anna", "Petrenko"),
        ("s-bohdan", "Bohdan", "Shevchuk"),
        ("s-dmytro", "Dmytro", "Hnatiuk"),
        (SEED_TEACHER_ACCOUNT, "Olena", "Koval"),
        ("acct-marchenko", "Taras", "Marchenko"),
    ] {
        let email = format!("{user}@kpi.ua");
        store.register_account(Account::new(user, &email, AccountName::new(first, last, None)))?;
    }

    let clock = seed_clock();
    let mut discussions = Vec::new();
    for (offset, (author, title)) in [
        ("s-anna", "Exam schedule for algorithms"),
        ("s-bohdan", "Cheap essays, message me"),
        ("s-dmytro", "Study group for databases"),
    ]
    .into_iter()
    .enumerate()
    {
        let draft = NewContent {
            author: UserId::new(author),
            body: format!("{title}."),
            created_at: clock + Duration::minutes(offset as i64 * 10),
            details: ContentDetails::Discussion {
                title: title.to_string(),
            },
        };
        discussions.push(orchestrator.create_content(&student(author), draft)?);
    }

    let comment = orchestrator.create_content(
        &student("s-bohdan"),
        NewContent {
            author: UserId::new("s-bohdan"),
            body: "Count me in.".to_string(),
            created_at: clock + Duration::minutes(25),
            details: ContentDetails::Comment {
                discussion_id: discussions[2].id.clone(),
            },
        },
    )?;

    let mut reviews = Vec::new();
    for (offset, (author, rating)) in [("s-anna", 9u8), ("s-dmytro", 6u8)].into_iter().enumerate() {
        let draft = NewContent {
            author: UserId::new(author),
            body: "Demanding but fair.".to_string(),
            created_at: clock + Duration::minutes(30 + offset as i64 * 5),
            details: ContentDetails::Review(ReviewDetails {
                teacher_id: TeacherId::new(SEED_TEACHER),
                rating,
                semester: "2024-spring".to_string(),
                anonymous: offset == 0,
            }),
        };
        reviews.push(orchestrator.create_content(&student(author), draft)?);
    }

    info!(
        discussions = discussions.len(),
        reviews = reviews.len(),
        "seeded moderation data"
    );

    Ok(SeededContent {
        discussions,
        comment,
        reviews,
    })
}

pub(crate) fn parse_positive(raw: &str) -> Result<u32, String> {
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(format!("'{raw}' is not a positive integer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_moderation::config::ModerationConfig;
    use campus_moderation::moderation::SilentNotifier;

    #[test]
    fn seed_data_fills_every_queue() {
        let store = Arc::new(InMemoryModerationStore::new());
        let orchestrator = ModerationOrchestrator::new(
            store.clone(),
            Arc::new(SilentNotifier),
            ModerationConfig::default(),
        );

        let seeded = seed_moderation_data(&store, &orchestrator).expect("seed succeeds");
        assert_eq!(seeded.discussions.len(), 3);
        assert_eq!(seeded.reviews.len(), 2);

        let stats = orchestrator.statistics(&moderator()).expect("stats");
        assert_eq!(stats.total_content, 6);
        assert_eq!(stats.pending_content.review, 2);

        let profile = store
            .fetch_profile(&TeacherId::new(SEED_TEACHER))
            .expect("fetch")
            .expect("teacher seeded");
        assert_eq!(profile.metrics.reviews, 2);
        assert!((profile.metrics.avg_rating - 7.5).abs() < f64::EPSILON);

        let unclaimed = store
            .fetch_profile(&TeacherId::new(SEED_UNCLAIMED_TEACHER))
            .expect("fetch")
            .expect("unclaimed teacher seeded");
        assert_eq!(unclaimed.account, None);
    }

    #[test]
    fn positive_numbers_only() {
        assert_eq!(parse_positive("7"), Ok(7));
        assert!(parse_positive("0").is_err());
        assert!(parse_positive("seven").is_err());
    }
}
