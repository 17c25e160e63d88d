use crate::infra::{
    moderator, parse_positive, seed_moderation_data, student, SEED_TEACHER, SEED_TEACHER_ACCOUNT,
    SEED_UNCLAIMED_TEACHER,
};
use campus_moderation::config::ModerationConfig;
use campus_moderation::error::AppError;
use campus_moderation::moderation::memory::RecordingNotifier;
use campus_moderation::moderation::{
    compute_window, ContentFilter, NameChangeForm, ContentItem, ContentKind, InMemoryModerationStore,
    ModerationOrchestrator, Page, PageToken, Principal, ProfileChanges, ReportAction,
    ReportTarget, ReviewDecision, Role, TeacherId, VerificationDecision, VerificationEvidence,
};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Rows per page for single-kind queues (defaults to 10).
    #[arg(long, value_parser = parse_positive)]
    pub(crate) page_size: Option<u32>,
    /// Skip the profile change and verification portion of the demo.
    #[arg(long)]
    pub(crate) skip_reviews: bool,
}

#[derive(Args, Debug)]
pub(crate) struct PagesArgs {
    /// Page the console is on (1-based)
    #[arg(long, value_parser = parse_positive)]
    pub(crate) current: u32,
    /// Total number of pages
    #[arg(long)]
    pub(crate) total: u32,
    /// Consecutive page buttons to show
    #[arg(long, default_value_t = 5, value_parser = parse_positive)]
    pub(crate) max_visible: u32,
}

pub(crate) fn run_pages(args: PagesArgs) -> Result<(), AppError> {
    let PagesArgs {
        current,
        total,
        max_visible,
    } = args;

    let window = compute_window(current, total, max_visible);
    if window.is_empty() {
        println!("No pages to show");
        return Ok(());
    }

    println!("{}", render_window(&window, current.min(total)));
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        page_size,
        skip_reviews,
    } = args;

    let mut config = ModerationConfig::default();
    if let Some(size) = page_size {
        config.page_size = size.min(config.max_page_size);
    }

    let store = Arc::new(InMemoryModerationStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let orchestrator = ModerationOrchestrator::new(store.clone(), notifier.clone(), config);
    let moderator = moderator();

    println!("Campus moderation demo");
    let seeded = seed_moderation_data(&store, &orchestrator)?;

    let queue = orchestrator.list_moderation_queue(&moderator, ContentFilter::All, None, None)?;
    render_queue("All pending content", &queue);

    let reviews = orchestrator.list_moderation_queue(
        &moderator,
        ContentFilter::Only(ContentKind::Review),
        None,
        None,
    )?;
    render_queue("Review queue", &reviews);

    println!("\nContent decisions");
    let first = &seeded.discussions[0];
    let approved = orchestrator.approve_item(&moderator, &first.id, ContentKind::Discussion)?;
    println!("- approve {}: {}", first.id, approved.message);
    let repeated = orchestrator.approve_item(&moderator, &first.id, ContentKind::Discussion)?;
    println!(
        "- approve {} again: {} ({})",
        first.id,
        repeated.message,
        repeated.outcome.label()
    );

    let hidden = orchestrator.hide_item(&moderator, &seeded.comment.id, ContentKind::Comment)?;
    println!("- hide {}: {}", seeded.comment.id, hidden.message);

    println!("\nReports");
    let spam = &seeded.discussions[1];
    let target = ReportTarget::content(&spam.id, ContentKind::Discussion);
    let report = orchestrator.create_report(
        &student("s-anna"),
        target.clone(),
        Some("advertising essays"),
    )?;
    let sibling = orchestrator.create_report(&student("s-dmytro"), target, Some("spam"))?;
    println!("- {} and {} filed against {}", report.id, sibling.id, spam.id);

    let handled =
        orchestrator.handle_report_action(&moderator, &report.id, ReportAction::DeleteContent)?;
    println!("- delete via {}: {}", report.id, handled.message);
    let repeat = orchestrator.handle_report_action(&moderator, &sibling.id, ReportAction::Reject)?;
    println!("- reject {}: {}", sibling.id, repeat.message);

    let bulk = orchestrator.bulk_delete(
        &moderator,
        &[spam.id.clone(), seeded.discussions[2].id.clone()],
        ContentKind::Discussion,
    )?;
    println!(
        "- bulk delete: {} deleted, {} already removed, {} failed",
        bulk.deleted.len(),
        bulk.already_removed.len(),
        bulk.failed.len()
    );

    if !skip_reviews {
        run_review_walkthrough(&orchestrator)?;
    }

    let stats = orchestrator.statistics(&moderator)?;
    println!("\nDashboard");
    println!(
        "- {} items | pending {} discussions, {} comments, {} reviews | {} hidden",
        stats.total_content,
        stats.pending_content.discussion,
        stats.pending_content.comment,
        stats.pending_content.review,
        stats.hidden_content
    );
    println!(
        "- {} open reports | {} profile changes | {} verifications waiting",
        stats.open_reports, stats.pending_profile_changes, stats.submitted_verifications
    );
    println!(
        "- {} name changes | {} teacher claims waiting",
        stats.pending_name_changes, stats.pending_teacher_claims
    );

    let activity = orchestrator.list_activity(&moderator, Some(1), Some(10))?;
    println!(
        "\nRecent activity ({} entries total)",
        activity.pagination.total_items
    );
    for view in &activity.items {
        println!(
            "  [{:?}] {} {} ({})",
            view.severity,
            view.entry.action.label(),
            view.entry.subject,
            view.entry.actor
        );
    }

    let notices = notifier.notices();
    println!("\nNotices sent: {}", notices.len());
    for notice in &notices {
        println!("  - {} -> {}", notice.template(), notice.recipient());
    }

    Ok(())
}

fn run_review_walkthrough(
    orchestrator: &ModerationOrchestrator<InMemoryModerationStore, RecordingNotifier>,
) -> Result<(), AppError> {
    let moderator = moderator();
    let teacher = Principal::new(SEED_TEACHER_ACCOUNT, Role::Teacher);
    let teacher_id = TeacherId::new(SEED_TEACHER);

    println!("\nProfile change review");
    let submission = orchestrator.submit_profile_change(
        &teacher,
        &teacher_id,
        ProfileChanges {
            bio: Some("Teaches algorithms, data systems and distributed storage.".to_string()),
            subjects: Some(vec![
                "Algorithms".to_string(),
                "Databases".to_string(),
                "  Distributed   Systems ".to_string(),
            ]),
            ..ProfileChanges::default()
        },
    )?;
    let changed: Vec<_> = submission
        .diff
        .changed_fields()
        .into_iter()
        .map(|field| field.label())
        .collect();
    println!(
        "- revision {} submitted, changed fields: {}",
        submission.pending.revision,
        changed.join(", ")
    );

    let review =
        orchestrator.review_profile_change(&moderator, &teacher_id, ReviewDecision::Approve)?;
    println!("- {}", review.message);

    println!("\nVerification");
    let applicant = student("s-bohdan");
    let first = orchestrator.submit_verification(
        &applicant,
        VerificationEvidence::Student {
            university_email: String::new(),
            student_card_number: "KV-20431".to_string(),
            attachments: Vec::new(),
        },
    )?;
    let rejected = orchestrator.decide_verification(
        &moderator,
        &first.id,
        VerificationDecision::Reject {
            reason: "card photo missing".to_string(),
        },
    )?;
    println!("- {}: {}", first.id, rejected.message);

    let second = orchestrator.submit_verification(
        &applicant,
        VerificationEvidence::Student {
            university_email: "bohdan@kpi.ua".to_string(),
            student_card_number: "KV-20431".to_string(),
            attachments: Vec::new(),
        },
    )?;
    let approved =
        orchestrator.decide_verification(&moderator, &second.id, VerificationDecision::Approve)?;
    println!("- {}: {}", second.id, approved.message);

    println!("\nAccount requests");
    let rename = orchestrator.submit_name_change(
        &student("s-anna"),
        &NameChangeForm {
            first_name: "Anna".to_string(),
            last_name: "Kovalchuk".to_string(),
            middle_name: None,
            reason: Some("married in August".to_string()),
        },
    )?;
    let renamed =
        orchestrator.decide_name_change(&moderator, &rename.id, ReviewDecision::Approve, None)?;
    println!(
        "- {} -> {}: {}",
        rename.current.display_name, rename.proposed.display_name, renamed.message
    );

    let claimant = Principal::new("acct-marchenko", Role::Teacher);
    let claim = orchestrator
        .submit_teacher_claim(&claimant, &TeacherId::new(SEED_UNCLAIMED_TEACHER))?;
    let linked = orchestrator.decide_teacher_claim(
        &moderator,
        &claim.id,
        ReviewDecision::Approve,
        Some("matches the staff list"),
    )?;
    println!("- claim on {}: {}", claim.teacher_name, linked.message);

    Ok(())
}

fn render_queue(title: &str, page: &Page<ContentItem>) {
    println!(
        "\n{} ({} items, page {}/{})",
        title,
        page.pagination.total_items,
        page.pagination.current_page,
        page.pagination.total_pages.max(1)
    );
    for item in &page.items {
        println!(
            "  - {} [{}] by {} at {} ({})",
            item.id,
            item.kind().label(),
            item.author,
            item.created_at.format("%Y-%m-%d %H:%M"),
            item.status.label()
        );
    }
    if !page.pagination.window.is_empty() {
        println!(
            "  {}",
            render_window(&page.pagination.window, page.pagination.current_page)
        );
    }
}

fn render_window(window: &[PageToken], current: u32) -> String {
    window
        .iter()
        .map(|token| match token {
            PageToken::Page(number) if *number == current => format!("[{number}]"),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_page_is_bracketed() {
        let window = compute_window(7, 20, 5);
        assert_eq!(render_window(&window, 7), "1 … 5 6 [7] 8 9 … 20");
    }

    #[test]
    fn demo_walkthrough_completes() {
        run_demo(DemoArgs::default()).expect("demo runs");
    }
}
