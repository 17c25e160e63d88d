//! User reports against content and accounts.

pub mod domain;
pub mod ledger;
pub mod repository;

pub use domain::{
    NewReport, Report, ReportClosure, ReportId, ReportStatus, ReportTarget, ReportTargetKind,
};
pub use ledger::{ReportLedger, TargetResolution};
pub use repository::ReportRepository;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::content::{ContentId, ContentKind};
    use crate::moderation::identity::UserId;
    use chrono::Utc;

    #[test]
    fn blank_reasons_are_dropped() {
        let target = ReportTarget::new("c-1", ReportTargetKind::Comment);
        let report = NewReport::new(UserId::new("u-1"), target.clone(), Some("   "), Utc::now());
        assert_eq!(report.reason, None);

        let report = NewReport::new(UserId::new("u-1"), target, Some("  spam \n"), Utc::now());
        assert_eq!(report.reason.as_deref(), Some("spam"));
    }

    #[test]
    fn account_targets_are_not_content() {
        let target = ReportTarget::new("u-9", ReportTargetKind::User);
        assert!(target.as_content().is_none());
        assert!(target.kind.is_account());

        let target = ReportTarget::content(&ContentId::new("r-1"), ContentKind::Review);
        assert_eq!(
            target.as_content(),
            Some((ContentId::new("r-1"), ContentKind::Review))
        );
    }

    #[test]
    fn target_kind_accepts_legacy_announcement_label() {
        assert_eq!(
            "announcement".parse::<ReportTargetKind>(),
            Ok(ReportTargetKind::Discussion)
        );
        assert_eq!("USER".parse::<ReportTargetKind>(), Ok(ReportTargetKind::User));
        assert!("photo".parse::<ReportTargetKind>().is_err());
    }
}
