use crate::moderation::identity::UserId;
use crate::moderation::store::{RepositoryError, Transitioned};

use super::domain::{NewReport, Report, ReportClosure, ReportId, ReportTarget};

/// Storage abstraction for user reports.
pub trait ReportRepository: Send + Sync {
    /// Fails with `Conflict` when the reporter already filed against the same target.
    fn insert_report(&self, report: NewReport) -> Result<Report, RepositoryError>;

    fn fetch_report(&self, id: &ReportId) -> Result<Option<Report>, RepositoryError>;

    /// Applies `closure` only if the report is still open; a terminal report comes back
    /// untouched with `applied = false`. `None` when the id is unknown.
    fn close_report(
        &self,
        id: &ReportId,
        closure: ReportClosure,
    ) -> Result<Option<Transitioned<Report>>, RepositoryError>;

    /// Open reports, newest first.
    fn list_open_reports(&self, offset: usize, limit: usize)
        -> Result<Vec<Report>, RepositoryError>;

    fn count_open_reports(&self) -> Result<usize, RepositoryError>;

    fn open_reports_for_target(&self, target: &ReportTarget)
        -> Result<Vec<Report>, RepositoryError>;

    /// Every report filed by `reporter`, newest first.
    fn reports_by_reporter(&self, reporter: &UserId) -> Result<Vec<Report>, RepositoryError>;
}
