use crate::domain::dashboard::DashboardSummary;
use crate::repository::DashboardReader;
use crate::services::ServiceResult;

/// Headline counts and the most recent proposals.
pub fn summary<R>(repo: &R) -> ServiceResult<DashboardSummary>
where
    R: DashboardReader + ?Sized,
{
    repo.dashboard_summary().map_err(|err| {
        log::error!("Failed to build dashboard summary: {err}");
        err.into()
    })
}
