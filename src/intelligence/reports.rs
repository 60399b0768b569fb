use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{priced, LogStatus, QueryLog, ScanSession, ScanStatus};

/// Trailing window covered by the weekly summary.
const WEEK_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySummary {
    pub sessions: usize,
    pub hotels_scanned: usize,
    pub successful_lookups: usize,
    pub failed_lookups: usize,
    /// Percentage of successful lookups, `None` when nothing was looked up.
    pub success_rate: Option<Decimal>,
    /// Sessions in the window whose logs could not be fetched. Their
    /// lookups are missing from the counts above.
    pub incomplete_sessions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRollup {
    pub session_id: Uuid,
    pub status: ScanStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub hotels_count: u32,
    pub successes: usize,
    pub errors: usize,
    pub lowest_price: Option<Decimal>,
    pub lowest_vendor: Option<String>,
    /// Logs could not be fetched, so the lookup figures are unknown rather
    /// than zero.
    pub logs_unavailable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub weekly: WeeklySummary,
    pub sessions: Vec<SessionRollup>,
}

/// Per-session figures. `logs` is `None` when they could not be fetched.
pub fn rollup(session: &ScanSession, logs: Option<&[QueryLog]>) -> SessionRollup {
    let logs_unavailable = logs.is_none();
    let logs = logs.unwrap_or_default();
    let successes = logs.iter().filter(|l| l.status == LogStatus::Success).count();

    let lowest = logs
        .iter()
        .filter(|l| l.status == LogStatus::Success)
        .filter_map(|l| priced(l.price).map(|p| (p, l.vendor.clone())))
        .fold(None::<(Decimal, Option<String>)>, |best, (price, vendor)| match best {
            Some((b, _)) if b <= price => best,
            _ => Some((price, vendor)),
        });

    SessionRollup {
        session_id: session.id,
        status: session.status,
        created_at: session.created_at,
        hotels_count: session.hotels_count,
        successes,
        errors: logs.len() - successes,
        lowest_price: lowest.as_ref().map(|(p, _)| *p),
        lowest_vendor: lowest.and_then(|(_, v)| v),
        logs_unavailable,
    }
}

/// Weekly counts plus per-session rollups, newest session first.
pub fn build_report(
    entries: &[(ScanSession, Option<Vec<QueryLog>>)],
    now: DateTime<Utc>,
) -> ReportSummary {
    let cutoff = now - Duration::days(WEEK_DAYS);

    let mut sessions: Vec<SessionRollup> = entries
        .iter()
        .map(|(s, logs)| rollup(s, logs.as_deref()))
        .collect();
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let this_week: Vec<&SessionRollup> = sessions
        .iter()
        .filter(|r| r.created_at.is_some_and(|t| t >= cutoff && t <= now))
        .collect();

    let successful_lookups: usize = this_week.iter().map(|r| r.successes).sum();
    let failed_lookups: usize = this_week.iter().map(|r| r.errors).sum();
    let lookups = successful_lookups + failed_lookups;

    let success_rate = (lookups > 0).then(|| {
        (Decimal::from(successful_lookups as i64) / Decimal::from(lookups as i64)
            * Decimal::ONE_HUNDRED)
            .round_dp(1)
    });

    let weekly = WeeklySummary {
        sessions: this_week.len(),
        hotels_scanned: this_week.iter().map(|r| r.hotels_count as usize).sum(),
        successful_lookups,
        failed_lookups,
        success_rate,
        incomplete_sessions: this_week.iter().filter(|r| r.logs_unavailable).count(),
    };

    ReportSummary { weekly, sessions }
}
