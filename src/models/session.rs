use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle of a backend scan run.
///
/// `Pending` and `Running` are active; the rest are terminal and never revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Running,
    Completed,
    Partial,
    Failed,
}

impl ScanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScanStatus::Completed | ScanStatus::Partial | ScanStatus::Failed
        )
    }

    fn rank(&self) -> u8 {
        match self {
            ScanStatus::Pending => 0,
            ScanStatus::Running => 1,
            ScanStatus::Completed | ScanStatus::Partial | ScanStatus::Failed => 2,
        }
    }

    /// Whether moving from `self` to `next` respects monotonic progress.
    /// Re-observing the same status is allowed.
    pub fn can_advance_to(&self, next: ScanStatus) -> bool {
        if *self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next.rank() >= self.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Partial => "partial",
            ScanStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record of the reasoning trace. Older sessions stored plain strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceEntry {
    Step {
        step: String,
        #[serde(default)]
        level: Option<String>,
        message: String,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    Legacy(String),
}

impl TraceEntry {
    pub fn step(&self) -> Option<&str> {
        match self {
            TraceEntry::Step { step, .. } => Some(step),
            TraceEntry::Legacy(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        match self {
            TraceEntry::Step { level, .. } => level
                .as_deref()
                .is_some_and(|l| l.eq_ignore_ascii_case("error")),
            TraceEntry::Legacy(_) => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSession {
    pub id: Uuid,
    pub status: ScanStatus,
    #[serde(default)]
    pub hotels_count: u32,
    #[serde(default)]
    pub check_in_date: Option<NaiveDate>,
    #[serde(default)]
    pub check_out_date: Option<NaiveDate>,
    #[serde(default)]
    pub adults: Option<u32>,
    #[serde(default)]
    pub reasoning_trace: Vec<TraceEntry>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Error,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Error => "error",
        }
    }
}

/// Result of looking up a single hotel inside a scan session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLog {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub session_id: Option<Uuid>,
    pub hotel_name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    pub status: LogStatus,
    pub created_at: DateTime<Utc>,
}

/// Parameters for starting a new scan run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hotel_ids: Vec<Uuid>,
}
