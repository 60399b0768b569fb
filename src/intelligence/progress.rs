use serde::Serialize;

use crate::models::{QueryLog, ScanSession, ScanStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Done,
    Active,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepIndicator {
    pub step: String,
    pub state: StepState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanProgress {
    pub status: ScanStatus,
    pub percent: u8,
    pub processed: usize,
    pub total: u32,
    pub steps: Vec<StepIndicator>,
}

/// Progress bar and per-step indicators for a scan session.
pub fn scan_progress(session: &ScanSession, logs: &[QueryLog]) -> ScanProgress {
    let processed = logs.len();
    let total = session.hotels_count;

    let percent = if session.status.is_terminal() {
        100
    } else if total == 0 {
        0
    } else {
        ((processed as u64 * 100) / total as u64).min(100) as u8
    };

    ScanProgress {
        status: session.status,
        percent,
        processed,
        total,
        steps: step_indicators(session),
    }
}

fn step_indicators(session: &ScanSession) -> Vec<StepIndicator> {
    let mut steps: Vec<StepIndicator> = Vec::new();

    for entry in &session.reasoning_trace {
        let Some(name) = entry.step() else {
            continue;
        };
        let idx = match steps.iter().position(|s| s.step == name) {
            Some(i) => i,
            None => {
                steps.push(StepIndicator {
                    step: name.to_string(),
                    state: StepState::Done,
                });
                steps.len() - 1
            }
        };
        if entry.is_error() {
            steps[idx].state = StepState::Failed;
        }
    }

    if let Some(last) = steps.last_mut() {
        if last.state != StepState::Failed {
            match session.status {
                ScanStatus::Pending | ScanStatus::Running => last.state = StepState::Active,
                ScanStatus::Failed => last.state = StepState::Failed,
                ScanStatus::Completed | ScanStatus::Partial => {}
            }
        }
    }

    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogStatus, TraceEntry};
    use chrono::Utc;
    use uuid::Uuid;

    fn session(status: ScanStatus, hotels: u32, trace: Vec<TraceEntry>) -> ScanSession {
        ScanSession {
            id: Uuid::new_v4(),
            status,
            hotels_count: hotels,
            check_in_date: None,
            check_out_date: None,
            adults: None,
            reasoning_trace: trace,
            created_at: None,
            completed_at: None,
        }
    }

    fn step(name: &str, level: &str) -> TraceEntry {
        TraceEntry::Step {
            step: name.into(),
            level: Some(level.into()),
            message: "msg".into(),
            timestamp: None,
        }
    }

    fn logs(n: usize) -> Vec<QueryLog> {
        (0..n)
            .map(|i| QueryLog {
                id: None,
                session_id: None,
                hotel_name: format!("H{i}"),
                location: None,
                price: None,
                currency: None,
                vendor: None,
                status: LogStatus::Success,
                created_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_percent_from_logs() {
        let s = session(ScanStatus::Running, 4, vec![]);
        assert_eq!(scan_progress(&s, &logs(1)).percent, 25);
        assert_eq!(scan_progress(&s, &logs(6)).percent, 100);

        let empty = session(ScanStatus::Pending, 0, vec![]);
        assert_eq!(scan_progress(&empty, &[]).percent, 0);
    }

    #[test]
    fn test_terminal_is_full() {
        let s = session(ScanStatus::Partial, 10, vec![]);
        assert_eq!(scan_progress(&s, &logs(3)).percent, 100);
    }

    #[test]
    fn test_steps_for_running_session() {
        let s = session(
            ScanStatus::Running,
            2,
            vec![
                TraceEntry::Legacy("boot".into()),
                step("resolve", "info"),
                step("search", "info"),
                step("search", "info"),
            ],
        );
        let steps = scan_progress(&s, &[]).steps;
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].state, StepState::Done);
        assert_eq!(steps[1], StepIndicator { step: "search".into(), state: StepState::Active });
    }

    #[test]
    fn test_failed_steps() {
        let s = session(
            ScanStatus::Failed,
            2,
            vec![step("resolve", "error"), step("search", "info")],
        );
        let steps = scan_progress(&s, &[]).steps;
        assert_eq!(steps[0].state, StepState::Failed);
        assert_eq!(steps[1].state, StepState::Failed);

        let done = session(ScanStatus::Completed, 2, vec![step("resolve", "info")]);
        assert_eq!(scan_progress(&done, &[]).steps[0].state, StepState::Done);
    }
}
