use chrono::{DateTime, Utc};
use dost_core::{
    DetectionResult, EscalationAction, EscalationConfig, EscalationPolicy, RiskDetector,
    SessionRiskState,
};
use serde::Serialize;

use crate::util::{exit_error, print_json};

#[derive(Serialize)]
struct ScanOutput {
    detection: DetectionResult,
    action: EscalationAction,
    state: SessionRiskState,
}

/// Scan one message offline, optionally continuing from a prior session state.
pub fn run(message: &str, match_count: u32, last_match_at: Option<&str>, raw: bool) -> i32 {
    let last_match_at = last_match_at.map(|ts| {
        DateTime::parse_from_rfc3339(ts)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|e| {
                exit_error(
                    &format!("Invalid --last-match-at '{ts}': {e}"),
                    Some("Use RFC3339, e.g. 2026-01-31T18:00:00Z"),
                )
            })
    });

    let output = scan(
        &EscalationConfig::from_env(),
        message,
        SessionRiskState {
            match_count,
            last_match_at,
        },
        Utc::now(),
    );
    print_json(&output, raw);
    0
}

fn scan(
    config: &EscalationConfig,
    message: &str,
    state: SessionRiskState,
    now: DateTime<Utc>,
) -> ScanOutput {
    let (detection, state) = RiskDetector::new(config).detect(message, state, now);
    let action = EscalationPolicy::new(config).on_detection(&detection);
    ScanOutput {
        detection,
        action,
        state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prior_count_carries_into_escalation() {
        let prior = SessionRiskState {
            match_count: 2,
            last_match_at: None,
        };
        let out = scan(&EscalationConfig::default(), "everything is hopeless", prior, Utc::now());
        assert_eq!(out.state.match_count, 3);
        assert!(matches!(out.action, EscalationAction::ShowAlertAndAutoOpen { .. }));
    }

    #[test]
    fn clean_message_yields_no_action() {
        let out = scan(
            &EscalationConfig::default(),
            "going for a run later",
            SessionRiskState::new(),
            Utc::now(),
        );
        assert_eq!(out.action, EscalationAction::None);
        assert_eq!(out.state, SessionRiskState::new());
    }
}
