//! Escalation policy: turns detections, idle ticks, mood selections, and
//! check-in answers into UI actions. Every function here is a pure decision;
//! scheduling and rendering belong to the host.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::EscalationConfig;
use crate::detector::{DetectionResult, SessionRiskState};
use crate::error::CoreError;
use crate::mood::Mood;

/// What the UI layer should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EscalationAction {
    None,
    ShowAlert,
    /// Show the alert and open the support modal once `delay_ms` has passed.
    ShowAlertAndAutoOpen { delay_ms: u64 },
    GentleCheckIn,
}

impl EscalationAction {
    pub fn is_none(&self) -> bool {
        matches!(self, EscalationAction::None)
    }

    /// Whether the crisis alert banner should be shown.
    pub fn shows_alert(&self) -> bool {
        matches!(
            self,
            EscalationAction::ShowAlert | EscalationAction::ShowAlertAndAutoOpen { .. }
        )
    }

    /// Modal auto-open delay, for the one variant that carries it.
    pub fn auto_open_delay(&self) -> Option<Duration> {
        match self {
            EscalationAction::ShowAlertAndAutoOpen { delay_ms } => {
                Some(Duration::from_millis(*delay_ms))
            }
            _ => None,
        }
    }
}

/// Answer to the gentle check-in prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckInResponse {
    Better,
    Same,
    Worse,
    NeedHelp,
}

impl CheckInResponse {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckInResponse::Better => "better",
            CheckInResponse::Same => "same",
            CheckInResponse::Worse => "worse",
            CheckInResponse::NeedHelp => "need_help",
        }
    }
}

impl fmt::Display for CheckInResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckInResponse {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "better" => Ok(CheckInResponse::Better),
            "same" => Ok(CheckInResponse::Same),
            "worse" => Ok(CheckInResponse::Worse),
            "need_help" | "help" => Ok(CheckInResponse::NeedHelp),
            _ => Err(CoreError::UnknownCheckInResponse(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationPolicy {
    auto_open_delay_ms: u64,
    cooldown: TimeDelta,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::new(&EscalationConfig::default())
    }
}

impl EscalationPolicy {
    pub fn new(config: &EscalationConfig) -> Self {
        Self {
            auto_open_delay_ms: config.auto_open_delay_ms(),
            cooldown: config.cooldown,
        }
    }

    /// Any match shows the alert; a high-risk match also schedules the modal.
    pub fn on_detection(&self, result: &DetectionResult) -> EscalationAction {
        if !result.has_matches() {
            return EscalationAction::None;
        }
        if result.is_high_risk {
            EscalationAction::ShowAlertAndAutoOpen {
                delay_ms: self.auto_open_delay_ms,
            }
        } else {
            EscalationAction::ShowAlert
        }
    }

    /// Gentle check-in once the session has gone quiet for longer than the
    /// cooldown window. The caller applies [`SessionRiskState::cool_down`]
    /// after acting on it.
    pub fn on_idle_tick(&self, state: &SessionRiskState, now: DateTime<Utc>) -> EscalationAction {
        match state.last_match_at {
            Some(last) if state.match_count > 0 && now - last > self.cooldown => {
                EscalationAction::GentleCheckIn
            }
            _ => EscalationAction::None,
        }
    }

    /// Mood path, independent of keyword state.
    pub fn on_mood_selected(&self, mood: Mood) -> EscalationAction {
        if mood.is_concerning() {
            EscalationAction::ShowAlert
        } else {
            EscalationAction::None
        }
    }

    /// "Worse" re-raises the alert; "need help" opens the modal immediately.
    pub fn on_check_in_response(&self, response: CheckInResponse) -> EscalationAction {
        match response {
            CheckInResponse::Worse => EscalationAction::ShowAlert,
            CheckInResponse::NeedHelp => EscalationAction::ShowAlertAndAutoOpen { delay_ms: 0 },
            CheckInResponse::Better | CheckInResponse::Same => EscalationAction::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::detector::detect;

    #[test]
    fn no_matches_means_no_action() {
        let policy = EscalationPolicy::default();
        assert_eq!(
            policy.on_detection(&DetectionResult::default()),
            EscalationAction::None
        );
    }

    #[test]
    fn plain_match_shows_alert() {
        let policy = EscalationPolicy::default();
        let (result, _) = detect("I feel worthless", SessionRiskState::new(), Utc::now());
        assert_eq!(policy.on_detection(&result), EscalationAction::ShowAlert);
    }

    #[test]
    fn high_risk_schedules_modal_after_two_seconds() {
        let policy = EscalationPolicy::default();
        let (result, _) = detect("kill myself", SessionRiskState::new(), Utc::now());
        let action = policy.on_detection(&result);
        assert_eq!(action, EscalationAction::ShowAlertAndAutoOpen { delay_ms: 2_000 });
        assert_eq!(action.auto_open_delay(), Some(std::time::Duration::from_secs(2)));
    }

    #[test]
    fn idle_tick_checks_in_after_thirty_minutes() {
        let policy = EscalationPolicy::default();
        let now = Utc::now();
        let stale = SessionRiskState {
            match_count: 2,
            last_match_at: Some(now - Duration::minutes(31)),
        };
        let recent = SessionRiskState {
            match_count: 2,
            last_match_at: Some(now - Duration::minutes(29)),
        };

        assert_eq!(policy.on_idle_tick(&stale, now), EscalationAction::GentleCheckIn);
        assert_eq!(policy.on_idle_tick(&recent, now), EscalationAction::None);
    }

    #[test]
    fn idle_tick_at_exact_boundary_waits() {
        let policy = EscalationPolicy::default();
        let now = Utc::now();
        let state = SessionRiskState {
            match_count: 1,
            last_match_at: Some(now - Duration::minutes(30)),
        };
        assert_eq!(policy.on_idle_tick(&state, now), EscalationAction::None);
    }

    #[test]
    fn idle_tick_needs_matches_and_timestamp() {
        let policy = EscalationPolicy::default();
        let now = Utc::now();
        let zero_count = SessionRiskState {
            match_count: 0,
            last_match_at: Some(now - Duration::hours(2)),
        };
        assert_eq!(policy.on_idle_tick(&zero_count, now), EscalationAction::None);
        assert_eq!(
            policy.on_idle_tick(&SessionRiskState::new(), now),
            EscalationAction::None
        );
    }

    #[test]
    fn low_moods_raise_the_alert() {
        let policy = EscalationPolicy::default();
        assert_eq!(policy.on_mood_selected(Mood::Struggling), EscalationAction::ShowAlert);
        assert_eq!(policy.on_mood_selected(Mood::Low), EscalationAction::ShowAlert);
        assert_eq!(policy.on_mood_selected(Mood::Good), EscalationAction::None);
        assert_eq!(policy.on_mood_selected(Mood::Excellent), EscalationAction::None);
    }

    #[test]
    fn check_in_answers_map_to_actions() {
        let policy = EscalationPolicy::default();
        assert_eq!(
            policy.on_check_in_response(CheckInResponse::Worse),
            EscalationAction::ShowAlert
        );
        assert_eq!(
            policy.on_check_in_response(CheckInResponse::NeedHelp),
            EscalationAction::ShowAlertAndAutoOpen { delay_ms: 0 }
        );
        assert!(policy.on_check_in_response(CheckInResponse::Better).is_none());
        assert!(policy.on_check_in_response(CheckInResponse::NeedHelp).shows_alert());
        assert!(!EscalationAction::GentleCheckIn.shows_alert());
    }

    #[test]
    fn check_in_response_parses_loosely() {
        assert_eq!("Need-Help".parse::<CheckInResponse>().unwrap(), CheckInResponse::NeedHelp);
        assert!("fine".parse::<CheckInResponse>().is_err());
    }

    #[test]
    fn action_serializes_with_tag() {
        let json = serde_json::to_value(EscalationAction::ShowAlertAndAutoOpen { delay_ms: 2_000 })
            .unwrap();
        assert_eq!(json["action"], "show_alert_and_auto_open");
        assert_eq!(json["delay_ms"], 2_000);
    }
}
