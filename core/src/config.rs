use std::time::Duration;

use chrono::TimeDelta;

pub const DEFAULT_HIGH_RISK_MATCH_COUNT: u32 = 3;
pub const DEFAULT_AUTO_OPEN_DELAY_MS: u64 = 2_000;
pub const DEFAULT_COOLDOWN_MINUTES: i64 = 30;
pub const DEFAULT_IDLE_TICK_SECONDS: u64 = 5 * 60;
pub const DEFAULT_ALERT_AUTO_HIDE_SECONDS: u64 = 30;
pub const DEFAULT_CHECK_IN_ALERT_DELAY_MS: u64 = 1_000;
pub const DEFAULT_CRISIS_FOLLOW_UP_DELAY_MS: u64 = 1_000;

const MAX_COOLDOWN_MINUTES: u64 = 7 * 24 * 60;

/// Longest chat message accepted by the chat surfaces. The detector itself
/// accepts any length.
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Thresholds and delays of the escalation policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationConfig {
    /// Cumulative session matches at which a detection counts as high risk.
    pub high_risk_match_count: u32,
    /// Delay before the support modal opens after a high-risk detection.
    pub auto_open_delay: Duration,
    /// Quiet period after the last match before a gentle check-in.
    pub cooldown: TimeDelta,
    /// Cadence at which hosts should call `on_idle_tick`.
    pub idle_tick_interval: Duration,
    /// How long an unattended alert banner stays visible.
    pub alert_auto_hide: Duration,
    /// Delay before the alert appears after a "worse" check-in answer.
    pub check_in_alert_delay: Duration,
    /// Delay before the crisis follow-up message after a keyword match.
    pub crisis_follow_up_delay: Duration,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            high_risk_match_count: DEFAULT_HIGH_RISK_MATCH_COUNT,
            auto_open_delay: Duration::from_millis(DEFAULT_AUTO_OPEN_DELAY_MS),
            cooldown: TimeDelta::minutes(DEFAULT_COOLDOWN_MINUTES),
            idle_tick_interval: Duration::from_secs(DEFAULT_IDLE_TICK_SECONDS),
            alert_auto_hide: Duration::from_secs(DEFAULT_ALERT_AUTO_HIDE_SECONDS),
            check_in_alert_delay: Duration::from_millis(DEFAULT_CHECK_IN_ALERT_DELAY_MS),
            crisis_follow_up_delay: Duration::from_millis(DEFAULT_CRISIS_FOLLOW_UP_DELAY_MS),
        }
    }
}

impl EscalationConfig {
    /// Build from `DOST_*` environment variables, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let high_risk_match_count = parsed("DOST_HIGH_RISK_COUNT")
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.high_risk_match_count);
        let auto_open_delay = parsed("DOST_AUTO_OPEN_DELAY_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.auto_open_delay);
        let cooldown = parsed("DOST_COOLDOWN_MINUTES")
            .filter(|v| *v <= MAX_COOLDOWN_MINUTES)
            .and_then(|v| i64::try_from(v).ok())
            .map(TimeDelta::minutes)
            .unwrap_or(defaults.cooldown);
        let idle_tick_interval = parsed("DOST_IDLE_TICK_SECONDS")
            .filter(|v| *v > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.idle_tick_interval);

        if high_risk_match_count != defaults.high_risk_match_count
            || cooldown != defaults.cooldown
        {
            tracing::info!(
                high_risk_match_count,
                cooldown_minutes = cooldown.num_minutes(),
                "Escalation thresholds overridden from environment"
            );
        }

        Self {
            high_risk_match_count,
            auto_open_delay,
            cooldown,
            idle_tick_interval,
            ..defaults
        }
    }

    pub fn auto_open_delay_ms(&self) -> u64 {
        millis(self.auto_open_delay)
    }

    pub fn alert_auto_hide_ms(&self) -> u64 {
        millis(self.alert_auto_hide)
    }

    pub fn check_in_alert_delay_ms(&self) -> u64 {
        millis(self.check_in_alert_delay)
    }

    pub fn crisis_follow_up_delay_ms(&self) -> u64 {
        millis(self.crisis_follow_up_delay)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
