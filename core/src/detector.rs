//! Keyword risk detector.
//!
//! Matching is literal substring containment against the lowercased message.
//! There is no tokenization, so partial-word overlaps ("jumpstart") match too.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{DEFAULT_HIGH_RISK_MATCH_COUNT, EscalationConfig};
use crate::keywords::{self, KeywordCategory};

/// Risk accumulated over one chat session.
///
/// Owned by the caller. Only [`RiskDetector::detect`] and
/// [`SessionRiskState::cool_down`] change it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionRiskState {
    /// Cumulative keyword matches since session start or the last cooldown.
    pub match_count: u32,
    /// Time of the most recent match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_match_at: Option<DateTime<Utc>>,
}

impl SessionRiskState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset after a gentle check-in: counter and timestamp both cleared.
    pub fn cool_down(&mut self) {
        self.match_count = 0;
        self.last_match_at = None;
    }
}

/// Outcome of scanning one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DetectionResult {
    pub matched_keywords: BTreeSet<String>,
    pub matched_categories: BTreeSet<KeywordCategory>,
    pub is_high_risk: bool,
}

impl DetectionResult {
    pub fn has_matches(&self) -> bool {
        !self.matched_keywords.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskDetector {
    high_risk_match_count: u32,
}

impl Default for RiskDetector {
    fn default() -> Self {
        Self {
            high_risk_match_count: DEFAULT_HIGH_RISK_MATCH_COUNT,
        }
    }
}

impl RiskDetector {
    pub fn new(config: &EscalationConfig) -> Self {
        Self {
            high_risk_match_count: config.high_risk_match_count,
        }
    }

    /// Scan `message` and return the matches together with the updated state.
    ///
    /// Without matches the input state comes back unchanged. With matches the
    /// counter grows by the number of distinct phrases found and
    /// `last_match_at` becomes `now`.
    pub fn detect(
        &self,
        message: &str,
        state: SessionRiskState,
        now: DateTime<Utc>,
    ) -> (DetectionResult, SessionRiskState) {
        let lowered = message.to_lowercase();

        let mut result = DetectionResult::default();
        for (category, phrase) in keywords::all_phrases() {
            if lowered.contains(phrase) {
                result.matched_keywords.insert(phrase.to_string());
                result.matched_categories.insert(category);
            }
        }

        if !result.has_matches() {
            return (result, state);
        }

        let found = u32::try_from(result.matched_keywords.len()).unwrap_or(u32::MAX);
        let next = SessionRiskState {
            match_count: state.match_count.saturating_add(found),
            last_match_at: Some(now),
        };

        result.is_high_risk = result
            .matched_keywords
            .iter()
            .any(|k| keywords::is_high_severity(k))
            || next.match_count >= self.high_risk_match_count;

        (result, next)
    }
}

/// [`RiskDetector::detect`] with the default thresholds.
pub fn detect(
    message: &str,
    state: SessionRiskState,
    now: DateTime<Utc>,
) -> (DetectionResult, SessionRiskState) {
    RiskDetector::default().detect(message, state, now)
}
