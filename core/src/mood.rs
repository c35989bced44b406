use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    #[serde(alias = "great")]
    Excellent,
    Good,
    Okay,
    Low,
    Struggling,
}

impl Mood {
    /// Ordinal score, 5 (excellent) down to 1 (struggling).
    pub fn score(self) -> u8 {
        match self {
            Mood::Excellent => 5,
            Mood::Good => 4,
            Mood::Okay => 3,
            Mood::Low => 2,
            Mood::Struggling => 1,
        }
    }

    /// Moods that trigger the crisis alert.
    pub fn is_concerning(self) -> bool {
        matches!(self, Mood::Low | Mood::Struggling)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Excellent => "excellent",
            Mood::Good => "good",
            Mood::Okay => "okay",
            Mood::Low => "low",
            Mood::Struggling => "struggling",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "excellent" | "great" => Ok(Mood::Excellent),
            "good" => Ok(Mood::Good),
            "okay" | "ok" => Ok(Mood::Okay),
            "low" => Ok(Mood::Low),
            "struggling" => Ok(Mood::Struggling),
            _ => Err(CoreError::UnknownMood(s.to_string())),
        }
    }
}

/// Payload the mood widget posts to the mood-logging backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MoodLog {
    /// 1 (struggling) to 5 (excellent)
    pub mood_score: u8,
    pub notes: String,
    pub timestamp: DateTime<Utc>,
}

impl MoodLog {
    /// Build the log entry for a selection. Without explicit notes the entry
    /// records the mood label, as the dashboard widget does.
    pub fn new(mood: Mood, notes: Option<&str>, timestamp: DateTime<Utc>) -> Self {
        let notes = match notes.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => format!("Mood: {mood}"),
        };
        Self {
            mood_score: mood.score(),
            notes,
            timestamp,
        }
    }
}
