use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::CoreError;

/// Severity theme a trigger phrase belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum KeywordCategory {
    SuicideIdeation,
    SelfHarm,
    Hopelessness,
    CrisisMethod,
}

impl KeywordCategory {
    pub const ALL: [KeywordCategory; 4] = [
        KeywordCategory::SuicideIdeation,
        KeywordCategory::SelfHarm,
        KeywordCategory::Hopelessness,
        KeywordCategory::CrisisMethod,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            KeywordCategory::SuicideIdeation => "suicide_ideation",
            KeywordCategory::SelfHarm => "self_harm",
            KeywordCategory::Hopelessness => "hopelessness",
            KeywordCategory::CrisisMethod => "crisis_method",
        }
    }

    /// Phrases of this category together with the high-severity ones among them.
    pub fn describe(self) -> CategoryPhrases {
        let phrases = self.phrases();
        CategoryPhrases {
            category: self,
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
            high_severity: phrases
                .iter()
                .filter(|p| is_high_severity(p))
                .map(|p| p.to_string())
                .collect(),
        }
    }

    /// Lowercase trigger phrases for this category.
    pub fn phrases(self) -> &'static [&'static str] {
        match self {
            KeywordCategory::SuicideIdeation => SUICIDE_IDEATION,
            KeywordCategory::SelfHarm => SELF_HARM,
            KeywordCategory::Hopelessness => HOPELESSNESS,
            KeywordCategory::CrisisMethod => CRISIS_METHOD,
        }
    }
}

/// One category of the taxonomy as served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryPhrases {
    pub category: KeywordCategory,
    pub phrases: Vec<String>,
    pub high_severity: Vec<String>,
}

/// The whole taxonomy, or a single category when `only` is set.
pub fn taxonomy(only: Option<KeywordCategory>) -> Vec<CategoryPhrases> {
    KeywordCategory::ALL
        .into_iter()
        .filter(|c| only.is_none_or(|o| o == *c))
        .map(KeywordCategory::describe)
        .collect()
}

impl fmt::Display for KeywordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeywordCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeywordCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownCategory(s.to_string()))
    }
}

const SUICIDE_IDEATION: &[&str] = &[
    "suicide",
    "kill myself",
    "end it all",
    "not worth living",
    "better off dead",
    "want to die",
    "wish i was dead",
    "end my life",
    "take my own life",
];

const SELF_HARM: &[&str] = &[
    "hurt myself",
    "self harm",
    "cutting",
    "cut myself",
    "harm myself",
    "self injury",
    "burning myself",
    "hitting myself",
];

const HOPELESSNESS: &[&str] = &[
    "hopeless",
    "no point",
    "nothing matters",
    "give up",
    "can't go on",
    "no way out",
    "trapped",
    "worthless",
    "burden",
    "everyone hates me",
];

const CRISIS_METHOD: &[&str] = &["overdose", "pills", "rope", "bridge", "jump", "gun", "knife"];

/// Phrases that escalate straight to high risk on their own.
/// Membership is by exact phrase, not by category.
pub const HIGH_SEVERITY_PHRASES: &[&str] = &["suicide", "kill myself", "end my life"];

pub fn is_high_severity(phrase: &str) -> bool {
    HIGH_SEVERITY_PHRASES.contains(&phrase)
}

/// Iterate every `(category, phrase)` pair of the taxonomy.
pub fn all_phrases() -> impl Iterator<Item = (KeywordCategory, &'static str)> {
    KeywordCategory::ALL
        .into_iter()
        .flat_map(|category| category.phrases().iter().map(move |p| (category, *p)))
}
