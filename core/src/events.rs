use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of crisis event reported for audit and follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CrisisEventType {
    KeywordDetected,
    HighRiskDetected,
    MoodBasedTrigger,
    AlertDismissed,
    ModalOpened,
    GentleCheckIn,
    CheckInResponse,
}

impl CrisisEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            CrisisEventType::KeywordDetected => "keyword_detected",
            CrisisEventType::HighRiskDetected => "high_risk_detected",
            CrisisEventType::MoodBasedTrigger => "mood_based_trigger",
            CrisisEventType::AlertDismissed => "alert_dismissed",
            CrisisEventType::ModalOpened => "modal_opened",
            CrisisEventType::GentleCheckIn => "gentle_check_in",
            CrisisEventType::CheckInResponse => "check_in_response",
        }
    }
}

/// One escalation record. Serializes flat as
/// `{"type", "timestamp", "sessionId", ...extra}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CrisisEvent {
    #[serde(rename = "type")]
    pub event_type: CrisisEventType,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "sessionId")]
    pub session_id: Uuid,
    /// Event-specific fields, e.g. `keywordCount` on high-risk events
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CrisisEvent {
    pub fn new(event_type: CrisisEventType, session_id: Uuid, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_type,
            timestamp,
            session_id,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// Destination for crisis events. Transport and storage are up to the
/// implementation; recording must not fail the caller.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &CrisisEvent);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn record(&self, event: &CrisisEvent) {
        (**self).record(event)
    }
}

/// Writes every event as a structured `warn` log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&self, event: &CrisisEvent) {
        let extra = serde_json::Value::Object(event.extra.clone());
        tracing::warn!(
            event_type = event.event_type.as_str(),
            session_id = %event.session_id,
            timestamp = %event.timestamp.to_rfc3339(),
            extra = %extra,
            "Crisis event"
        );
    }
}

/// Most events kept per session; older ones are dropped first.
pub const MAX_EVENTS_PER_SESSION: usize = 256;

/// Keeps the latest events of each session in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    sessions: DashMap<Uuid, VecDeque<CrisisEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored event, grouped by session.
    pub fn events(&self) -> Vec<CrisisEvent> {
        self.sessions
            .iter()
            .flat_map(|entry| entry.value().iter().cloned().collect::<Vec<_>>())
            .collect()
    }

    pub fn for_session(&self, session_id: Uuid) -> Vec<CrisisEvent> {
        self.sessions
            .get(&session_id)
            .map(|events| events.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop every event of a finished session.
    pub fn forget_session(&self, session_id: Uuid) {
        self.sessions.remove(&session_id);
    }
}

impl EventSink for MemoryEventSink {
    fn record(&self, event: &CrisisEvent) {
        let mut events = self.sessions.entry(event.session_id).or_default();
        if events.len() == MAX_EVENTS_PER_SESSION {
            events.pop_front();
        }
        events.push_back(event.clone());
    }
}

/// Forwards each event to every inner sink.
#[derive(Default)]
pub struct FanoutEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutEventSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for FanoutEventSink {
    fn record(&self, event: &CrisisEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}
