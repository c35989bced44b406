use std::sync::Arc;

use chrono::TimeDelta;
use dost_core::events::FanoutEventSink;
use dost_core::{EscalationConfig, EventSink, MemoryEventSink, TracingEventSink};

use crate::store::SessionStore;

const DEFAULT_MAX_SESSIONS: usize = 10_000;
const DEFAULT_SESSION_TIMEOUT_MINUTES: i64 = 120;

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    /// Every crisis event goes here: structured log plus the in-memory audit list.
    pub sink: Arc<dyn EventSink>,
    /// Queryable copy of the events, served per session.
    pub audit: Arc<MemoryEventSink>,
}

impl AppState {
    pub fn new(config: EscalationConfig, max_sessions: usize, session_timeout: TimeDelta) -> Self {
        let audit = Arc::new(MemoryEventSink::new());
        let sinks: Vec<Arc<dyn EventSink>> = vec![Arc::new(TracingEventSink), audit.clone()];
        Self {
            sessions: SessionStore::new(config, max_sessions, session_timeout),
            sink: Arc::new(FanoutEventSink::new(sinks)),
            audit,
        }
    }

    pub fn from_env() -> Self {
        let max_sessions = std::env::var("DOST_MAX_SESSIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v: &usize| *v > 0)
            .unwrap_or(DEFAULT_MAX_SESSIONS);
        let timeout_minutes = std::env::var("DOST_SESSION_TIMEOUT_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v: &i64| (1..=10_080).contains(v))
            .unwrap_or(DEFAULT_SESSION_TIMEOUT_MINUTES);

        Self::new(
            EscalationConfig::from_env(),
            max_sessions,
            TimeDelta::minutes(timeout_minutes),
        )
    }
}
