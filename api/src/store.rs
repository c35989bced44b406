use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use dost_core::{EscalationAction, EscalationConfig, EventSink, RiskSession};
use uuid::Uuid;

use crate::error::AppError;

/// In-memory sessions keyed by id.
///
/// Each session is mutated only while its map entry is held, which
/// serializes calls for the same session. `live` counts reserved slots so
/// concurrent creates cannot overshoot `max_sessions`.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, RiskSession>>,
    live: Arc<AtomicUsize>,
    config: Arc<EscalationConfig>,
    max_sessions: usize,
    session_timeout: TimeDelta,
}

impl SessionStore {
    pub fn new(config: EscalationConfig, max_sessions: usize, session_timeout: TimeDelta) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            live: Arc::new(AtomicUsize::new(0)),
            config: Arc::new(config),
            max_sessions,
            session_timeout,
        }
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    pub fn create(&self, now: DateTime<Utc>) -> Result<Uuid, AppError> {
        let max = self.max_sessions;
        if self
            .live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .is_err()
        {
            tracing::warn!(max, "Session limit reached");
            return Err(AppError::SessionLimit { max });
        }

        let id = Uuid::now_v7();
        self.sessions
            .insert(id, RiskSession::new(id, &self.config, now));
        tracing::info!(session_id = %id, "Created session");
        Ok(id)
    }

    /// Run `f` against one session while holding its entry.
    pub fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut RiskSession) -> R,
    ) -> Result<R, AppError> {
        let mut entry = self
            .sessions
            .get_mut(&id)
            .ok_or(AppError::SessionNotFound { session_id: id })?;
        Ok(f(entry.value_mut()))
    }

    pub fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        if removed {
            self.live.fetch_sub(1, Ordering::AcqRel);
            tracing::info!(session_id = %id, "Ended session");
        }
        removed
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    /// Evaluate the idle tick for every live session. Returns the ids that
    /// received a gentle check-in.
    pub fn tick_all(&self, now: DateTime<Utc>, sink: &dyn EventSink) -> Vec<Uuid> {
        let mut checked_in = Vec::new();
        for mut entry in self.sessions.iter_mut() {
            if entry.value_mut().idle_tick(now, sink) == EscalationAction::GentleCheckIn {
                checked_in.push(*entry.key());
            }
        }
        checked_in
    }

    /// Drop sessions with no activity for longer than the session timeout.
    /// The age check and the removal happen under the same shard lock.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Vec<Uuid> {
        let timeout = self.session_timeout;
        let mut expired = Vec::new();
        self.sessions.retain(|id, session| {
            let keep = now - session.last_activity_at() <= timeout;
            if !keep {
                tracing::debug!(session_id = %id, "Removed expired session");
                expired.push(*id);
            }
            keep
        });

        if !expired.is_empty() {
            self.live.fetch_sub(expired.len(), Ordering::AcqRel);
        }
        expired
    }
}
