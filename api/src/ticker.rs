use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::state::AppState;

/// Drive idle ticks for all sessions on the configured cadence and drop
/// sessions past their inactivity timeout. A late tick simply evaluates
/// elapsed time when it runs.
pub fn spawn_idle_ticker(state: AppState) -> JoinHandle<()> {
    let period = state.sessions.config().idle_tick_interval;

    tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            let now = chrono::Utc::now();

            let checked_in = state.sessions.tick_all(now, state.sink.as_ref());
            let expired = state.sessions.purge_expired(now);
            for id in &expired {
                state.audit.forget_session(*id);
            }

            if !checked_in.is_empty() || !expired.is_empty() {
                tracing::info!(
                    checked_in = checked_in.len(),
                    expired = expired.len(),
                    active = state.sessions.active_count(),
                    "Idle tick processed"
                );
            }
        }
    })
}
