//! One chat session's risk state plus the UI phase derived from the actions
//! emitted so far. Every escalation is reported to an [`EventSink`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::EscalationConfig;
use crate::detector::{DetectionResult, RiskDetector, SessionRiskState};
use crate::escalation::{CheckInResponse, EscalationAction, EscalationPolicy};
use crate::events::{CrisisEvent, CrisisEventType, EventSink};
use crate::mood::Mood;

/// Where the session sits in the escalation ladder.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    Alerted,
    HighRisk,
    ModalOpen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MessageOutcome {
    pub detection: DetectionResult,
    pub action: EscalationAction,
    pub state: SessionRiskState,
    pub phase: SessionPhase,
}

/// Read-only view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: SessionRiskState,
    pub phase: SessionPhase,
    /// A gentle check-in fired and no client has picked it up yet.
    pub pending_check_in: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RiskSession {
    id: Uuid,
    state: SessionRiskState,
    phase: SessionPhase,
    pending_check_in: bool,
    detector: RiskDetector,
    policy: EscalationPolicy,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl RiskSession {
    pub fn new(id: Uuid, config: &EscalationConfig, now: DateTime<Utc>) -> Self {
        Self {
            id,
            state: SessionRiskState::new(),
            phase: SessionPhase::Idle,
            pending_check_in: false,
            detector: RiskDetector::new(config),
            policy: EscalationPolicy::new(config),
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionRiskState {
        self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            state: self.state,
            phase: self.phase,
            pending_check_in: self.pending_check_in,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        }
    }

    /// Scan a user message and act on the result.
    pub fn process_message(
        &mut self,
        message: &str,
        now: DateTime<Utc>,
        sink: &dyn EventSink,
    ) -> MessageOutcome {
        self.last_activity_at = now;

        let (detection, next) = self.detector.detect(message, self.state, now);
        self.state = next;
        let action = self.policy.on_detection(&detection);

        if detection.has_matches() {
            tracing::info!(
                session_id = %self.id,
                matched = detection.matched_keywords.len(),
                match_count = self.state.match_count,
                high_risk = detection.is_high_risk,
                "Crisis keywords matched"
            );
            let keywords: Vec<&str> = detection
                .matched_keywords
                .iter()
                .map(String::as_str)
                .collect();
            let categories: Vec<&str> = detection
                .matched_categories
                .iter()
                .map(|c| c.as_str())
                .collect();
            sink.record(
                &self
                    .event(CrisisEventType::KeywordDetected, now)
                    .with("keywords", keywords)
                    .with("categories", categories),
            );
        }
        if detection.is_high_risk {
            sink.record(
                &self
                    .event(CrisisEventType::HighRiskDetected, now)
                    .with("keywordCount", self.state.match_count),
            );
        }
        self.apply(action);

        MessageOutcome {
            detection,
            action,
            state: self.state,
            phase: self.phase,
        }
    }

    /// Mood selection path; bypasses keyword detection entirely.
    pub fn select_mood(
        &mut self,
        mood: Mood,
        now: DateTime<Utc>,
        sink: &dyn EventSink,
    ) -> EscalationAction {
        self.last_activity_at = now;

        let action = self.policy.on_mood_selected(mood);
        if !action.is_none() {
            sink.record(
                &self
                    .event(CrisisEventType::MoodBasedTrigger, now)
                    .with("mood", mood.as_str())
                    .with("moodScore", mood.score()),
            );
        }
        self.apply(action);
        action
    }

    /// Periodic quiet-period check. A gentle check-in cools the session down,
    /// returns it to `Idle`, and stays pending until a client takes it with
    /// [`RiskSession::take_pending_check_in`].
    pub fn idle_tick(&mut self, now: DateTime<Utc>, sink: &dyn EventSink) -> EscalationAction {
        let action = self.policy.on_idle_tick(&self.state, now);
        if action == EscalationAction::GentleCheckIn {
            tracing::info!(
                session_id = %self.id,
                match_count = self.state.match_count,
                "Cooling down session after quiet period"
            );
            sink.record(
                &self
                    .event(CrisisEventType::GentleCheckIn, now)
                    .with("keywordCount", self.state.match_count),
            );
            self.state.cool_down();
            self.phase = SessionPhase::Idle;
            self.pending_check_in = true;
        }
        action
    }

    /// Hand over a check-in raised by an earlier tick, clearing it.
    pub fn take_pending_check_in(&mut self) -> bool {
        std::mem::take(&mut self.pending_check_in)
    }

    pub fn respond_to_check_in(
        &mut self,
        response: CheckInResponse,
        now: DateTime<Utc>,
        sink: &dyn EventSink,
    ) -> EscalationAction {
        self.last_activity_at = now;
        self.pending_check_in = false;

        sink.record(
            &self
                .event(CrisisEventType::CheckInResponse, now)
                .with("response", response.as_str()),
        );
        let action = self.policy.on_check_in_response(response);
        self.apply(action);
        action
    }

    /// User closed the alert banner. The risk counter is left as is.
    pub fn dismiss_alert(&mut self, now: DateTime<Utc>, sink: &dyn EventSink) {
        self.last_activity_at = now;
        self.phase = SessionPhase::Idle;
        sink.record(&self.event(CrisisEventType::AlertDismissed, now));
    }

    /// Support modal opened, by the user or after an auto-open delay.
    pub fn open_modal(&mut self, now: DateTime<Utc>, sink: &dyn EventSink) {
        self.last_activity_at = now;
        self.phase = SessionPhase::ModalOpen;
        sink.record(&self.event(CrisisEventType::ModalOpened, now));
    }

    fn apply(&mut self, action: EscalationAction) {
        let target = match action {
            EscalationAction::ShowAlert => SessionPhase::Alerted,
            EscalationAction::ShowAlertAndAutoOpen { .. } => SessionPhase::HighRisk,
            EscalationAction::None | EscalationAction::GentleCheckIn => return,
        };
        self.phase = self.phase.max(target);
    }

    fn event(&self, event_type: CrisisEventType, now: DateTime<Utc>) -> CrisisEvent {
        CrisisEvent::new(event_type, self.id, now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::events::MemoryEventSink;

    fn session(now: DateTime<Utc>) -> RiskSession {
        RiskSession::new(Uuid::now_v7(), &EscalationConfig::default(), now)
    }

    fn types(sink: &MemoryEventSink) -> Vec<CrisisEventType> {
        sink.events().into_iter().map(|e| e.event_type).collect()
    }

    #[test]
    fn neutral_message_stays_idle_and_logs_nothing() {
        let now = Utc::now();
        let sink = MemoryEventSink::new();
        let mut s = session(now);

        let outcome = s.process_message("Just finished my assignment", now, &sink);

        assert_eq!(outcome.action, EscalationAction::None);
        assert_eq!(outcome.phase, SessionPhase::Idle);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn climbs_from_alerted_to_high_risk() {
        let now = Utc::now();
        let sink = MemoryEventSink::new();
        let mut s = session(now);

        let first = s.process_message("I'm so worthless", now, &sink);
        assert_eq!(first.action, EscalationAction::ShowAlert);
        assert_eq!(first.phase, SessionPhase::Alerted);

        let second = s.process_message("feeling trapped and hopeless", now, &sink);
        assert_eq!(second.state.match_count, 3);
        assert_eq!(
            second.action,
            EscalationAction::ShowAlertAndAutoOpen { delay_ms: 2_000 }
        );
        assert_eq!(second.phase, SessionPhase::HighRisk);

        assert_eq!(
            types(&sink),
            vec![
                CrisisEventType::KeywordDetected,
                CrisisEventType::KeywordDetected,
                CrisisEventType::HighRiskDetected,
            ]
        );
        let high_risk = &sink.events()[2];
        assert_eq!(high_risk.extra["keywordCount"], 3);
    }

    #[test]
    fn mood_alert_is_independent_of_keywords() {
        let now = Utc::now();
        let sink = MemoryEventSink::new();
        let mut s = session(now);

        assert_eq!(s.select_mood(Mood::Struggling, now, &sink), EscalationAction::ShowAlert);
        assert_eq!(s.phase(), SessionPhase::Alerted);
        assert_eq!(s.state().match_count, 0);
        assert_eq!(types(&sink), vec![CrisisEventType::MoodBasedTrigger]);

        assert_eq!(s.select_mood(Mood::Good, now, &sink), EscalationAction::None);
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn mood_alert_does_not_lower_high_risk_phase() {
        let now = Utc::now();
        let sink = MemoryEventSink::new();
        let mut s = session(now);

        s.process_message("suicide", now, &sink);
        s.select_mood(Mood::Low, now, &sink);
        assert_eq!(s.phase(), SessionPhase::HighRisk);
    }

    #[test]
    fn quiet_period_triggers_check_in_and_cooldown() {
        let start = Utc::now();
        let sink = MemoryEventSink::new();
        let mut s = session(start);
        s.process_message("I just want to give up", start, &sink);

        assert_eq!(
            s.idle_tick(start + Duration::minutes(29), &sink),
            EscalationAction::None
        );
        assert_eq!(
            s.idle_tick(start + Duration::minutes(31), &sink),
            EscalationAction::GentleCheckIn
        );
        assert_eq!(s.state(), SessionRiskState::new());
        assert_eq!(s.phase(), SessionPhase::Idle);

        // already cooled down: no repeat check-in
        assert_eq!(
            s.idle_tick(start + Duration::minutes(60), &sink),
            EscalationAction::None
        );
        assert_eq!(
            types(&sink),
            vec![CrisisEventType::KeywordDetected, CrisisEventType::GentleCheckIn]
        );
    }

    #[test]
    fn check_in_from_background_tick_waits_for_client() {
        let start = Utc::now();
        let sink = MemoryEventSink::new();
        let mut s = session(start);
        s.process_message("there is no way out", start, &sink);

        // background tick fires first, the client polls a minute later
        assert_eq!(
            s.idle_tick(start + Duration::minutes(31), &sink),
            EscalationAction::GentleCheckIn
        );
        assert_eq!(
            s.idle_tick(start + Duration::minutes(32), &sink),
            EscalationAction::None
        );
        assert!(s.snapshot().pending_check_in);

        assert!(s.take_pending_check_in());
        assert!(!s.take_pending_check_in());
        assert!(!s.snapshot().pending_check_in);
    }

    #[test]
    fn answering_clears_pending_check_in() {
        let start = Utc::now();
        let sink = MemoryEventSink::new();
        let mut s = session(start);
        s.process_message("I feel like a burden", start, &sink);
        s.idle_tick(start + Duration::minutes(40), &sink);

        s.respond_to_check_in(CheckInResponse::Better, start + Duration::minutes(41), &sink);
        assert!(!s.snapshot().pending_check_in);
    }

    #[test]
    fn counter_restarts_after_cooldown() {
        let start = Utc::now();
        let sink = MemoryEventSink::new();
        let mut s = session(start);
        s.process_message("worthless, hopeless", start, &sink);
        s.idle_tick(start + Duration::minutes(45), &sink);

        let later = start + Duration::minutes(50);
        let outcome = s.process_message("still feel trapped", later, &sink);
        assert_eq!(outcome.state.match_count, 1);
        assert_eq!(outcome.state.last_match_at, Some(later));
        assert!(!outcome.detection.is_high_risk);
    }

    #[test]
    fn worse_check_in_answer_raises_alert() {
        let now = Utc::now();
        let sink = MemoryEventSink::new();
        let mut s = session(now);

        assert_eq!(
            s.respond_to_check_in(CheckInResponse::Worse, now, &sink),
            EscalationAction::ShowAlert
        );
        assert_eq!(s.phase(), SessionPhase::Alerted);
        assert_eq!(sink.events()[0].extra["response"], "worse");
    }

    #[test]
    fn dismiss_keeps_counter_and_modal_is_logged() {
        let now = Utc::now();
        let sink = MemoryEventSink::new();
        let mut s = session(now);
        s.process_message("I want to hurt myself", now, &sink);

        s.dismiss_alert(now, &sink);
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.state().match_count, 1);

        s.open_modal(now, &sink);
        assert_eq!(s.phase(), SessionPhase::ModalOpen);
        assert_eq!(
            types(&sink),
            vec![
                CrisisEventType::KeywordDetected,
                CrisisEventType::AlertDismissed,
                CrisisEventType::ModalOpened,
            ]
        );
    }

    #[test]
    fn snapshot_reflects_activity() {
        let start = Utc::now();
        let sink = MemoryEventSink::new();
        let mut s = session(start);
        let later = start + Duration::seconds(10);
        s.process_message("hello", later, &sink);

        let snap = s.snapshot();
        assert_eq!(snap.session_id, s.id());
        assert_eq!(snap.created_at, start);
        assert_eq!(snap.last_activity_at, later);
    }
}
