//! Crisis-signal detection for Dost chat sessions.
//!
//! [`detector`] scans messages against a fixed keyword taxonomy and keeps a
//! per-session counter; [`escalation`] turns detections, idle ticks, mood
//! selections, and check-in answers into UI actions; [`session`] combines
//! both for hosts that keep one object per conversation.

pub mod config;
pub mod detector;
pub mod error;
pub mod escalation;
pub mod events;
pub mod keywords;
pub mod mood;
pub mod replies;
pub mod session;

pub use config::EscalationConfig;
pub use detector::{DetectionResult, RiskDetector, SessionRiskState, detect};
pub use escalation::{CheckInResponse, EscalationAction, EscalationPolicy};
pub use events::{CrisisEvent, CrisisEventType, EventSink, MemoryEventSink, TracingEventSink};
pub use keywords::{CategoryPhrases, KeywordCategory};
pub use mood::{Mood, MoodLog};
pub use session::{MessageOutcome, RiskSession, SessionPhase, SessionSnapshot};
