use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dost_core::config::MAX_MESSAGE_CHARS;
use dost_core::error::ApiError;
use dost_core::replies::{
    self, CRISIS_FOLLOW_UP, CRISIS_OPTIONS, DEFAULT_REPLIES, GENTLE_CHECK_IN,
};
use dost_core::{
    CheckInResponse, CrisisEvent, DetectionResult, EscalationAction, EscalationConfig, Mood,
    MoodLog, SessionPhase, SessionRiskState, SessionSnapshot,
};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

/// Session reads and non-message mutations.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions/{id}", get(get_session).delete(end_session))
        .route("/v1/sessions/{id}/mood", post(select_mood))
        .route("/v1/sessions/{id}/tick", post(idle_tick))
        .route("/v1/sessions/{id}/check-in", post(respond_to_check_in))
        .route("/v1/sessions/{id}/alert/dismiss", post(dismiss_alert))
        .route("/v1/sessions/{id}/modal/open", post(open_modal))
        .route("/v1/sessions/{id}/events", get(list_events))
}

/// Session creation, kept separate so it can carry its own rate limit.
pub fn create_router() -> Router<AppState> {
    Router::new().route("/v1/sessions", post(create_session))
}

/// Message scanning, kept separate so it can carry its own rate limit.
pub fn message_router() -> Router<AppState> {
    Router::new().route("/v1/sessions/{id}/messages", post(send_message))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SendMessageRequest {
    /// Raw user text, at most 500 characters
    pub message: String,
}

/// Crisis follow-up shown after any keyword match.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CrisisFollowUp {
    pub message: String,
    pub options: Vec<String>,
    /// Delay before the follow-up should appear
    pub delay_ms: u64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub detection: DetectionResult,
    pub action: EscalationAction,
    pub state: SessionRiskState,
    pub phase: SessionPhase,
    /// Supportive bot reply to the message
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<CrisisFollowUp>,
    /// Hide the alert banner after this long, when the action shows one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_hide_after_ms: Option<u64>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct MoodRequest {
    /// excellent, good, okay, low or struggling ("great" is accepted for excellent)
    pub mood: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MoodResponse {
    pub mood: Mood,
    pub action: EscalationAction,
    pub phase: SessionPhase,
    pub feedback: String,
    /// Entry to forward to the mood-logging backend
    pub log: MoodLog,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_hide_after_ms: Option<u64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TickResponse {
    pub action: EscalationAction,
    pub state: SessionRiskState,
    pub phase: SessionPhase,
    /// Check-in prompt, present when the action is a gentle check-in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CheckInRequest {
    /// better, same, worse or need_help
    pub response: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CheckInReply {
    pub response: CheckInResponse,
    pub action: EscalationAction,
    pub phase: SessionPhase,
    pub reply: String,
    /// Wait this long before showing the alert (answer `worse`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_hide_after_ms: Option<u64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PhaseResponse {
    pub session_id: Uuid,
    pub phase: SessionPhase,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EventsResponse {
    pub session_id: Uuid,
    pub events: Vec<CrisisEvent>,
}

fn alert_hide_after(config: &EscalationConfig, action: EscalationAction) -> Option<u64> {
    action.shows_alert().then(|| config.alert_auto_hide_ms())
}

fn validate_message(message: &str) -> Result<(), AppError> {
    if message.trim().is_empty() {
        return Err(AppError::Validation {
            message: "message must not be empty".to_string(),
            field: Some("message".to_string()),
            received: Some(serde_json::Value::String(message.to_string())),
            docs_hint: None,
        });
    }

    let chars = message.chars().count();
    if chars > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation {
            message: format!("message is {chars} characters, the limit is {MAX_MESSAGE_CHARS}"),
            field: Some("message".to_string()),
            received: None,
            docs_hint: Some("Split long messages into several shorter ones.".to_string()),
        });
    }

    Ok(())
}

/// Start a chat session
#[utoipa::path(
    post,
    path = "/v1/sessions",
    responses(
        (status = 201, description = "Session created", body = SessionSnapshot),
        (status = 429, description = "Session limit reached", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn create_session(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let id = state.sessions.create(Utc::now())?;
    let snapshot = state.sessions.with_session(id, |s| s.snapshot())?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// Current risk state and phase of a session
#[utoipa::path(
    get,
    path = "/v1/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session snapshot", body = SessionSnapshot),
        (status = 404, description = "Unknown session", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.sessions.with_session(id, |s| s.snapshot())?))
}

/// End a session and discard its risk state
#[utoipa::path(
    delete,
    path = "/v1/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 204, description = "Session ended"),
        (status = 404, description = "Unknown session", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.remove(id) {
        return Err(AppError::SessionNotFound { session_id: id });
    }
    state.audit.forget_session(id);
    Ok(StatusCode::NO_CONTENT)
}

/// Scan a chat message for crisis keywords
///
/// Returns the matched keywords, the escalation action the UI should take,
/// and a supportive reply. Any match adds a crisis follow-up with support options.
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/messages",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message processed", body = MessageResponse),
        (status = 400, description = "Empty or too long message", body = ApiError),
        (status = 404, description = "Unknown session", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(req): AppJson<SendMessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validate_message(&req.message)?;

    let outcome = state.sessions.with_session(id, |s| {
        s.process_message(&req.message, Utc::now(), state.sink.as_ref())
    })?;

    let pick = rand::thread_rng().gen_range(0..DEFAULT_REPLIES.len());
    let follow_up = outcome.detection.has_matches().then(|| CrisisFollowUp {
        message: CRISIS_FOLLOW_UP.to_string(),
        options: CRISIS_OPTIONS.iter().map(|o| o.to_string()).collect(),
        delay_ms: state.sessions.config().crisis_follow_up_delay_ms(),
    });

    Ok(Json(MessageResponse {
        detection: outcome.detection,
        action: outcome.action,
        state: outcome.state,
        phase: outcome.phase,
        reply: replies::supportive_reply(&req.message, pick).to_string(),
        follow_up,
        alert_hide_after_ms: alert_hide_after(state.sessions.config(), outcome.action),
    }))
}

/// Record a mood selection
///
/// `low` and `struggling` raise the crisis alert regardless of keyword history.
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/mood",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = MoodRequest,
    responses(
        (status = 200, description = "Mood recorded", body = MoodResponse),
        (status = 400, description = "Unknown mood", body = ApiError),
        (status = 404, description = "Unknown session", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn select_mood(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(req): AppJson<MoodRequest>,
) -> Result<Json<MoodResponse>, AppError> {
    let mood: Mood = req.mood.parse()?;
    let now = Utc::now();

    let (action, phase) = state.sessions.with_session(id, |s| {
        let action = s.select_mood(mood, now, state.sink.as_ref());
        (action, s.phase())
    })?;

    Ok(Json(MoodResponse {
        mood,
        action,
        phase,
        feedback: replies::mood_feedback(mood).to_string(),
        log: MoodLog::new(mood, req.notes.as_deref(), now),
        alert_hide_after_ms: alert_hide_after(state.sessions.config(), action),
    }))
}

/// Evaluate the idle check now
///
/// The service also ticks every session on its own cadence. A check-in raised
/// by that background tick is delivered by the next call here.
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/tick",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Tick evaluated", body = TickResponse),
        (status = 404, description = "Unknown session", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn idle_tick(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TickResponse>, AppError> {
    let (action, risk, phase) = state.sessions.with_session(id, |s| {
        s.idle_tick(Utc::now(), state.sink.as_ref());
        let action = if s.take_pending_check_in() {
            EscalationAction::GentleCheckIn
        } else {
            EscalationAction::None
        };
        (action, s.state(), s.phase())
    })?;

    Ok(Json(TickResponse {
        action,
        state: risk,
        phase,
        message: (action == EscalationAction::GentleCheckIn).then(|| GENTLE_CHECK_IN.to_string()),
    }))
}

/// Answer the gentle check-in
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/check-in",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Answer recorded", body = CheckInReply),
        (status = 400, description = "Unknown answer", body = ApiError),
        (status = 404, description = "Unknown session", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn respond_to_check_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(req): AppJson<CheckInRequest>,
) -> Result<Json<CheckInReply>, AppError> {
    let response: CheckInResponse = req.response.parse()?;

    let (action, phase) = state.sessions.with_session(id, |s| {
        let action = s.respond_to_check_in(response, Utc::now(), state.sink.as_ref());
        (action, s.phase())
    })?;

    let config = state.sessions.config();
    Ok(Json(CheckInReply {
        response,
        action,
        phase,
        reply: replies::check_in_reply(response).to_string(),
        alert_delay_ms: (response == CheckInResponse::Worse)
            .then(|| config.check_in_alert_delay_ms()),
        alert_hide_after_ms: alert_hide_after(config, action),
    }))
}

/// Dismiss the crisis alert banner
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/alert/dismiss",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Alert dismissed", body = PhaseResponse),
        (status = 404, description = "Unknown session", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn dismiss_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PhaseResponse>, AppError> {
    let phase = state.sessions.with_session(id, |s| {
        s.dismiss_alert(Utc::now(), state.sink.as_ref());
        s.phase()
    })?;
    Ok(Json(PhaseResponse {
        session_id: id,
        phase,
    }))
}

/// Record that the support modal was opened
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/modal/open",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Modal opened", body = PhaseResponse),
        (status = 404, description = "Unknown session", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn open_modal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PhaseResponse>, AppError> {
    let phase = state.sessions.with_session(id, |s| {
        s.open_modal(Utc::now(), state.sink.as_ref());
        s.phase()
    })?;
    Ok(Json(PhaseResponse {
        session_id: id,
        phase,
    }))
}

/// Crisis events logged for a session, oldest first
#[utoipa::path(
    get,
    path = "/v1/sessions/{id}/events",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Crisis events", body = EventsResponse),
        (status = 404, description = "Unknown session", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn list_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventsResponse>, AppError> {
    state.sessions.with_session(id, |_| ())?;
    Ok(Json(EventsResponse {
        session_id: id,
        events: state.audit.for_session(id),
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use chrono::{Duration, TimeDelta};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    fn app_with_state() -> (Router, AppState) {
        let state = AppState::new(EscalationConfig::default(), 8, TimeDelta::hours(2));
        let app = Router::new()
            .merge(router())
            .merge(create_router())
            .merge(message_router())
            .with_state(state.clone());
        (app, state)
    }

    fn app() -> Router {
        app_with_state().0
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(b) => Body::from(b.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = call(app, Method::POST, "/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["phase"], "idle");
        body["session_id"].as_str().unwrap().to_string()
    }

    #[test]
    fn rejects_blank_and_oversized_messages() {
        assert!(validate_message("   ").is_err());
        assert!(validate_message(&"a".repeat(MAX_MESSAGE_CHARS + 1)).is_err());
        assert!(validate_message(&"é".repeat(MAX_MESSAGE_CHARS)).is_ok());
    }

    #[tokio::test]
    async fn high_risk_message_escalates_and_is_logged() {
        let app = app();
        let id = new_session(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/messages"),
            Some(json!({ "message": "I keep thinking about suicide" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["detection"]["is_high_risk"], true);
        assert_eq!(body["action"]["action"], "show_alert_and_auto_open");
        assert_eq!(body["action"]["delay_ms"], 2_000);
        assert_eq!(body["phase"], "high_risk");
        assert_eq!(body["follow_up"]["options"].as_array().unwrap().len(), 6);
        assert_eq!(body["alert_hide_after_ms"], 30_000);

        let (_, events) = call(&app, Method::GET, &format!("/v1/sessions/{id}/events"), None).await;
        let types: Vec<&str> = events["events"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["type"].as_str().unwrap())
            .collect();
        assert_eq!(types, vec!["keyword_detected", "high_risk_detected"]);
    }

    #[tokio::test]
    async fn neutral_message_gets_reply_without_follow_up() {
        let app = app();
        let id = new_session(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/messages"),
            Some(json!({ "message": "I feel anxious about exams" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"]["action"], "none");
        assert!(body.get("follow_up").is_none());
        assert!(body.get("alert_hide_after_ms").is_none());
        assert!(body["reply"].as_str().unwrap().contains("anxiety"));
    }

    #[tokio::test]
    async fn struggling_mood_raises_alert() {
        let app = app();
        let id = new_session(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/mood"),
            Some(json!({ "mood": "Struggling" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"]["action"], "show_alert");
        assert_eq!(body["log"]["mood_score"], 1);
        assert_eq!(body["alert_hide_after_ms"], 30_000);
        assert_eq!(body["phase"], "alerted");
    }

    #[tokio::test]
    async fn unknown_mood_is_a_validation_error() {
        let app = app();
        let id = new_session(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/mood"),
            Some(json!({ "mood": "meh" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");
        assert_eq!(body["field"], "mood");
    }

    #[tokio::test]
    async fn missing_body_field_is_reported() {
        let app = app();
        let id = new_session(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/messages"),
            Some(json!({ "text": "hello" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "message");
    }

    #[tokio::test]
    async fn ended_session_is_gone() {
        let app = app();
        let id = new_session(&app).await;

        let (status, _) = call(&app, Method::DELETE, &format!("/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = call(&app, Method::GET, &format!("/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn fresh_tick_does_nothing_and_dismiss_returns_to_idle() {
        let app = app();
        let id = new_session(&app).await;
        call(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/messages"),
            Some(json!({ "message": "I feel hopeless" })),
        )
        .await;

        let (_, tick) = call(&app, Method::POST, &format!("/v1/sessions/{id}/tick"), None).await;
        assert_eq!(tick["action"]["action"], "none");
        assert_eq!(tick["state"]["match_count"], 1);
        assert!(tick.get("message").is_none());

        let (_, dismissed) = call(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/alert/dismiss"),
            None,
        )
        .await;
        assert_eq!(dismissed["phase"], "idle");
    }

    #[tokio::test]
    async fn check_in_answer_round_trip() {
        let app = app();
        let id = new_session(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/check-in"),
            Some(json!({ "response": "worse" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"]["action"], "show_alert");
        assert_eq!(body["response"], "worse");
        assert_eq!(body["alert_delay_ms"], 1_000);
        assert_eq!(body["alert_hide_after_ms"], 30_000);

        let (_, better) = call(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/check-in"),
            Some(json!({ "response": "better" })),
        )
        .await;
        assert_eq!(better["action"]["action"], "none");
        assert!(better.get("alert_delay_ms").is_none());

        let (_, opened) = call(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/modal/open"),
            None,
        )
        .await;
        assert_eq!(opened["phase"], "modal_open");
    }

    #[tokio::test]
    async fn check_in_raised_in_background_reaches_next_tick() {
        let (app, state) = app_with_state();
        let id = new_session(&app).await;
        let session_id: Uuid = id.parse().unwrap();
        let earlier = Utc::now() - Duration::minutes(31);
        state
            .sessions
            .with_session(session_id, |s| {
                s.process_message("I feel hopeless", earlier, state.sink.as_ref())
            })
            .unwrap();

        let checked = state.sessions.tick_all(Utc::now(), state.sink.as_ref());
        assert_eq!(checked, vec![session_id]);

        let (_, snapshot) = call(&app, Method::GET, &format!("/v1/sessions/{id}"), None).await;
        assert_eq!(snapshot["pending_check_in"], true);
        assert_eq!(snapshot["state"]["match_count"], 0);

        let (_, tick) = call(&app, Method::POST, &format!("/v1/sessions/{id}/tick"), None).await;
        assert_eq!(tick["action"]["action"], "gentle_check_in");
        assert!(tick["message"].as_str().unwrap().contains("How are you feeling now?"));

        let (_, again) = call(&app, Method::POST, &format!("/v1/sessions/{id}/tick"), None).await;
        assert_eq!(again["action"]["action"], "none");
        assert!(again.get("message").is_none());
    }
}
