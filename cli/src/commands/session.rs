use clap::Subcommand;
use reqwest::Method;
use serde_json::json;
use uuid::Uuid;

use crate::util::api_request;

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Start a new risk session
    Create,
    /// Show a session's risk state and phase
    Show {
        #[arg(long)]
        id: Uuid,
    },
    /// End a session and discard its state
    End {
        #[arg(long)]
        id: Uuid,
    },
    /// Send a chat message through the detector
    Send {
        #[arg(long)]
        id: Uuid,
        /// Message text (max 500 characters)
        message: String,
    },
    /// Record a mood selection
    Mood {
        #[arg(long)]
        id: Uuid,
        /// excellent, good, okay, low, or struggling
        mood: String,
        /// Optional note stored with the mood log
        #[arg(long)]
        notes: Option<String>,
    },
    /// Run one idle-tick evaluation now
    Tick {
        #[arg(long)]
        id: Uuid,
    },
    /// Answer a gentle check-in
    CheckIn {
        #[arg(long)]
        id: Uuid,
        /// better, same, worse, or need_help
        response: String,
    },
    /// Dismiss the crisis alert
    Dismiss {
        #[arg(long)]
        id: Uuid,
    },
    /// Open the support modal
    OpenModal {
        #[arg(long)]
        id: Uuid,
    },
    /// List crisis events recorded for a session
    Events {
        #[arg(long)]
        id: Uuid,
    },
}

pub async fn run(api_url: &str, raw: bool, command: SessionCommands) -> i32 {
    let (method, path, body) = match command {
        SessionCommands::Create => (Method::POST, "/v1/sessions".to_string(), None),
        SessionCommands::Show { id } => (Method::GET, format!("/v1/sessions/{id}"), None),
        SessionCommands::End { id } => (Method::DELETE, format!("/v1/sessions/{id}"), None),
        SessionCommands::Send { id, message } => (
            Method::POST,
            format!("/v1/sessions/{id}/messages"),
            Some(json!({ "message": message })),
        ),
        SessionCommands::Mood { id, mood, notes } => {
            let mut body = json!({ "mood": mood });
            if let Some(n) = notes {
                body["notes"] = json!(n);
            }
            (Method::POST, format!("/v1/sessions/{id}/mood"), Some(body))
        }
        SessionCommands::Tick { id } => (Method::POST, format!("/v1/sessions/{id}/tick"), None),
        SessionCommands::CheckIn { id, response } => (
            Method::POST,
            format!("/v1/sessions/{id}/check-in"),
            Some(json!({ "response": response })),
        ),
        SessionCommands::Dismiss { id } => (
            Method::POST,
            format!("/v1/sessions/{id}/alert/dismiss"),
            None,
        ),
        SessionCommands::OpenModal { id } => {
            (Method::POST, format!("/v1/sessions/{id}/modal/open"), None)
        }
        SessionCommands::Events { id } => (Method::GET, format!("/v1/sessions/{id}/events"), None),
    };

    api_request(api_url, method, &path, body, raw).await
}
