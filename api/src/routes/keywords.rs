use axum::extract::{Query, State};
use axum::{Json, Router, routing::get};
use dost_core::KeywordCategory;
use dost_core::error::ApiError;
use dost_core::keywords::{self, CategoryPhrases, HIGH_SEVERITY_PHRASES};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/keywords", get(list_keywords))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct KeywordsQuery {
    /// Only this category (e.g. `self_harm`)
    pub category: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct KeywordsResponse {
    pub categories: Vec<CategoryPhrases>,
    /// Cumulative match count at which a detection becomes high risk
    pub high_risk_match_count: u32,
    pub high_severity: Vec<String>,
}

/// Trigger phrases by category
#[utoipa::path(
    get,
    path = "/v1/keywords",
    params(KeywordsQuery),
    responses(
        (status = 200, description = "Keyword taxonomy", body = KeywordsResponse),
        (status = 400, description = "Unknown category", body = ApiError)
    ),
    tag = "keywords"
)]
pub async fn list_keywords(
    State(state): State<AppState>,
    Query(query): Query<KeywordsQuery>,
) -> Result<Json<KeywordsResponse>, AppError> {
    let only = query
        .category
        .as_deref()
        .map(str::parse::<KeywordCategory>)
        .transpose()?;

    Ok(Json(KeywordsResponse {
        categories: keywords::taxonomy(only),
        high_risk_match_count: state.sessions.config().high_risk_match_count,
        high_severity: HIGH_SEVERITY_PHRASES.iter().map(|p| p.to_string()).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chrono::TimeDelta;
    use dost_core::EscalationConfig;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let state = AppState::new(EscalationConfig::default(), 8, TimeDelta::hours(2));
        let app = router().with_state(state);
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn lists_full_taxonomy() {
        let (status, body) = get_json("/v1/keywords").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["categories"].as_array().unwrap().len(), 4);
        assert_eq!(body["high_risk_match_count"], 3);
    }

    #[tokio::test]
    async fn filters_by_category() {
        let (status, body) = get_json("/v1/keywords?category=Crisis_Method").await;
        assert_eq!(status, StatusCode::OK);
        let categories = body["categories"].as_array().unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0]["category"], "crisis_method");
        assert_eq!(categories[0]["phrases"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let (status, body) = get_json("/v1/keywords?category=grief").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "category");
        assert_eq!(body["received"], "grief");
    }
}
