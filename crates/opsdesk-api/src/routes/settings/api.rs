//! Settings API endpoints - JSON API

use crate::AppState;
use axum::extract::State;
use axum::Json;
use opsdesk_config::Config;

/// Effective configuration. The remote token is never serialized.
pub async fn api_settings(State(state): State<AppState>) -> Json<Config> {
    Json(state.config.as_ref().clone())
}

#[cfg(test)]
mod tests {
    use crate::create_router;
    use crate::test_support::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_settings_json() {
        let (state, _, _) = state_with_members().await;
        let response = create_router(state)
            .oneshot(Request::get("/api/settings").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["server"]["port"], 8090);
        assert_eq!(json["realtime"]["debounce_ms"], 500);
        assert!(json["remote"].get("token").is_none());
    }
}
