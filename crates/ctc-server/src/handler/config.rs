use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::handler::JsonValue;
use crate::state::AppState;

/// Public client configuration for the browser bundle.
pub async fn get_config(State(state): State<AppState>) -> JsonValue {
    Json(json!({ "googleClientId": state.config.google_client_id }))
}
