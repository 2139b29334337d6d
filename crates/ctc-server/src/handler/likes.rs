use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use ctc_store::{KvStoreExt, Namespace};
use ctc_types::{apply_delta, Like, LikeRequest, LikeTarget, Post, Project};

use crate::error::ApiResult;
use crate::extract::{Caller, JsonBody};
use crate::handler::JsonValue;
use crate::records::update_record_logged;
use crate::state::AppState;

/// `POST /api/likes`: toggle the caller's like on a post or project.
pub async fn toggle_like(
    State(state): State<AppState>,
    Caller(caller): Caller,
    JsonBody(request): JsonBody<LikeRequest>,
) -> ApiResult<JsonValue> {
    let (kind, target_id) = request.validate()?;
    let store = state.kv(Namespace::Likes);
    let key = Like::key(kind, &target_id, &caller.user_id);

    let liked = if store.exists(&key).await? {
        store.delete(&key).await?;
        false
    } else {
        let like = Like {
            user_id: caller.user_id.clone(),
            target_id: target_id.clone(),
            kind,
            created_at: Utc::now(),
        };
        store.put_json(&key, &like).await?;
        true
    };

    let delta = if liked { 1 } else { -1 };
    match kind {
        LikeTarget::Post => {
            update_record_logged::<Post, _>(state.kv(Namespace::Posts), "post likes", &target_id, |p| {
                p.likes = apply_delta(p.likes, delta);
            })
            .await
        }
        LikeTarget::Project => {
            update_record_logged::<Project, _>(
                state.kv(Namespace::Projects),
                "project likes",
                &target_id,
                |p| p.likes = apply_delta(p.likes, delta),
            )
            .await
        }
    }
    tracing::debug!(%kind, target_id = %target_id, user_id = %caller.user_id, liked, "like toggled");

    Ok(Json(json!({ "success": true, "liked": liked })))
}
