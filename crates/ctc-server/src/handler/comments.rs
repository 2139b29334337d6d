use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::json;

use ctc_store::{KvStoreExt, Namespace};
use ctc_types::{apply_delta, generate_id, Comment, CommentDraft, Post, TypeError};

use crate::error::{ApiError, ApiResult};
use crate::extract::{Caller, JsonBody, QueryParams};
use crate::handler::JsonValue;
use crate::records::update_record_logged;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsQuery {
    pub post_id: Option<String>,
}

async fn adjust_post_comments(state: &AppState, post_id: &str, delta: i64) {
    update_record_logged::<Post, _>(state.kv(Namespace::Posts), "post comment count", post_id, |p| {
        p.comments = apply_delta(p.comments, delta);
    })
    .await;
}

pub async fn create_comment(
    State(state): State<AppState>,
    Caller(caller): Caller,
    JsonBody(draft): JsonBody<CommentDraft>,
) -> ApiResult<JsonValue> {
    let post_id = draft
        .post_id
        .filter(|id| !id.is_empty())
        .ok_or(TypeError::MissingField("postId"))?;

    let comment = Comment {
        id: generate_id(),
        post_id,
        content: draft.content,
        author_id: caller.user_id,
        created_at: Utc::now(),
    };
    let store = state.kv(Namespace::Comments);
    store.put_json(&comment.id, &comment).await?;

    let marker = Comment::post_marker_key(&comment.post_id, &comment.id);
    if let Err(e) = store.put(&marker, comment.id.clone()).await {
        tracing::warn!(comment_id = %comment.id, error = %e, "failed to write comment marker");
    }
    adjust_post_comments(&state, &comment.post_id, 1).await;

    Ok(Json(json!({ "success": true, "comment": comment })))
}

/// `GET /api/comments?postId=`: a post's comments, newest first.
pub async fn list_comments(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListCommentsQuery>,
) -> ApiResult<JsonValue> {
    let post_id = query
        .post_id
        .filter(|id| !id.is_empty())
        .ok_or(TypeError::MissingField("postId"))?;

    let store = state.kv(Namespace::Comments);
    let prefix = Comment::post_marker_prefix(&post_id);
    let ids: Vec<String> = store
        .list_keys(&prefix)
        .await?
        .into_iter()
        .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
        .collect();

    let mut comments: Vec<Comment> = try_join_all(ids.iter().map(|id| store.get_json::<Comment>(id)))
        .await?
        .into_iter()
        .flatten()
        .collect();
    // Marker keys sort by time-ordered id; reversing first keeps ties newest first.
    comments.reverse();
    comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(json!({ "comments": comments })))
}

pub async fn get_comment(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<JsonValue> {
    if Comment::is_marker_key(&id) {
        return Err(ApiError::not_found("Comment"));
    }
    let comment = state
        .kv(Namespace::Comments)
        .get_json::<Comment>(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;
    Ok(Json(json!(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<JsonValue> {
    if Comment::is_marker_key(&id) {
        return Err(ApiError::not_found("Comment"));
    }
    let store = state.kv(Namespace::Comments);
    let comment = store
        .get_json::<Comment>(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;
    caller.require_owner(&comment.author_id)?;

    store.delete(&id).await?;
    let marker = Comment::post_marker_key(&comment.post_id, &comment.id);
    if let Err(e) = store.delete(&marker).await {
        tracing::warn!(comment_id = %id, error = %e, "failed to delete comment marker");
    }
    adjust_post_comments(&state, &comment.post_id, -1).await;

    Ok(Json(json!({ "success": true })))
}
