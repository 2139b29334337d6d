use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use ctc_store::{KvStoreExt, Namespace};
use ctc_types::{generate_id, Post, PostDraft, PostMeta, PostPatch, INDEX_KEY};

use crate::error::{ApiError, ApiResult};
use crate::extract::{Caller, JsonBody, QueryParams};
use crate::handler::JsonValue;
use crate::index::{fetch_records, page_bounds, paginate, IndexMaintainer};
use crate::state::AppState;

/// Category value that disables category filtering.
const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    pub category: Option<String>,
    pub author: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ListPostsQuery {
    fn matches(&self, meta: &PostMeta) -> bool {
        let category_ok = match self.category.as_deref() {
            None | Some(ALL_CATEGORIES) => true,
            Some(category) => meta.category.as_deref() == Some(category),
        };
        let author_ok = self
            .author
            .as_deref()
            .map_or(true, |author| meta.author_id == author);
        category_ok && author_ok
    }
}

fn index(state: &AppState) -> IndexMaintainer<'_, PostMeta> {
    IndexMaintainer::new(state.kv(Namespace::Posts), Namespace::Posts)
}

async fn load(state: &AppState, id: &str) -> ApiResult<Post> {
    if id == INDEX_KEY {
        return Err(ApiError::not_found("Post"));
    }
    state
        .kv(Namespace::Posts)
        .get_json::<Post>(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post"))
}

pub async fn create_post(
    State(state): State<AppState>,
    Caller(caller): Caller,
    JsonBody(draft): JsonBody<PostDraft>,
) -> ApiResult<JsonValue> {
    let post = Post::new(generate_id(), caller.user_id, draft, Utc::now());
    state.kv(Namespace::Posts).put_json(&post.id, &post).await?;
    index(&state).append_logged(&post.meta()).await;
    tracing::info!(post_id = %post.id, author = %post.author_id, "post created");

    Ok(Json(json!({ "success": true, "post": post })))
}

pub async fn list_posts(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListPostsQuery>,
) -> ApiResult<JsonValue> {
    let entries: Vec<PostMeta> = index(&state)
        .entries()
        .await?
        .into_iter()
        .filter(|m| query.matches(m))
        .collect();

    let (offset, limit) = page_bounds(query.offset, query.limit);
    let page = paginate(entries, offset, limit);
    let posts: Vec<Post> = fetch_records(state.kv(Namespace::Posts), &page.entries).await?;

    Ok(Json(json!({
        "posts": posts,
        "total": page.total,
        "hasMore": page.has_more,
    })))
}

pub async fn get_post(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<JsonValue> {
    let post = load(&state, &id).await?;
    Ok(Json(json!(post)))
}

pub async fn update_post(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<PostPatch>,
) -> ApiResult<JsonValue> {
    let mut post = load(&state, &id).await?;
    caller.require_owner(&post.author_id)?;

    post.apply(patch, Utc::now());
    state.kv(Namespace::Posts).put_json(&id, &post).await?;
    index(&state).replace_logged(&post.meta()).await;

    Ok(Json(json!({ "success": true, "post": post })))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<JsonValue> {
    let post = load(&state, &id).await?;
    caller.require_owner(&post.author_id)?;

    state.kv(Namespace::Posts).delete(&id).await?;
    index(&state).remove_logged(&id).await;
    tracing::info!(post_id = %id, "post deleted");

    Ok(Json(json!({ "success": true })))
}
