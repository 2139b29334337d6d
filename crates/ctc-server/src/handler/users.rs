use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use futures::future::try_join_all;
use serde_json::json;

use ctc_store::{KvStoreExt, Namespace};
use ctc_types::{Post, PostMeta, Profile, Project, ProjectMeta, User, UserInput, UserPatch, UserStats};

use crate::error::{ApiError, ApiResult};
use crate::extract::{Caller, JsonBody};
use crate::handler::JsonValue;
use crate::index::{fetch_records, IndexMaintainer};
use crate::state::AppState;

/// `POST /api/users`: create or overwrite a user, keeping the original
/// `createdAt`.
pub async fn create_or_update(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<UserInput>,
) -> ApiResult<JsonValue> {
    let store = state.kv(Namespace::Users);
    let existing = match input.id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) if Profile::is_profile_key(id) => {
            return Err(ApiError::Validation("Invalid user id".into()));
        }
        Some(id) => store.get_json::<User>(id).await?,
        None => None,
    };

    let user = input.into_user(existing.map(|u| u.created_at), Utc::now())?;
    store.put_json(&user.id, &user).await?;
    tracing::info!(user_id = %user.id, "user saved");

    Ok(Json(json!({ "success": true, "user": user })))
}

/// `GET /api/users`: every user, newest first.
pub async fn list_users(State(state): State<AppState>) -> ApiResult<JsonValue> {
    let store = state.kv(Namespace::Users);
    let keys: Vec<String> = store
        .list_keys("")
        .await?
        .into_iter()
        .filter(|k| !Profile::is_profile_key(k))
        .collect();

    let mut users: Vec<User> = try_join_all(keys.iter().map(|k| store.get_json::<User>(k)))
        .await?
        .into_iter()
        .flatten()
        .collect();
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(json!({ "users": users })))
}

/// Profiles share the users namespace; their keys never name a user.
async fn load_user(state: &AppState, id: &str) -> ApiResult<User> {
    if Profile::is_profile_key(id) {
        return Err(ApiError::not_found("User"));
    }
    state
        .kv(Namespace::Users)
        .get_json::<User>(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<JsonValue> {
    let user = load_user(&state, &id).await?;
    Ok(Json(json!(user)))
}

/// `PUT /api/users/:id`: partial update by the user themself.
pub async fn update_user(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<UserPatch>,
) -> ApiResult<JsonValue> {
    caller.require_self(&id)?;
    let mut user = load_user(&state, &id).await?;

    user.apply(patch, Utc::now());
    state.kv(Namespace::Users).put_json(&id, &user).await?;

    Ok(Json(json!({ "success": true, "user": user })))
}

pub async fn get_profile(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<JsonValue> {
    let profile = state
        .kv(Namespace::Users)
        .get_json::<Profile>(&Profile::key(&id))
        .await?
        .ok_or_else(|| ApiError::not_found("Profile"))?;
    Ok(Json(json!(profile)))
}

/// `PUT /api/users/:id/profile`: replace the whole profile.
pub async fn put_profile(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    JsonBody(mut profile): JsonBody<Profile>,
) -> ApiResult<JsonValue> {
    caller.require_self(&id)?;
    profile.updated_at = Some(Utc::now());
    state
        .kv(Namespace::Users)
        .put_json(&Profile::key(&id), &profile)
        .await?;

    Ok(Json(json!({ "success": true, "profile": profile })))
}

/// `GET /api/users/:id/stats`, computed from both indexes on every call.
pub async fn user_stats(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<JsonValue> {
    let posts_store = state.kv(Namespace::Posts);
    let projects_store = state.kv(Namespace::Projects);

    let post_index = IndexMaintainer::<PostMeta>::new(posts_store, Namespace::Posts);
    let project_index = IndexMaintainer::<ProjectMeta>::new(projects_store, Namespace::Projects);
    let (posts, projects) = futures::try_join!(post_index.entries(), project_index.entries())?;
    let posts: Vec<PostMeta> = posts.into_iter().filter(|m| m.author_id == id).collect();
    let projects: Vec<ProjectMeta> = projects.into_iter().filter(|m| m.author_id == id).collect();

    let (post_records, project_records) = futures::try_join!(
        fetch_records::<_, Post>(posts_store, &posts),
        fetch_records::<_, Project>(projects_store, &projects),
    )?;
    let likes_received = post_records.iter().map(|p| p.likes).sum::<u64>()
        + project_records.iter().map(|p| p.likes).sum::<u64>();

    let stats = UserStats {
        posts_count: posts.len(),
        projects_count: projects.len(),
        likes_received,
    };
    Ok(Json(json!(stats)))
}

/// `GET /api/users/:id/activity`. No activity feed is recorded yet.
pub async fn user_activity(Path(_id): Path<String>) -> JsonValue {
    Json(json!({ "activities": [] }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::TestApp;

    fn alice() -> serde_json::Value {
        json!({ "id": "u1", "email": "alice@example.com", "name": "Alice" })
    }

    #[tokio::test]
    async fn upsert_keeps_created_at() {
        let app = TestApp::new();
        let (status, first) = app.call(Method::POST, "/api/users", None, Some(alice())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["success"], true);

        let mut renamed = alice();
        renamed["name"] = json!("Alice B");
        let (_, second) = app.call(Method::POST, "/api/users", None, Some(renamed)).await;
        assert_eq!(second["user"]["createdAt"], first["user"]["createdAt"]);
        assert_eq!(second["user"]["name"], "Alice B");

        let (status, user) = app.get("/api/users/u1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["email"], "alice@example.com");
    }

    #[tokio::test]
    async fn upsert_requires_fields() {
        let app = TestApp::new();
        let (status, json) = app
            .call(Method::POST, "/api/users", None, Some(json!({ "id": "u1", "email": "" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({ "error": "Missing required fields" }));
    }

    #[tokio::test]
    async fn list_excludes_profiles() {
        let app = TestApp::new();
        app.call(Method::POST, "/api/users", None, Some(alice())).await;
        app.call(
            Method::POST,
            "/api/users",
            None,
            Some(json!({ "id": "u2", "email": "bob@example.com", "name": "Bob" })),
        )
        .await;
        app.put("/api/users/u1/profile", "u1", json!({ "bio": "hi" })).await;

        let (_, list) = app.get("/api/users").await;
        let ids: Vec<_> = list["users"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["u2", "u1"]);
    }

    #[tokio::test]
    async fn update_user_requires_self() {
        let app = TestApp::new();
        app.call(Method::POST, "/api/users", None, Some(alice())).await;

        let (status, _) = app.put("/api/users/u1", "u2", json!({ "name": "Mallory" })).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, json) = app.put("/api/users/u1", "u1", json!({ "picture": "p.png" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["user"]["picture"], "p.png");
        assert_eq!(json["user"]["name"], "Alice");

        let (status, _) = app.put("/api/users/u9", "u9", json!({ "name": "x" })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn profile_write_is_self_only() {
        let app = TestApp::new();
        let (status, _) = app.get("/api/users/u1/profile").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let profile = json!({ "displayName": "Al", "skills": ["rust", "c"] });
        let (status, json) = app.put("/api/users/u1/profile", "u2", profile.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json, json!({ "error": "Unauthorized" }));

        let (status, json) = app.put("/api/users/u1/profile", "u1", profile).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["profile"]["updatedAt"].is_string());

        let (status, fetched) = app.get("/api/users/u1/profile").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["displayName"], "Al");
        assert_eq!(fetched["skills"], json!(["rust", "c"]));
    }

    #[tokio::test]
    async fn profile_key_is_not_a_user() {
        let app = TestApp::new();
        app.put("/api/users/u1/profile", "u1", json!({ "bio": "hi" })).await;

        let (status, json) = app.get("/api/users/profile_u1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json, json!({ "error": "User not found" }));
        let (status, _) = app
            .put("/api/users/profile_u1", "profile_u1", json!({ "name": "x" }))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stats_sum_likes_across_posts_and_projects() {
        let app = TestApp::new();
        let post = app.create_post("u1", json!({})).await;
        let project = app.create_project("u1", "Snake", "").await;
        app.create_post("u2", json!({})).await;

        for user in ["u2", "u3"] {
            app.post("/api/likes", user, json!({ "type": "post", "targetId": post["id"] }))
                .await;
        }
        app.post("/api/likes", "u2", json!({ "type": "project", "targetId": project["id"] }))
            .await;

        let (_, stats) = app.get("/api/users/u1/stats").await;
        assert_eq!(stats, json!({ "postsCount": 1, "projectsCount": 1, "likesReceived": 3 }));

        let (_, empty) = app.get("/api/users/nobody/stats").await;
        assert_eq!(empty, json!({ "postsCount": 0, "projectsCount": 0, "likesReceived": 0 }));
    }

    #[tokio::test]
    async fn activity_is_empty() {
        let app = TestApp::new();
        let (status, json) = app.get("/api/users/u1/activity").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "activities": [] }));
    }
}
