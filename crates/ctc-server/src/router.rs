use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::handler::HandlerWithoutStateExt;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, MethodRouter};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::handler::{comments, config, likes, posts, projects, users};
use crate::state::AppState;

/// Preflight responses may be cached for a day.
pub const CORS_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Build the axum router: the JSON API under `/api`, the static bundle for
/// everything else, and CORS on every response.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/config", json_methods(get(config::get_config)))
        .route(
            "/users",
            json_methods(post(users::create_or_update).get(users::list_users)),
        )
        .route(
            "/users/:id",
            json_methods(get(users::get_user).put(users::update_user)),
        )
        .route(
            "/users/:id/profile",
            json_methods(get(users::get_profile).put(users::put_profile)),
        )
        .route("/users/:id/stats", json_methods(get(users::user_stats)))
        .route("/users/:id/activity", json_methods(get(users::user_activity)))
        .route(
            "/posts",
            json_methods(post(posts::create_post).get(posts::list_posts)),
        )
        .route(
            "/posts/:id",
            json_methods(
                get(posts::get_post)
                    .put(posts::update_post)
                    .delete(posts::delete_post),
            ),
        )
        .route(
            "/projects",
            json_methods(post(projects::create_project).get(projects::list_projects)),
        )
        .route(
            "/projects/:id",
            json_methods(
                get(projects::get_project)
                    .put(projects::update_project)
                    .delete(projects::delete_project),
            ),
        )
        .route(
            "/projects/:id/download",
            json_methods(get(projects::download_project)),
        )
        .route(
            "/comments",
            json_methods(post(comments::create_comment).get(comments::list_comments)),
        )
        .route(
            "/comments/:id",
            json_methods(get(comments::get_comment).delete(comments::delete_comment)),
        )
        .route("/likes", json_methods(post(likes::toggle_like)))
        .fallback(api_not_found);

    let static_files =
        ServeDir::new(&state.config.static_dir).not_found_service(file_not_found.into_service());

    Router::new()
        .nest("/api", api)
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

/// Allow any origin; OPTIONS requests are answered here before routing.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .max_age(CORS_MAX_AGE)
}

fn json_methods(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(method_not_allowed)
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn api_not_found() -> ApiError {
    ApiError::NotFound("Not found".into())
}

async fn file_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "File not found")
}
