use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use ctc_store::{KvStoreExt, Namespace, StoredBlob};
use ctc_types::{generate_id, Project, ProjectMeta, ProjectPatch, TypeError, INDEX_KEY};

use crate::error::{ApiError, ApiResult};
use crate::extract::{Caller, JsonBody, MultipartForm, QueryParams};
use crate::handler::JsonValue;
use crate::index::{fetch_records, page_bounds, paginate, IndexMaintainer};
use crate::records::update_record_logged;
use crate::state::AppState;

/// Content type every uploaded project file is stored with.
pub const PROJECT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Default, Deserialize)]
pub struct ListProjectsQuery {
    pub tag: Option<String>,
    pub author: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ListProjectsQuery {
    fn matches(&self, meta: &ProjectMeta) -> bool {
        self.tag.as_deref().map_or(true, |tag| meta.has_tag(tag))
            && self
                .author
                .as_deref()
                .map_or(true, |author| meta.author_id == author)
    }
}

/// Multipart fields of an upload, collected before validation.
#[derive(Debug, Default)]
struct Upload {
    name: Option<String>,
    description: Option<String>,
    tags: Option<String>,
    file: Option<(String, Bytes)>,
}

fn field_error(e: MultipartError) -> ApiError {
    ApiError::from_rejection(e.status(), e.body_text())
}

impl Upload {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut upload = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(field_error)?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(field_error)?;
                    upload.file = Some((file_name, data));
                }
                "name" | "description" | "tags" => {
                    let text = field
                        .text()
                        .await
                        .map_err(field_error)?;
                    match name.as_str() {
                        "name" => upload.name = Some(text),
                        "description" => upload.description = Some(text),
                        _ => upload.tags = Some(text),
                    }
                }
                other => tracing::debug!(field = other, "ignoring unknown upload field"),
            }
        }
        Ok(upload)
    }
}

fn index(state: &AppState) -> IndexMaintainer<'_, ProjectMeta> {
    IndexMaintainer::new(state.kv(Namespace::Projects), Namespace::Projects)
}

async fn load(state: &AppState, id: &str) -> ApiResult<Project> {
    if id == INDEX_KEY {
        return Err(ApiError::not_found("Project"));
    }
    state
        .kv(Namespace::Projects)
        .get_json::<Project>(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))
}

/// `Content-Disposition` value with quotes, backslashes and control
/// characters replaced.
fn attachment_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

/// `POST /api/projects`: multipart upload of a `.ctm` file plus metadata.
pub async fn create_project(
    State(state): State<AppState>,
    Caller(caller): Caller,
    MultipartForm(multipart): MultipartForm,
) -> ApiResult<JsonValue> {
    let upload = Upload::read(multipart).await?;
    let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
    let (Some(name), Some(description), Some((file_name, data))) = (
        non_empty(upload.name),
        non_empty(upload.description),
        upload.file.filter(|(file_name, _)| !file_name.is_empty()),
    ) else {
        return Err(TypeError::MissingFields.into());
    };
    if !Project::is_ctm_file(&file_name) {
        return Err(ApiError::Validation("Only .ctm files are allowed".into()));
    }
    let tags = Project::parse_tags(upload.tags.as_deref())?;

    let id = generate_id();
    let file_key = Project::file_key(&id, &file_name);
    let file_size = data.len() as u64;
    state
        .storage
        .files()
        .put(&file_key, StoredBlob::new(data, PROJECT_FILE_CONTENT_TYPE))
        .await?;

    let now = Utc::now();
    let project = Project {
        id,
        name,
        description,
        author_id: caller.user_id,
        file_name,
        file_key,
        file_size,
        tags,
        created_at: now,
        updated_at: now,
        downloads: 0,
        likes: 0,
    };
    state
        .kv(Namespace::Projects)
        .put_json(&project.id, &project)
        .await?;
    index(&state).append_logged(&project.meta()).await;
    tracing::info!(project_id = %project.id, bytes = file_size, "project uploaded");

    Ok(Json(json!({ "success": true, "project": project })))
}

pub async fn list_projects(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListProjectsQuery>,
) -> ApiResult<JsonValue> {
    let entries: Vec<ProjectMeta> = index(&state)
        .entries()
        .await?
        .into_iter()
        .filter(|m| query.matches(m))
        .collect();

    let (offset, limit) = page_bounds(query.offset, query.limit);
    let page = paginate(entries, offset, limit);
    let projects: Vec<Project> =
        fetch_records(state.kv(Namespace::Projects), &page.entries).await?;

    Ok(Json(json!({
        "projects": projects,
        "total": page.total,
        "hasMore": page.has_more,
    })))
}

pub async fn get_project(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<JsonValue> {
    let project = load(&state, &id).await?;
    Ok(Json(json!(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<ProjectPatch>,
) -> ApiResult<JsonValue> {
    let mut project = load(&state, &id).await?;
    caller.require_owner(&project.author_id)?;

    project.apply(patch, Utc::now());
    state.kv(Namespace::Projects).put_json(&id, &project).await?;
    index(&state).replace_logged(&project.meta()).await;

    Ok(Json(json!({ "success": true, "project": project })))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<JsonValue> {
    let project = load(&state, &id).await?;
    caller.require_owner(&project.author_id)?;

    if let Err(e) = state.storage.files().delete(&project.file_key).await {
        tracing::warn!(project_id = %id, file_key = %project.file_key, error = %e, "failed to delete project file");
    }
    state.kv(Namespace::Projects).delete(&id).await?;
    index(&state).remove_logged(&id).await;
    tracing::info!(project_id = %id, "project deleted");

    Ok(Json(json!({ "success": true })))
}

/// `GET /api/projects/:id/download`: the stored file as an attachment.
pub async fn download_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let project = load(&state, &id).await?;
    let blob = state
        .storage
        .files()
        .get(&project.file_key)
        .await?
        .ok_or_else(|| ApiError::not_found("File"))?;

    update_record_logged::<Project, _>(state.kv(Namespace::Projects), "project downloads", &id, |p| {
        p.downloads = p.downloads.saturating_add(1);
    })
    .await;

    let headers = [
        (CONTENT_TYPE, blob.content_type),
        (CONTENT_DISPOSITION, attachment_disposition(&project.file_name)),
    ];
    Ok((headers, blob.data).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn disposition_escapes_quotes() {
        assert_eq!(
            attachment_disposition("game.ctm"),
            "attachment; filename=\"game.ctm\""
        );
        assert_eq!(
            attachment_disposition("a\"b\\c\n.ctm"),
            "attachment; filename=\"a_b_c_.ctm\""
        );
    }

    #[test]
    fn tag_and_author_filters() {
        let meta = ProjectMeta {
            id: "x".into(),
            name: "Snake".into(),
            author_id: "u1".into(),
            tags: vec!["game".into(), "retro".into()],
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        };
        let by_tag = ListProjectsQuery {
            tag: Some("retro".into()),
            ..Default::default()
        };
        assert!(by_tag.matches(&meta));

        let wrong_author = ListProjectsQuery {
            tag: Some("game".into()),
            author: Some("u2".into()),
            ..Default::default()
        };
        assert!(!wrong_author.matches(&meta));
        assert!(ListProjectsQuery::default().matches(&meta));
    }

    mod http {
        use std::sync::Arc;

        use axum::body::Body;
        use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
        use axum::http::{Request, StatusCode};
        use serde_json::json;

        use ctc_store::Storage;

        use crate::test_support::{body_bytes, json_response, FailingDeleteBlobStore, TestApp};

        #[tokio::test]
        async fn only_ctm_uploads_are_accepted() {
            let app = TestApp::new();
            let fields = [("name", "Snake"), ("description", "classic")];

            let (status, json) = app
                .upload(Some("u1"), &fields, Some(("game.txt", &b"plain"[..])))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json, json!({ "error": "Only .ctm files are allowed" }));

            let (status, json) = app
                .upload(Some("u1"), &fields, Some(("game.ctm", &b"CTM1 snake"[..])))
                .await;
            assert_eq!(status, StatusCode::OK);
            let project = &json["project"];
            let id = project["id"].as_str().unwrap();
            assert_eq!(project["fileKey"], format!("projects/{id}/game.ctm"));
            assert_eq!(project["fileSize"], 10);
            assert_eq!(project["downloads"], 0);
            assert_eq!(project["likes"], 0);

            let blob = app
                .storage
                .files()
                .get(project["fileKey"].as_str().unwrap())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(&blob.data[..], b"CTM1 snake");
            assert_eq!(blob.content_type, "application/octet-stream");
        }

        #[tokio::test]
        async fn upload_validation() {
            let app = TestApp::new();
            let (status, json) = app
                .upload(Some("u1"), &[("name", "Snake")], Some(("game.ctm", &b"x"[..])))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json, json!({ "error": "Missing required fields" }));

            let (status, json) = app
                .upload(Some("u1"), &[("name", "Snake"), ("description", "d")], None)
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"], "Missing required fields");

            let (status, _) = app
                .upload(
                    Some("u1"),
                    &[("name", "Snake"), ("description", "d"), ("tags", "not-json")],
                    Some(("game.ctm", &b"x"[..])),
                )
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);

            let (status, _) = app
                .upload(None, &[("name", "Snake"), ("description", "d")], Some(("game.ctm", &b"x"[..])))
                .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn list_filters_by_tag_and_author() {
            let app = TestApp::new();
            app.create_project("u1", "Snake", r#"["game","retro"]"#).await;
            app.create_project("u2", "Clock", r#"["tool"]"#).await;
            app.create_project("u1", "Pong", r#"["game"]"#).await;

            let (_, games) = app.get("/api/projects?tag=game").await;
            let names: Vec<_> = games["projects"]
                .as_array()
                .unwrap()
                .iter()
                .map(|p| p["name"].as_str().unwrap())
                .collect();
            assert_eq!(names, vec!["Pong", "Snake"]);
            assert_eq!(games["total"], 2);
            assert_eq!(games["hasMore"], false);

            let (_, by_u2) = app.get("/api/projects?author=u2").await;
            assert_eq!(by_u2["total"], 1);
            assert_eq!(by_u2["projects"][0]["name"], "Clock");
        }

        #[tokio::test]
        async fn update_refreshes_index_for_owner_only() {
            let app = TestApp::new();
            let project = app.create_project("u1", "Snake", "").await;
            let uri = format!("/api/projects/{}", project["id"].as_str().unwrap());

            let (status, _) = app.put(&uri, "u2", json!({ "name": "Mine" })).await;
            assert_eq!(status, StatusCode::FORBIDDEN);

            let (status, json) = app.put(&uri, "u1", json!({ "tags": ["arcade"] })).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json["project"]["tags"], json!(["arcade"]));
            assert_eq!(json["project"]["name"], "Snake");

            let (_, arcade) = app.get("/api/projects?tag=arcade").await;
            assert_eq!(arcade["total"], 1);
        }

        #[tokio::test]
        async fn download_streams_file_and_counts() {
            let app = TestApp::new();
            let project = app.create_project("u1", "Snake", "").await;
            let id = project["id"].as_str().unwrap();

            let response = app
                .send(
                    Request::builder()
                        .uri(format!("/api/projects/{id}/download"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[CONTENT_TYPE], "application/octet-stream");
            assert_eq!(
                response.headers()[CONTENT_DISPOSITION],
                "attachment; filename=\"demo.ctm\""
            );
            assert_eq!(body_bytes(response).await, b"CTM1 payload");

            let (_, fetched) = app.get(&format!("/api/projects/{id}")).await;
            assert_eq!(fetched["downloads"], 1);
        }

        #[tokio::test]
        async fn delete_removes_record_index_and_file() {
            let app = TestApp::new();
            let project = app.create_project("u1", "Snake", "").await;
            let uri = format!("/api/projects/{}", project["id"].as_str().unwrap());

            let (status, _) = app.delete(&uri, "u2").await;
            assert_eq!(status, StatusCode::FORBIDDEN);

            let (status, json) = app.delete(&uri, "u1").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json, json!({ "success": true }));

            assert_eq!(app.get(&uri).await.0, StatusCode::NOT_FOUND);
            let (_, list) = app.get("/api/projects").await;
            assert_eq!(list["total"], 0);
            let file_key = project["fileKey"].as_str().unwrap();
            assert!(app.storage.files().get(file_key).await.unwrap().is_none());
        }

        #[tokio::test]
        async fn non_multipart_upload_is_json_400() {
            let app = TestApp::new();
            let response = app
                .send(
                    Request::builder()
                        .method("POST")
                        .uri("/api/projects")
                        .header(CONTENT_TYPE, "application/json")
                        .header("authorization", "Bearer u1")
                        .body(Body::from("{}"))
                        .unwrap(),
                )
                .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
            let (_, json) = json_response(response).await;
            assert!(json["error"].is_string(), "{json}");
        }

        #[tokio::test]
        async fn oversized_upload_is_json_413() {
            let app = TestApp::with_max_upload(256);
            let (status, json) = app
                .upload(
                    Some("u1"),
                    &[("name", "Snake"), ("description", "d")],
                    Some(("game.ctm", &[0u8; 1024][..])),
                )
                .await;
            assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
            assert!(json["error"].is_string(), "{json}");
        }

        #[tokio::test]
        async fn index_key_is_not_a_project() {
            let app = TestApp::new();
            app.create_project("u1", "Snake", "").await;

            let (status, json) = app.get("/api/projects/__index__").await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(json, json!({ "error": "Project not found" }));
            assert_eq!(
                app.get("/api/projects/__index__/download").await.0,
                StatusCode::NOT_FOUND
            );
            assert_eq!(
                app.delete("/api/projects/__index__", "u1").await.0,
                StatusCode::NOT_FOUND
            );
            assert_eq!(app.get("/api/projects").await.1["total"], 1);
        }

        #[tokio::test]
        async fn blob_delete_failure_is_logged_not_fatal() {
            let storage = Storage::in_memory().with_files(Arc::new(FailingDeleteBlobStore::default()));
            let app = TestApp::with_storage(storage);
            let project = app.create_project("u1", "Snake", "").await;
            let uri = format!("/api/projects/{}", project["id"].as_str().unwrap());

            let (status, _) = app.delete(&uri, "u1").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(app.get(&uri).await.0, StatusCode::NOT_FOUND);
        }
    }
}
