use super::*;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct ServerState {
    authorization: Arc<Mutex<Vec<String>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
    uploads: Arc<Mutex<Vec<(String, Option<String>, Vec<u8>)>>>,
}

fn record_authorization(state: &ServerState, headers: &HeaderMap) {
    if let Some(value) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        state
            .authorization
            .lock()
            .expect("authorization")
            .push(value.to_string());
    }
}

async fn get_project(State(state): State<ServerState>, headers: HeaderMap) -> Json<Value> {
    record_authorization(&state, &headers);
    Json(json!({ "projectId": 1, "projectName": "demo" }))
}

async fn update_sub_types(
    State(state): State<ServerState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.bodies.lock().expect("bodies").push(body);
    (
        StatusCode::CONFLICT,
        Json(json!({ "errorCode": 4091, "message": "Defect type with the same name exists" })),
    )
}

async fn delete_pattern() -> StatusCode {
    StatusCode::OK
}

async fn broken_names() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn import_file(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        state
            .uploads
            .lock()
            .expect("uploads")
            .push((name, content_type, bytes));
    }
    (
        StatusCode::OK,
        Json(json!({ "message": "Launch with id = 1 is successfully imported." })),
    )
}

async fn spawn_api_server() -> Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/v1/project/demo", get(get_project))
        .route("/api/v1/demo/settings/sub-type", put(update_sub_types))
        .route("/api/v1/demo/settings/pattern/3", delete(delete_pattern))
        .route("/api/v1/demo/launch/names", get(broken_names))
        .route("/api/v1/plugin/demo/JUnit/import", post(import_file))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

fn transport(server_url: &str, token: Option<&str>) -> HttpTransport {
    HttpTransport::new(
        server_url,
        token.map(str::to_string),
        Duration::from_secs(5),
    )
    .expect("transport")
}

#[test]
fn endpoint_joins_paths_under_base_prefix() {
    let transport = transport("http://reports.local/gateway", None);
    assert_eq!(
        transport
            .endpoint("api/v1/project/demo")
            .expect("endpoint")
            .as_str(),
        "http://reports.local/gateway/api/v1/project/demo"
    );
    assert_eq!(
        transport
            .endpoint("/api/v1/demo/item")
            .expect("endpoint")
            .as_str(),
        "http://reports.local/gateway/api/v1/demo/item"
    );
}

#[test]
fn rejects_unparseable_server_url() {
    let err = HttpTransport::new("not a url", None, Duration::from_secs(1))
        .err()
        .expect("invalid url");
    assert!(matches!(err, TransportError::Url(_)));
}

#[tokio::test]
async fn get_sends_bearer_token_and_decodes_json() {
    let (server_url, state) = spawn_api_server().await.expect("spawn server");
    let transport = transport(&server_url, Some("secret-token"));

    let value = transport
        .send(ApiRequest::get("api/v1/project/demo"))
        .await
        .expect("project");

    assert_eq!(value["projectName"], "demo");
    assert_eq!(
        state.authorization.lock().expect("authorization").as_slice(),
        ["Bearer secret-token".to_string()]
    );
}

#[tokio::test]
async fn error_body_message_is_kept_verbatim() {
    let (server_url, state) = spawn_api_server().await.expect("spawn server");
    let transport = transport(&server_url, None);

    let err = transport
        .send(ApiRequest::put(
            "api/v1/demo/settings/sub-type",
            json!({ "ids": [] }),
        ))
        .await
        .expect_err("conflict");

    assert_eq!(err.status(), Some(409));
    assert_eq!(err.message(), "Defect type with the same name exists");
    match err {
        TransportError::Api { error, .. } => assert_eq!(error.error_code, Some(4091)),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        state.bodies.lock().expect("bodies").as_slice(),
        [json!({ "ids": [] })]
    );
}

#[tokio::test]
async fn empty_success_body_is_null() {
    let (server_url, _state) = spawn_api_server().await.expect("spawn server");
    let transport = transport(&server_url, None);

    let value = transport
        .send(ApiRequest::delete("api/v1/demo/settings/pattern/3"))
        .await
        .expect("delete");

    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn error_without_body_falls_back_to_status_text() {
    let (server_url, _state) = spawn_api_server().await.expect("spawn server");
    let transport = transport(&server_url, None);

    let err = transport
        .send(ApiRequest::get("api/v1/demo/launch/names"))
        .await
        .expect_err("server error");

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.message(), "500 Internal Server Error");
}

#[tokio::test]
async fn upload_posts_multipart_file_field() {
    let (server_url, state) = spawn_api_server().await.expect("spawn server");
    let transport = transport(&server_url, None);

    let value = transport
        .upload(UploadRequest {
            path: "api/v1/plugin/demo/JUnit/import".to_string(),
            file_name: "report.xml".to_string(),
            mime_type: Some("text/xml".to_string()),
            bytes: b"<testsuite/>".to_vec(),
        })
        .await
        .expect("upload");

    assert!(value["message"]
        .as_str()
        .expect("message")
        .contains("successfully imported"));
    let uploads = state.uploads.lock().expect("uploads").clone();
    assert_eq!(
        uploads,
        vec![(
            "report.xml".to_string(),
            Some("text/xml".to_string()),
            b"<testsuite/>".to_vec()
        )]
    );
}
