use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::routing::{post, put};
use orgkit_core::config::{ConfigStore, ConfigUpdate};
use orgkit_core::upload::{
    FileType, ObjectType, PermissionType, UploadError, UploadPhase, UploadRequest, Uploader,
};
use serde_json::{Value, json};

const SERVER_TIMESTAMP: i64 = 1_700_000_000_000;

#[derive(Clone)]
struct MockState {
    base_url: String,
    provide_url: bool,
    put_status: StatusCode,
    url_requests: Arc<AtomicUsize>,
    put_requests: Arc<AtomicUsize>,
    register_requests: Arc<AtomicUsize>,
    registered_timestamp: Arc<Mutex<Option<Value>>>,
}

impl MockState {
    fn new(base_url: String) -> Self {
        Self {
            base_url,
            provide_url: true,
            put_status: StatusCode::OK,
            url_requests: Arc::new(AtomicUsize::new(0)),
            put_requests: Arc::new(AtomicUsize::new(0)),
            register_requests: Arc::new(AtomicUsize::new(0)),
            registered_timestamp: Arc::new(Mutex::new(None)),
        }
    }
}

async fn graphql_endpoint(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    let query = body
        .get("query")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if query.contains("fetchFileUploadUrl") {
        state.url_requests.fetch_add(1, Ordering::SeqCst);
        let grant = if state.provide_url {
            json!({
                "temporarySignedURL": format!("{}/storage/logo.png", state.base_url),
                "timestamp": SERVER_TIMESTAMP,
            })
        } else {
            json!({ "temporarySignedURL": null, "timestamp": null })
        };
        Json(json!({ "data": { "fetchFileUploadUrl": grant } }))
    } else if query.contains("createFileDocument") {
        state.register_requests.fetch_add(1, Ordering::SeqCst);
        let timestamp = body
            .pointer("/variables/input/timestamp")
            .cloned()
            .unwrap_or(Value::Null);
        *state.registered_timestamp.lock().expect("lock") = Some(timestamp);
        Json(json!({
            "data": {
                "createFileDocument": {
                    "fileDocument": {
                        "id": "doc_1",
                        "name": "logo.png",
                        "fileName": "logo.png",
                        "s3Key": "org/logo.png",
                        "type": "IMAGE",
                    },
                },
            },
        }))
    } else {
        Json(json!({ "data": {} }))
    }
}

async fn put_object(State(state): State<MockState>) -> StatusCode {
    state.put_requests.fetch_add(1, Ordering::SeqCst);
    state.put_status
}

async fn mock_upload_server(configure: impl FnOnce(&mut MockState)) -> (SocketAddr, MockState) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("mock server should bind");
    let addr = listener.local_addr().expect("mock server address");
    let mut state = MockState::new(format!("http://{addr}"));
    configure(&mut state);
    let app = Router::new()
        .route("/graphql", post(graphql_endpoint))
        .route("/storage/logo.png", put(put_object))
        .with_state(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });
    (addr, state)
}

async fn configured_uploader(addr: SocketAddr) -> Uploader {
    let path = std::env::temp_dir().join(format!("orgkit-upload-{}.env", uuid::Uuid::new_v4()));
    let config = Arc::new(ConfigStore::open(path).expect("store should open"));
    config
        .apply(ConfigUpdate {
            api_key: Some("sk-test-abcd1234".to_string()),
            graphql_endpoint: Some(format!("http://{addr}/graphql")),
            organization_id: Some("org_42".to_string()),
            user_id: Some("user_7".to_string()),
            retries: Some(0),
            ..ConfigUpdate::default()
        })
        .await
        .expect("config should apply");
    Uploader::new(reqwest::Client::new(), config)
}

fn fixture_file(contents: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("orgkit-fixture-{}.png", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents).expect("fixture should write");
    path
}

fn request_for(path: PathBuf) -> UploadRequest {
    UploadRequest {
        file_path: path,
        file_name: Some("logo.png".to_string()),
        object_type: ObjectType::Organization,
        object_id: None,
        file_type: FileType::Image,
        user_id: None,
        permission_type: PermissionType::Public,
    }
}

#[tokio::test]
async fn uploads_file_through_all_three_phases() {
    let (addr, state) = mock_upload_server(|_| {}).await;
    let uploader = configured_uploader(addr).await;
    let contents = b"fake png bytes";
    let path = fixture_file(contents);

    let outcome = uploader
        .upload(request_for(path.clone()))
        .await
        .expect("upload should succeed");

    assert_eq!(outcome.file_document.id, "doc_1");
    assert_eq!(outcome.file_name, "logo.png");
    assert_eq!(outcome.file_size, contents.len());
    assert_eq!(outcome.content_type, "image/png");
    assert_eq!(state.url_requests.load(Ordering::SeqCst), 1);
    assert_eq!(state.put_requests.load(Ordering::SeqCst), 1);
    assert_eq!(state.register_requests.load(Ordering::SeqCst), 1);

    // The phase-1 timestamp must flow through to the registration input.
    let registered = state
        .registered_timestamp
        .lock()
        .expect("lock")
        .clone()
        .expect("registration should have been observed");
    assert_eq!(registered, json!(SERVER_TIMESTAMP));

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn missing_signed_url_stops_before_transfer() {
    let (addr, state) = mock_upload_server(|state| state.provide_url = false).await;
    let uploader = configured_uploader(addr).await;
    let path = fixture_file(b"bytes");

    let err = uploader
        .upload(request_for(path.clone()))
        .await
        .expect_err("missing signed URL should fail");

    assert!(matches!(err, UploadError::MissingSignedUrl));
    assert_eq!(err.phase(), Some(UploadPhase::RequestUrl));
    assert_eq!(state.url_requests.load(Ordering::SeqCst), 1);
    assert_eq!(state.put_requests.load(Ordering::SeqCst), 0);
    assert_eq!(state.register_requests.load(Ordering::SeqCst), 0);

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn rejected_transfer_skips_registration() {
    let (addr, state) =
        mock_upload_server(|state| state.put_status = StatusCode::FORBIDDEN).await;
    let uploader = configured_uploader(addr).await;
    let path = fixture_file(b"bytes");

    let err = uploader
        .upload(request_for(path.clone()))
        .await
        .expect_err("rejected transfer should fail");

    assert!(matches!(
        err,
        UploadError::TransferRejected { status } if status == StatusCode::FORBIDDEN
    ));
    assert_eq!(err.phase(), Some(UploadPhase::Transfer));
    assert_eq!(state.put_requests.load(Ordering::SeqCst), 1);
    assert_eq!(state.register_requests.load(Ordering::SeqCst), 0);

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn missing_file_fails_before_any_remote_call() {
    let (addr, state) = mock_upload_server(|_| {}).await;
    let uploader = configured_uploader(addr).await;
    let path = std::env::temp_dir().join("orgkit-does-not-exist.png");

    let err = uploader
        .upload(request_for(path))
        .await
        .expect_err("missing file should fail");

    assert!(matches!(err, UploadError::FileNotFound(_)));
    assert_eq!(err.phase(), None);
    assert_eq!(state.url_requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn placeholder_object_id_fails_before_any_remote_call() {
    let (addr, state) = mock_upload_server(|_| {}).await;
    let uploader = configured_uploader(addr).await;
    let path = fixture_file(b"bytes");

    let mut request = request_for(path.clone());
    request.object_id = Some("your_organization_id_here".to_string());
    let err = uploader
        .upload(request)
        .await
        .expect_err("placeholder id should fail");

    assert!(matches!(
        err,
        UploadError::PlaceholderId {
            field: "object id",
            ..
        }
    ));
    assert_eq!(state.url_requests.load(Ordering::SeqCst), 0);

    let _ = std::fs::remove_file(path);
}
