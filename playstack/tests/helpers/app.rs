//! Router construction and request helpers

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use playstack::config::AppConfig;
use playstack::{build_router, AppState};
use playstack_common::events::EventBus;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use super::fake_toolchain::FakeToolchain;

const BOUNDARY: &str = "playstack-test-boundary";

/// Router over a scratch directory and a fake toolchain
pub struct TestApp {
    pub state: AppState,
    pub toolchain: Arc<FakeToolchain>,
    pub scratch: TempDir,
    /// Holds the SoundFont file when one is installed
    pub assets: TempDir,
}

impl TestApp {
    /// SoundFont present, all tools succeed unless `toolchain` says otherwise
    pub fn new(toolchain: FakeToolchain) -> Self {
        Self::build(toolchain, true, None)
    }

    pub fn without_soundfont(toolchain: FakeToolchain) -> Self {
        Self::build(toolchain, false, None)
    }

    pub fn with_upload_limit(toolchain: FakeToolchain, max_upload_bytes: usize) -> Self {
        Self::build(toolchain, true, Some(max_upload_bytes))
    }

    fn build(toolchain: FakeToolchain, soundfont: bool, upload_limit: Option<usize>) -> Self {
        let scratch = TempDir::new().unwrap();
        let assets = TempDir::new().unwrap();
        let soundfont_path = assets.path().join("FluidR3_GM.sf2");
        if soundfont {
            std::fs::write(&soundfont_path, b"sfbk test bank").unwrap();
        }

        let mut config = AppConfig::with_paths(scratch.path().to_path_buf(), soundfont_path);
        if let Some(limit) = upload_limit {
            config.max_upload_bytes = limit;
        }

        let toolchain = Arc::new(toolchain);
        let state = AppState::new(config, toolchain.clone(), EventBus::new(100));
        Self {
            state,
            toolchain,
            scratch,
            assets,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// multipart/form-data body with optional `url` and `file` parts
pub fn multipart_body(url: Option<&str>, file: Option<(&str, &[u8])>) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    if let Some(url) = url {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"url\"\r\n\r\n{}\r\n",
                BOUNDARY, url
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

pub fn post_transcribe(url: Option<&str>, file: Option<(&str, &[u8])>) -> Request<Body> {
    let (content_type, body) = multipart_body(url, file);
    Request::builder()
        .method("POST")
        .uri("/api/transcribe")
        .header("content-type", content_type)
        .body(Body::from(body))
        .unwrap()
}

pub fn post_instrumental(payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/instrumental")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// True once every run workspace under `scratch` has been removed
pub fn scratch_is_empty(scratch: &Path) -> bool {
    std::fs::read_dir(scratch).unwrap().next().is_none()
}
