//! Shared harness: the full router over an in-memory store, with Webflow and
//! GitHub both served by one wiremock server.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;
use wiremock::MockServer;

use relay::config::{Config, ProviderConfig};
use relay::models::binding::RepositoryBinding;
use relay::models::token::{BearerToken, TokenKey};
use relay::store::memory::MemoryStore;
use relay::store::Store;
use relay::{api, AppState};

pub const REDIRECT_URI: &str = "https://relay.example.com/callback";

pub fn config(mock_uri: &str) -> Config {
    Config {
        port: 0,
        database_url: None,
        redirect_uri: REDIRECT_URI.into(),
        webflow: ProviderConfig {
            client_id: "wf-client".into(),
            client_secret: "wf-secret".into(),
            authorize_url: format!("{}/oauth/authorize", mock_uri),
            token_url: format!("{}/oauth/access_token", mock_uri),
            api_url: mock_uri.into(),
        },
        github: ProviderConfig {
            client_id: "gh-client".into(),
            client_secret: "gh-secret".into(),
            authorize_url: format!("{}/login/oauth/authorize", mock_uri),
            token_url: format!("{}/login/oauth/access_token", mock_uri),
            api_url: mock_uri.into(),
        },
        github_scope: "repo".into(),
        commit_message: "Automated commit from Webflow".into(),
        http_timeout_secs: 5,
        flow_ttl_secs: 600,
    }
}

pub struct Harness {
    pub mock: MockServer,
    pub store: MemoryStore,
    pub app: Router,
}

impl Harness {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Like [`Harness::start`], with a chance to adjust the config first.
    pub async fn start_with(adjust: impl FnOnce(&mut Config)) -> Self {
        let mock = MockServer::start().await;
        let store = MemoryStore::new();
        let mut cfg = config(&mock.uri());
        adjust(&mut cfg);
        let state = AppState::new(cfg, Arc::new(store.clone())).expect("state should build");
        let app = api::router().with_state(Arc::new(state));
        Self { mock, store, app }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// POST with an arbitrary body and, optionally, a content type.
    pub async fn post_raw(
        &self,
        uri: &str,
        content_type: Option<&str>,
        body: &str,
    ) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let mut req = Request::builder().method("POST").uri(uri);
        if let Some(content_type) = content_type {
            req = req.header("content-type", content_type);
        }
        self.send(req.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        (status, headers, body)
    }

    pub async fn seed_token(&self, key: TokenKey, token: &str) {
        self.store
            .put_token(&key, &BearerToken::new(token))
            .await
            .unwrap();
    }

    pub async fn seed_binding(&self, user_id: &str, repository: &str, path: &str, branch: &str) {
        self.store
            .put_binding(
                user_id,
                &RepositoryBinding {
                    repository: repository.into(),
                    path: path.into(),
                    branch: branch.into(),
                },
            )
            .await
            .unwrap();
    }

    pub async fn token(&self, key: &TokenKey) -> Option<String> {
        self.store
            .get_token(key)
            .await
            .unwrap()
            .map(|t| t.expose().to_string())
    }
}

/// A base URL nothing listens on: the port is bound once and released.
pub fn unreachable_base() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

pub fn text(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}

pub fn location(headers: &axum::http::HeaderMap) -> url::Url {
    let raw = headers
        .get("location")
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap();
    url::Url::parse(raw).unwrap()
}

pub fn query_param(url: &url::Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// In-memory log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
