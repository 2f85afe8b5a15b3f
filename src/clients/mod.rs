//! Outbound HTTP to Webflow and GitHub.
//!
//! Clients never log failures themselves; they return `AppError` and the
//! response conversion logs it once.

pub mod github;
pub mod webflow;

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::HeaderValue;
use serde::Deserialize;
use url::Url;

use crate::errors::AppError;
use crate::models::token::{BearerToken, Platform};

const USER_AGENT: &str = concat!("webflow-github-relay/", env!("CARGO_PKG_VERSION"));

/// Longest slice of a remote error body carried into an error message.
const MAX_ERROR_BODY: usize = 512;

/// Shared HTTP client for both providers. No retries: a failed call fails the
/// request that made it.
pub fn build_http_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .use_rustls_tls()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(5))
        .build()?;
    Ok(client)
}

/// A remote response body passed back to our caller unchanged.
#[derive(Debug, Clone)]
pub struct RawBody {
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// OAuth token endpoint reply. GitHub reports a bad code as `200` with
/// `error` set instead of `access_token`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl TokenResponse {
    fn into_token(self, platform: Platform) -> Result<BearerToken, AppError> {
        match self.access_token {
            Some(token) if !token.is_empty() => Ok(BearerToken::new(token)),
            _ => Err(AppError::Exchange(format!(
                "{} token response has no access_token (error: {}, description: {})",
                platform,
                self.error.as_deref().unwrap_or("none"),
                self.error_description.as_deref().unwrap_or("none"),
            ))),
        }
    }
}

/// Sends a token exchange request and pulls the access token out of the reply.
async fn exchange_code(
    platform: Platform,
    request: reqwest::RequestBuilder,
) -> Result<BearerToken, AppError> {
    let resp = request
        .send()
        .await
        .map_err(|e| AppError::Exchange(format!("{} token request failed: {}", platform, e)))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(AppError::Exchange(format!(
            "{} token endpoint returned {}: {}",
            platform,
            status,
            truncate(&body)
        )));
    }

    let parsed: TokenResponse = resp.json().await.map_err(|e| {
        AppError::Exchange(format!("{} token response is not JSON: {}", platform, e))
    })?;
    parsed.into_token(platform)
}

/// Reads a successful response body, or turns a non-2xx reply into a
/// `RemoteCall` error carrying the status and the start of the body.
async fn read_body(what: &str, resp: reqwest::Response) -> Result<RawBody, AppError> {
    let status = resp.status();
    let content_type = resp.headers().get(reqwest::header::CONTENT_TYPE).cloned();
    let body = resp
        .bytes()
        .await
        .map_err(|e| AppError::RemoteCall(format!("{}: reading body failed: {}", what, e)))?;

    if !status.is_success() {
        return Err(AppError::RemoteCall(format!(
            "{} returned {}: {}",
            what,
            status,
            truncate(&String::from_utf8_lossy(&body))
        )));
    }

    Ok(RawBody { content_type, body })
}

/// Appends path segments to `base`, percent-encoding each one.
fn endpoint<'a>(base: &Url, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, AppError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("{} cannot be used as an API base URL", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn parse_url(name: &str, raw: &str) -> anyhow::Result<Url> {
    Url::parse(raw).map_err(|e| anyhow::anyhow!("invalid {} '{}': {}", name, raw, e))
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let base = Url::parse("https://api.webflow.com").unwrap();
        let url = endpoint(&base, ["sites", "a/b", "export"]).unwrap();
        assert_eq!(url.as_str(), "https://api.webflow.com/sites/a%2Fb/export");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let base = Url::parse("http://127.0.0.1:9000/github/").unwrap();
        let url = endpoint(&base, ["repos", "org", "repo"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/github/repos/org/repo");
    }

    #[test]
    fn test_token_response_without_token_is_exchange_error() {
        let parsed: TokenResponse = serde_json::from_str(
            r#"{"error":"bad_verification_code","error_description":"The code passed is incorrect or expired."}"#,
        )
        .unwrap();
        match parsed.into_token(Platform::GitHub) {
            Err(AppError::Exchange(msg)) => assert!(msg.contains("bad_verification_code")),
            other => panic!("expected exchange error, got {:?}", other),
        }

        let parsed: TokenResponse = serde_json::from_str(r#"{"access_token":""}"#).unwrap();
        assert!(parsed.into_token(Platform::Webflow).is_err());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long = "é".repeat(MAX_ERROR_BODY + 10);
        assert_eq!(truncate(&long).chars().count(), MAX_ERROR_BODY);
        assert_eq!(truncate("short"), "short");
    }
}
