use base64::Engine;
use serde::Serialize;
use url::Url;

use super::{endpoint, exchange_code, parse_url, read_body, RawBody};
use crate::config::Config;
use crate::errors::AppError;
use crate::models::binding::RepositoryBinding;
use crate::models::token::{BearerToken, Platform};

/// GitHub: second OAuth leg and the repository contents API.
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scope: String,
    authorize_url: Url,
    token_url: Url,
    api_url: Url,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Serialize)]
pub struct PutContentsRequest<'a> {
    pub message: &'a str,
    /// Base64 of the file bytes.
    pub content: String,
    pub branch: &'a str,
}

impl GithubClient {
    pub fn new(http: reqwest::Client, cfg: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            http,
            client_id: cfg.github.client_id.clone(),
            client_secret: cfg.github.client_secret.clone(),
            redirect_uri: cfg.github_redirect_uri(),
            scope: cfg.github_scope.clone(),
            authorize_url: parse_url("GITHUB_AUTHORIZE_URL", &cfg.github.authorize_url)?,
            token_url: parse_url("GITHUB_TOKEN_URL", &cfg.github.token_url)?,
            api_url: parse_url("GITHUB_API_URL", &cfg.github.api_url)?,
        })
    }

    /// Consent screen URL for the second leg.
    pub fn authorize_url(&self, state: Option<&str>) -> Url {
        let mut url = self.authorize_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.client_id)
                .append_pair("scope", &self.scope)
                .append_pair("redirect_uri", &self.redirect_uri);
            if let Some(state) = state {
                query.append_pair("state", state);
            }
        }
        url
    }

    /// Trades an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<BearerToken, AppError> {
        tracing::debug!(url = %self.token_url, "exchanging GitHub authorization code");
        let request = self
            .http
            .post(self.token_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&TokenRequest {
                client_id: &self.client_id,
                client_secret: &self.client_secret,
                code,
                redirect_uri: &self.redirect_uri,
            });
        exchange_code(Platform::GitHub, request).await
    }

    /// Creates or replaces the bound file with `content` in a single commit.
    ///
    /// The request carries no `sha`, so GitHub rejects it when the file
    /// already exists; that rejection is returned like any other remote error.
    pub async fn put_contents(
        &self,
        token: &BearerToken,
        binding: &RepositoryBinding,
        message: &str,
        content: &[u8],
    ) -> Result<RawBody, AppError> {
        let segments = ["repos"]
            .into_iter()
            .chain(binding.repository.split('/'))
            .chain(["contents"])
            .chain(binding.path.split('/').filter(|s| !s.is_empty()));
        let url = endpoint(&self.api_url, segments)?;
        tracing::debug!(%url, branch = %binding.branch, bytes = content.len(), "uploading to GitHub contents API");

        let body = PutContentsRequest {
            message,
            content: base64::engine::general_purpose::STANDARD.encode(content),
            branch: &binding.branch,
        };

        let resp = self
            .http
            .put(url)
            .header(reqwest::header::AUTHORIZATION, format!("token {}", token.expose()))
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::RemoteCall(format!("GitHub contents request failed: {}", e)))?;

        read_body("GitHub contents API", resp).await
    }
}
