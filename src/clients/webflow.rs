use serde::Serialize;
use url::Url;

use super::{endpoint, exchange_code, parse_url, read_body, RawBody};
use crate::config::Config;
use crate::errors::AppError;
use crate::models::token::{BearerToken, Platform};

/// Webflow: first OAuth leg and the site export API.
#[derive(Clone)]
pub struct WebflowClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    authorize_url: Url,
    token_url: Url,
    api_url: Url,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

impl WebflowClient {
    pub fn new(http: reqwest::Client, cfg: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            http,
            client_id: cfg.webflow.client_id.clone(),
            client_secret: cfg.webflow.client_secret.clone(),
            redirect_uri: cfg.webflow_redirect_uri(),
            authorize_url: parse_url("WEBFLOW_AUTHORIZE_URL", &cfg.webflow.authorize_url)?,
            token_url: parse_url("WEBFLOW_TOKEN_URL", &cfg.webflow.token_url)?,
            api_url: parse_url("WEBFLOW_API_URL", &cfg.webflow.api_url)?,
        })
    }

    /// Consent screen URL for the first leg.
    pub fn authorize_url(&self, state: Option<&str>) -> Url {
        let mut url = self.authorize_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.client_id)
                .append_pair("response_type", "code")
                .append_pair("redirect_uri", &self.redirect_uri);
            if let Some(state) = state {
                query.append_pair("state", state);
            }
        }
        url
    }

    /// Trades an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<BearerToken, AppError> {
        tracing::debug!(url = %self.token_url, "exchanging Webflow authorization code");
        let request = self.http.post(self.token_url.clone()).json(&TokenRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            grant_type: "authorization_code",
            code,
            redirect_uri: &self.redirect_uri,
        });
        exchange_code(Platform::Webflow, request).await
    }

    /// Downloads the site export. The body is returned as-is; its format is
    /// whatever Webflow sends.
    pub async fn export_site(
        &self,
        token: &BearerToken,
        site_id: &str,
    ) -> Result<RawBody, AppError> {
        let url = endpoint(&self.api_url, ["sites", site_id, "export"])?;
        tracing::debug!(%url, "fetching Webflow site export");

        let resp = self
            .http
            .get(url)
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(|e| AppError::RemoteCall(format!("Webflow export request failed: {}", e)))?;

        read_body("Webflow export", resp).await
    }
}
