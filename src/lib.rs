//! Webflow → GitHub relay.
//!
//! Walks a browser through Webflow's and GitHub's OAuth consent screens,
//! keeps the resulting tokens, and on request copies a Webflow site export
//! into a GitHub repository file.

pub mod api;
pub mod clients;
pub mod config;
pub mod errors;
pub mod jobs;
pub mod models;
pub mod store;

use std::sync::Arc;

use clients::github::GithubClient;
use clients::webflow::WebflowClient;
use store::Store;

/// Shared application state passed to handlers.
pub struct AppState {
    pub config: config::Config,
    pub store: Arc<dyn Store>,
    pub webflow: WebflowClient,
    pub github: GithubClient,
}

impl AppState {
    pub fn new(config: config::Config, store: Arc<dyn Store>) -> anyhow::Result<Self> {
        let http = clients::build_http_client(config.http_timeout_secs)?;
        let webflow = WebflowClient::new(http.clone(), &config)?;
        let github = GithubClient::new(http, &config)?;
        Ok(Self {
            config,
            store,
            webflow,
            github,
        })
    }
}
