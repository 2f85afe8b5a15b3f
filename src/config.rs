use std::fmt;

/// Client credentials and endpoints for one OAuth provider.
#[derive(Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    /// Base URL of the provider's REST API (export / contents endpoints).
    pub api_url: String,
}

// Hand-written so the client secret never reaches a log line.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"****")
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Postgres connection string. `None` runs against the in-memory store.
    pub database_url: Option<String>,
    /// Redirect URI registered with both providers. The GitHub leg uses
    /// `{redirect_uri}/github`.
    pub redirect_uri: String,
    pub webflow: ProviderConfig,
    pub github: ProviderConfig,
    /// OAuth scope requested from GitHub.
    pub github_scope: String,
    pub commit_message: String,
    /// Total timeout applied to every outbound request.
    pub http_timeout_secs: u64,
    /// How long an authorization `state` stays usable after `/auth/webflow`.
    pub flow_ttl_secs: u64,
}

impl Config {
    /// Redirect URI for the first (Webflow) leg.
    pub fn webflow_redirect_uri(&self) -> String {
        self.redirect_uri.trim_end_matches('/').to_string()
    }

    /// Redirect URI for the second (GitHub) leg.
    pub fn github_redirect_uri(&self) -> String {
        format!("{}/github", self.webflow_redirect_uri())
    }

    pub fn flow_ttl(&self) -> chrono::Duration {
        let secs = i64::try_from(self.flow_ttl_secs).unwrap_or(i64::MAX);
        chrono::Duration::seconds(secs.min(i64::MAX / 1000))
    }

    /// Fails when any OAuth client credential is empty. Only the server needs
    /// them, so the CLI subcommands can run without.
    pub fn ensure_oauth_configured(&self) -> anyhow::Result<()> {
        let required = [
            ("WEBFLOW_CLIENT_ID", &self.webflow.client_id),
            ("WEBFLOW_CLIENT_SECRET", &self.webflow.client_secret),
            ("GITHUB_CLIENT_ID", &self.github.client_id),
            ("GITHUB_CLIENT_SECRET", &self.github.client_secret),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            anyhow::bail!("missing OAuth configuration: {}", missing.join(", "));
        }
        Ok(())
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let production = std::env::var("RELAY_ENV")
        .or_else(|_| std::env::var("RUST_ENV"))
        .map(|v| v == "production")
        .unwrap_or(false);

    let database_url = std::env::var("DATABASE_URL")
        .ok()
        .filter(|v| !v.trim().is_empty());
    if database_url.is_none() && production {
        anyhow::bail!("DATABASE_URL must be set when RELAY_ENV=production");
    }

    Ok(Config {
        port: parse_or("RELAY_PORT", 3000),
        database_url,
        redirect_uri: env_or("RELAY_REDIRECT_URI", "http://localhost:3000/callback"),
        webflow: ProviderConfig {
            client_id: secret("WEBFLOW_CLIENT_ID")?,
            client_secret: secret("WEBFLOW_CLIENT_SECRET")?,
            authorize_url: env_or("WEBFLOW_AUTHORIZE_URL", "https://webflow.com/oauth/authorize"),
            token_url: env_or(
                "WEBFLOW_TOKEN_URL",
                "https://api.webflow.com/oauth/access_token",
            ),
            api_url: env_or("WEBFLOW_API_URL", "https://api.webflow.com"),
        },
        github: ProviderConfig {
            client_id: secret("GITHUB_CLIENT_ID")?,
            client_secret: secret("GITHUB_CLIENT_SECRET")?,
            authorize_url: env_or(
                "GITHUB_AUTHORIZE_URL",
                "https://github.com/login/oauth/authorize",
            ),
            token_url: env_or(
                "GITHUB_TOKEN_URL",
                "https://github.com/login/oauth/access_token",
            ),
            api_url: env_or("GITHUB_API_URL", "https://api.github.com"),
        },
        github_scope: env_or("GITHUB_SCOPE", "repo"),
        commit_message: env_or("RELAY_COMMIT_MESSAGE", "Automated commit from Webflow"),
        http_timeout_secs: parse_or("RELAY_HTTP_TIMEOUT_SECS", 30),
        flow_ttl_secs: parse_or("RELAY_FLOW_TTL_SECS", 600),
    })
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Reads `name` from the environment, falling back to the file named by
/// `{name}_FILE` (mounted secrets). Unset in both places yields "".
fn secret(name: &str) -> anyhow::Result<String> {
    let file_var = format!("{}_FILE", name);
    secret_from(std::env::var(name).ok(), std::env::var(&file_var).ok(), |path| {
        std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {} from {}: {}", name, path, e))
    })
}

fn secret_from(
    direct: Option<String>,
    file: Option<String>,
    read: impl Fn(&str) -> anyhow::Result<String>,
) -> anyhow::Result<String> {
    if let Some(value) = direct.filter(|v| !v.trim().is_empty()) {
        return Ok(value.trim().to_string());
    }
    match file {
        Some(path) if !path.trim().is_empty() => Ok(read(path.trim())?.trim().to_string()),
        _ => Ok(String::new()),
    }
}

#[cfg(test)]
pub(crate) fn test_config(webflow_base: &str, github_base: &str) -> Config {
    Config {
        port: 0,
        database_url: None,
        redirect_uri: "https://relay.example.com/callback".into(),
        webflow: ProviderConfig {
            client_id: "wf-client".into(),
            client_secret: "wf-secret".into(),
            authorize_url: format!("{}/oauth/authorize", webflow_base),
            token_url: format!("{}/oauth/access_token", webflow_base),
            api_url: webflow_base.into(),
        },
        github: ProviderConfig {
            client_id: "gh-client".into(),
            client_secret: "gh-secret".into(),
            authorize_url: format!("{}/login/oauth/authorize", github_base),
            token_url: format!("{}/login/oauth/access_token", github_base),
            api_url: github_base.into(),
        },
        github_scope: "repo".into(),
        commit_message: "Automated commit from Webflow".into(),
        http_timeout_secs: 5,
        flow_ttl_secs: 600,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_prefers_direct_value() {
        let value = secret_from(Some(" abc \n".into()), Some("/nope".into()), |_| {
            panic!("file should not be read")
        })
        .unwrap();
        assert_eq!(value, "abc");
    }

    #[test]
    fn test_secret_falls_back_to_file_and_trims() {
        let value = secret_from(None, Some("/etc/secrets/X".into()), |path| {
            assert_eq!(path, "/etc/secrets/X");
            Ok("from-file\n".into())
        })
        .unwrap();
        assert_eq!(value, "from-file");
    }

    #[test]
    fn test_secret_unset_is_empty() {
        let value = secret_from(None, None, |_| unreachable!()).unwrap();
        assert!(value.is_empty());
    }

    #[test]
    fn test_secret_unreadable_file_errors() {
        let result = secret_from(Some("".into()), Some("/missing".into()), |_| {
            anyhow::bail!("no such file")
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_redirect_uris_ignore_trailing_slash() {
        let mut cfg = test_config("http://wf", "http://gh");
        assert_eq!(cfg.webflow_redirect_uri(), "https://relay.example.com/callback");
        assert_eq!(
            cfg.github_redirect_uri(),
            "https://relay.example.com/callback/github"
        );
        cfg.redirect_uri = "https://relay.example.com/callback/".into();
        assert_eq!(cfg.webflow_redirect_uri(), "https://relay.example.com/callback");
        assert_eq!(
            cfg.github_redirect_uri(),
            "https://relay.example.com/callback/github"
        );
    }

    #[test]
    fn test_ensure_oauth_configured_lists_missing() {
        let mut cfg = test_config("http://wf", "http://gh");
        assert!(cfg.ensure_oauth_configured().is_ok());
        cfg.github.client_secret.clear();
        let err = cfg.ensure_oauth_configured().unwrap_err().to_string();
        assert!(err.contains("GITHUB_CLIENT_SECRET"), "{}", err);
        assert!(!err.contains("WEBFLOW_CLIENT_ID"), "{}", err);
    }

    #[test]
    fn test_debug_redacts_client_secret() {
        let cfg = test_config("http://wf", "http://gh");
        let rendered = format!("{:?}", cfg);
        assert!(!rendered.contains("wf-secret"));
        assert!(!rendered.contains("gh-secret"));
        assert!(rendered.contains("wf-client"));
    }
}
