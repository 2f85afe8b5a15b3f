use std::fmt;

use serde::{Deserialize, Serialize};

/// The two OAuth providers the relay talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Webflow,
    GitHub,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Webflow => "webflow",
            Platform::GitHub => "github",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one stored bearer token.
///
/// `owner = None` is the shared record, stored under the bare platform name
/// (`"webflow"`, `"github"`). A user-scoped record is stored under
/// `"<platform>:<user id>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenKey {
    pub platform: Platform,
    pub owner: Option<String>,
}

impl TokenKey {
    pub fn shared(platform: Platform) -> Self {
        Self {
            platform,
            owner: None,
        }
    }

    pub fn for_user(platform: Platform, user_id: &str) -> Self {
        Self {
            platform,
            owner: Some(user_id.to_string()),
        }
    }

    /// Key for `owner` when known, the shared record otherwise.
    pub fn for_owner(platform: Platform, owner: Option<&str>) -> Self {
        match owner {
            Some(user_id) => Self::for_user(platform, user_id),
            None => Self::shared(platform),
        }
    }

    pub fn storage_key(&self) -> String {
        match &self.owner {
            Some(user_id) => format!("{}:{}", self.platform, user_id),
            None => self.platform.as_str().to_string(),
        }
    }
}

/// Opaque OAuth access token. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(****)")
    }
}
