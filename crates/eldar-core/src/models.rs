//! Values persisted in the local store.

use std::fmt;

/// Remote project settings entered on the config page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub endpoint: String,
    pub anon_key: String,
}

impl Config {
    pub fn new(endpoint: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            anon_key: anon_key.into(),
        }
    }

    /// Both fields are required before the app can talk to a backend.
    pub fn is_complete(&self) -> bool {
        !self.endpoint.is_empty() && !self.anon_key.is_empty()
    }
}

/// Session credentials for the signed-in user.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Only a full set counts; a username without tokens is treated as signed out.
    pub fn is_present(&self) -> bool {
        !self.username.is_empty() && !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.access_token.is_empty() && self.refresh_token.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(token: &str) -> &'static str {
            if token.is_empty() {
                ""
            } else {
                "<redacted>"
            }
        }

        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}
