use std::path::Path;

use tracing::{debug, info};

use super::{KeyValueStore, RepositoryError};
use crate::models::{Config, Credentials};

pub const CONFIG_BUCKET: &str = "config";
pub const CREDENTIALS_BUCKET: &str = "credentials";

const ENDPOINT_KEY: &str = "endpoint";
const ANON_KEY_KEY: &str = "anonKey";

const USERNAME_KEY: &str = "username";
const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";

const CREDENTIAL_KEYS: [&str; 3] = [USERNAME_KEY, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY];

/// Missing keys load as the empty string.
fn decode(value: Option<Vec<u8>>) -> String {
    match value {
        Some(bytes) => match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        },
        None => String::new(),
    }
}

/// Result of a credential clear that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared,
    /// The store file or bucket never existed.
    NothingToClear,
}

pub struct ConfigRepository<'a> {
    store: &'a KeyValueStore,
}

impl<'a> ConfigRepository<'a> {
    pub fn new(store: &'a KeyValueStore) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Result<Config, RepositoryError> {
        self.store
            .view(|tx| {
                Ok(Config {
                    endpoint: decode(tx.get(CONFIG_BUCKET, ENDPOINT_KEY)?),
                    anon_key: decode(tx.get(CONFIG_BUCKET, ANON_KEY_KEY)?),
                })
            })
            .map_err(RepositoryError::LoadConfig)
    }

    pub fn save(&self, config: &Config) -> Result<(), RepositoryError> {
        self.store
            .update(|tx| {
                tx.put(CONFIG_BUCKET, ENDPOINT_KEY, config.endpoint.as_bytes())?;
                tx.put(CONFIG_BUCKET, ANON_KEY_KEY, config.anon_key.as_bytes())
            })
            .map_err(RepositoryError::SaveConfig)?;
        debug!(endpoint = %config.endpoint, "Config saved");
        Ok(())
    }
}

pub struct CredentialRepository<'a> {
    store: &'a KeyValueStore,
}

impl<'a> CredentialRepository<'a> {
    pub fn new(store: &'a KeyValueStore) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Result<Credentials, RepositoryError> {
        self.store
            .view(|tx| {
                Ok(Credentials {
                    username: decode(tx.get(CREDENTIALS_BUCKET, USERNAME_KEY)?),
                    access_token: decode(tx.get(CREDENTIALS_BUCKET, ACCESS_TOKEN_KEY)?),
                    refresh_token: decode(tx.get(CREDENTIALS_BUCKET, REFRESH_TOKEN_KEY)?),
                })
            })
            .map_err(RepositoryError::LoadCredentials)
    }

    pub fn save(&self, credentials: &Credentials) -> Result<(), RepositoryError> {
        self.store
            .update(|tx| {
                tx.put(CREDENTIALS_BUCKET, USERNAME_KEY, credentials.username.as_bytes())?;
                tx.put(CREDENTIALS_BUCKET, ACCESS_TOKEN_KEY, credentials.access_token.as_bytes())?;
                tx.put(CREDENTIALS_BUCKET, REFRESH_TOKEN_KEY, credentials.refresh_token.as_bytes())
            })
            .map_err(RepositoryError::SaveCredentials)?;
        debug!(username = %credentials.username, "Credentials saved");
        Ok(())
    }

    /// Delete all three credential keys in one transaction.
    ///
    /// A bucket that was never created means there is nothing to clear. A bucket
    /// that disappears once the delete transaction is running is an error.
    pub fn clear(&self) -> Result<ClearOutcome, RepositoryError> {
        let exists = self
            .store
            .has_bucket(CREDENTIALS_BUCKET)
            .map_err(RepositoryError::ClearCredentials)?;
        if !exists {
            info!("Credentials bucket does not exist, nothing to clear");
            return Ok(ClearOutcome::NothingToClear);
        }

        self.store
            .update(|tx| {
                for key in CREDENTIAL_KEYS {
                    tx.delete(CREDENTIALS_BUCKET, key)?;
                }
                Ok(())
            })
            .map_err(RepositoryError::ClearCredentials)?;

        info!("Credentials cleared");
        Ok(ClearOutcome::Cleared)
    }

    /// Clear credentials in the store file at `path` without keeping it open.
    ///
    /// Never creates the file: a missing store means there is nothing to clear.
    pub fn clear_at(path: &Path) -> Result<ClearOutcome, RepositoryError> {
        if !path.exists() {
            info!(path = %path.display(), "Store file does not exist, nothing to clear");
            return Ok(ClearOutcome::NothingToClear);
        }

        let mut store = KeyValueStore::open(path).map_err(RepositoryError::ClearCredentials)?;
        let outcome = CredentialRepository::new(&store).clear();
        store.close();
        outcome
    }
}

// ============================================================================
// Tests
// ============================================================================
