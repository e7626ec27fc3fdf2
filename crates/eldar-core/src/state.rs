use crate::models::{Config, Credentials};

/// Last loaded or saved values, as seen by navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub config: Config,
    pub credentials: Credentials,
}

impl AppState {
    pub fn new(config: Config, credentials: Credentials) -> Self {
        Self {
            config,
            credentials,
        }
    }

    pub fn needs_config(&self) -> bool {
        !self.config.is_complete()
    }

    pub fn is_signed_in(&self) -> bool {
        self.credentials.is_present()
    }
}
