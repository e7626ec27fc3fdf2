//! Eldar core - local config and credential storage, and page navigation.
//!
//! This crate provides:
//! - `store`: redb-backed key-value store, repositories and the `Storage` facade
//! - `navigation`: `AppPage` and the `Navigator` that picks the page to show
//! - `models`: the persisted `Config` and `Credentials`
//! - `state`: `AppState`, the cached copy navigation reads from
//! - `paths`: where the store lives on each platform
//!
//! Front ends open a `Storage` once at startup, keep it for the life of the
//! process, and ask a `Navigator` which page to render after every change.

pub mod models;
pub mod navigation;
pub mod paths;
pub mod state;
pub mod store;

pub use models::{Config, Credentials};
pub use navigation::{AppPage, NavigationError, Navigator};
pub use state::AppState;
pub use store::{ClearOutcome, RepositoryError, Storage, StoreError};
