//! Page navigation.
//!
//! - `AppPage`: the pages the front end can show
//! - `Navigator`: the caller-owned current page plus the decision procedure
//!   that picks Config, Login or Boards from the stored state

pub mod controller;
pub mod page;

pub use controller::{decide, resolve, Navigator, MAX_DISPATCH_STEPS};
pub use page::AppPage;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Unknown page: {0}")]
    InvalidPage(String),

    #[error("Navigation did not settle on a page (stopped at {0})")]
    DispatchLimit(AppPage),
}
