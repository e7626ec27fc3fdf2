use tracing::debug;

use super::{AppPage, NavigationError};
use crate::state::AppState;

/// `Unknown` re-dispatches once, to a page that always renders.
pub const MAX_DISPATCH_STEPS: usize = 2;

/// Pick the landing page from stored state.
///
/// Missing config wins over missing credentials, since signing in needs an
/// endpoint to talk to.
pub fn decide(state: &AppState) -> AppPage {
    if state.needs_config() {
        AppPage::Config
    } else if !state.is_signed_in() {
        AppPage::Login
    } else {
        AppPage::Boards
    }
}

/// Resolve `page` to the page that should be rendered.
///
/// Every page except `Unknown` renders as-is. `Unknown` is replaced by the
/// result of [`decide`] and evaluated again.
pub fn resolve(page: AppPage, state: &AppState) -> Result<AppPage, NavigationError> {
    let mut current = page;
    for _ in 0..MAX_DISPATCH_STEPS {
        if current.is_renderable() {
            return Ok(current);
        }
        current = decide(state);
    }
    Err(NavigationError::DispatchLimit(current))
}

/// Current page, owned by whoever drives the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Navigator {
    page: AppPage,
}

impl Navigator {
    /// Start undecided, so the first evaluation runs the decision procedure.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(page: AppPage) -> Self {
        Self { page }
    }

    /// The page as last requested or resolved; may be `Unknown`.
    pub fn page(&self) -> AppPage {
        self.page
    }

    /// Go straight to `page`, regardless of stored state.
    pub fn request_page(&mut self, page: AppPage) {
        debug!(from = %self.page, to = %page, "Page requested");
        self.page = page;
    }

    /// Forget the current page so the next evaluation decides again.
    pub fn reset(&mut self) {
        self.request_page(AppPage::Unknown);
    }

    /// Resolve and remember the page to render for `state`.
    pub fn current_page(&mut self, state: &AppState) -> Result<AppPage, NavigationError> {
        let resolved = resolve(self.page, state)?;
        if resolved != self.page {
            debug!(from = %self.page, to = %resolved, "Page resolved");
            self.page = resolved;
        }
        Ok(resolved)
    }
}
