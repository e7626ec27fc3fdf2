use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::NavigationError;

/// Pages the front end can show.
///
/// `Unknown` is never rendered: it asks the navigator to decide the page from
/// the stored config and credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppPage {
    Register,
    Config,
    Login,
    Group,
    Boards,
    Users,
    #[default]
    Unknown,
}

impl AppPage {
    pub const ALL: [AppPage; 7] = [
        AppPage::Register,
        AppPage::Config,
        AppPage::Login,
        AppPage::Group,
        AppPage::Boards,
        AppPage::Users,
        AppPage::Unknown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AppPage::Register => "register",
            AppPage::Config => "config",
            AppPage::Login => "login",
            AppPage::Group => "group",
            AppPage::Boards => "boards",
            AppPage::Users => "users",
            AppPage::Unknown => "unknown",
        }
    }

    /// Get the display title for this page.
    pub fn title(&self) -> &'static str {
        match self {
            AppPage::Register => "Register",
            AppPage::Config => "Config",
            AppPage::Login => "Login",
            AppPage::Group => "Group",
            AppPage::Boards => "Boards",
            AppPage::Users => "Users",
            AppPage::Unknown => "Unknown",
        }
    }

    pub fn index(&self) -> u8 {
        *self as u8
    }

    /// Pages that draw something; `Unknown` only triggers a decision.
    pub fn is_renderable(&self) -> bool {
        !matches!(self, AppPage::Unknown)
    }
}

impl fmt::Display for AppPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl TryFrom<u8> for AppPage {
    type Error = NavigationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        AppPage::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| NavigationError::InvalidPage(value.to_string()))
    }
}

impl FromStr for AppPage {
    type Err = NavigationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        AppPage::ALL
            .iter()
            .copied()
            .find(|page| page.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| NavigationError::InvalidPage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_declaration_order() {
        for (i, page) in AppPage::ALL.iter().enumerate() {
            assert_eq!(page.index() as usize, i);
            assert_eq!(AppPage::try_from(i as u8).unwrap(), *page);
        }
    }

    #[test]
    fn test_out_of_range_index_is_error() {
        let err = AppPage::try_from(7).unwrap_err();
        assert_eq!(err, NavigationError::InvalidPage("7".to_string()));
        assert!(AppPage::try_from(u8::MAX).is_err());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("boards".parse::<AppPage>().unwrap(), AppPage::Boards);
        assert_eq!("Register".parse::<AppPage>().unwrap(), AppPage::Register);
        assert_eq!(" login ".parse::<AppPage>().unwrap(), AppPage::Login);
        assert!("settings".parse::<AppPage>().is_err());
        assert!("".parse::<AppPage>().is_err());
    }

    #[test]
    fn test_only_unknown_is_not_renderable() {
        assert!(!AppPage::Unknown.is_renderable());
        assert!(AppPage::ALL
            .iter()
            .filter(|p| **p != AppPage::Unknown)
            .all(|p| p.is_renderable()));
    }

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(AppPage::default(), AppPage::Unknown);
        assert_eq!(AppPage::Boards.to_string(), "Boards");
    }
}
