//! Application state management for the Eldar TUI.
//!
//! `App` owns the open `Storage` and the `Navigator`, plus the form state for
//! whichever page is on screen. Every action that changes stored data goes
//! through `Storage`, then asks the navigator for the page again.

use anyhow::Result;
use thiserror::Error;
use tracing::{error, info, warn};

use eldar_core::{AppPage, ClearOutcome, Navigator, Storage};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for endpoint input.
const MAX_ENDPOINT_LENGTH: usize = 256;

/// Maximum length for the anonymous key. Project keys are long JWTs.
const MAX_KEY_LENGTH: usize = 512;

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input, matching the password policy.
const MAX_PASSWORD_LENGTH: usize = 255;

/// Minimum password length in bytes for registration.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Characters that count as "special" in the password policy.
const PASSWORD_SPECIALS: &str = "!\"£$%^&*()-_=+][{}'@#~/?.>,<|";

// ============================================================================
// UI State Types
// ============================================================================

/// Overlay state on top of the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// One text input on a form page.
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub masked: bool,
    max_len: usize,
}

impl FormField {
    fn text(label: &'static str, max_len: usize) -> Self {
        Self {
            label,
            value: String::new(),
            masked: false,
            max_len,
        }
    }

    fn secret(label: &'static str, max_len: usize) -> Self {
        Self {
            masked: true,
            ..Self::text(label, max_len)
        }
    }

    fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    fn can_add_char(&self, c: char) -> bool {
        self.value.chars().count() < self.max_len && is_valid_input_char(c)
    }
}

/// What has keyboard focus on a form page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFocus {
    Field(usize),
    Submit,
    Link,
}

/// Inputs, submit button and optional link to another page.
#[derive(Debug, Clone)]
pub struct Form {
    pub fields: Vec<FormField>,
    pub submit_label: &'static str,
    /// Label and destination of the secondary button.
    pub link: Option<(&'static str, AppPage)>,
    position: usize,
}

impl Form {
    fn new(fields: Vec<FormField>, submit_label: &'static str) -> Self {
        Self {
            fields,
            submit_label,
            link: None,
            position: 0,
        }
    }

    fn with_link(mut self, label: &'static str, page: AppPage) -> Self {
        self.link = Some((label, page));
        self
    }

    /// Form shown on the page, if that page has one.
    pub fn for_page(page: AppPage, storage: &Storage) -> Option<Self> {
        match page {
            AppPage::Config => {
                let config = &storage.state().config;
                let form = Form::new(
                    vec![
                        FormField::text("Endpoint", MAX_ENDPOINT_LENGTH).with_value(&config.endpoint),
                        FormField::text("Anonymous Key", MAX_KEY_LENGTH).with_value(&config.anon_key),
                    ],
                    "Save",
                );
                // Unknown sends the user back to whatever page the stored state picks
                if config.is_complete() {
                    Some(form.with_link("Cancel", AppPage::Unknown))
                } else {
                    Some(form)
                }
            }
            AppPage::Login => Some(
                Form::new(
                    vec![
                        FormField::text("Email", MAX_EMAIL_LENGTH),
                        FormField::secret("Password", MAX_PASSWORD_LENGTH),
                    ],
                    "Login",
                )
                .with_link("Register", AppPage::Register),
            ),
            AppPage::Register => Some(
                Form::new(
                    vec![
                        FormField::text("Email", MAX_EMAIL_LENGTH),
                        FormField::secret("Password", MAX_PASSWORD_LENGTH),
                        FormField::secret("Confirm Password", MAX_PASSWORD_LENGTH),
                    ],
                    "Register",
                )
                .with_link("Back to Login", AppPage::Login),
            ),
            AppPage::Group | AppPage::Boards | AppPage::Users | AppPage::Unknown => None,
        }
    }

    fn stops(&self) -> usize {
        self.fields.len() + 1 + usize::from(self.link.is_some())
    }

    pub fn focus(&self) -> FormFocus {
        if self.position < self.fields.len() {
            FormFocus::Field(self.position)
        } else if self.position == self.fields.len() {
            FormFocus::Submit
        } else {
            FormFocus::Link
        }
    }

    pub fn focus_next(&mut self) {
        self.position = (self.position + 1) % self.stops();
    }

    pub fn focus_prev(&mut self) {
        self.position = (self.position + self.stops() - 1) % self.stops();
    }

    pub fn push_char(&mut self, c: char) {
        if let FormFocus::Field(i) = self.focus() {
            let field = &mut self.fields[i];
            if field.can_add_char(c) {
                field.value.push(c);
            }
        }
    }

    pub fn pop_char(&mut self) {
        if let FormFocus::Field(i) = self.focus() {
            self.fields[i].value.pop();
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.as_str()).unwrap_or_default()
    }
}

/// Check if a character is valid for text input (printable, no control chars)
pub fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

// ============================================================================
// Validation
// ============================================================================

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Email and password required")]
    MissingFields,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password must be 8-255 characters")]
    PasswordLength,

    #[error("Password needs upper and lower case letters, a digit and a special character")]
    PasswordStrength,

    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Accept a bare `local@domain` address.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail);
    };
    let well_formed = !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !email
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '(' | ')' | ',' | ';' | ':' | '"'));
    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// Registration policy: 8-255 bytes with upper, lower, digit and special.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&password.len()) {
        return Err(ValidationError::PasswordLength);
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    if has_upper && has_lower && has_digit && has_special {
        Ok(())
    } else {
        Err(ValidationError::PasswordStrength)
    }
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    validate_email(email)
}

pub fn validate_register(email: &str, password: &str, confirm: &str) -> Result<(), ValidationError> {
    validate_login(email, password)?;
    validate_password(password)?;
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub storage: Storage,
    navigator: Navigator,
    page: AppPage,

    pub mode: AppMode,
    pub form: Option<Form>,
    pub status_message: Option<String>,
    pub error_message: Option<String>,
}

impl App {
    /// Create the app on `start`; `AppPage::Unknown` lets stored state decide.
    pub fn new(storage: Storage, start: AppPage) -> Result<Self> {
        let mut app = Self {
            storage,
            navigator: Navigator::starting_at(start),
            page: AppPage::Unknown,
            mode: AppMode::Normal,
            form: None,
            status_message: None,
            error_message: None,
        };
        app.refresh_page()?;
        info!(page = %app.page, "App started");
        Ok(app)
    }

    /// The page currently on screen.
    pub fn page(&self) -> AppPage {
        self.page
    }

    /// Ask the navigator for the page and rebuild the form when it changes.
    pub fn refresh_page(&mut self) -> Result<()> {
        let page = self.navigator.current_page(self.storage.state())?;
        if page != self.page || self.form.is_none() {
            self.page = page;
            self.form = Form::for_page(page, &self.storage);
        }
        Ok(())
    }

    /// Explicit navigation from a button or key.
    pub fn request_page(&mut self, page: AppPage) -> Result<()> {
        self.navigator.request_page(page);
        self.error_message = None;
        self.refresh_page()
    }

    fn set_error(&mut self, message: String) {
        self.status_message = None;
        self.error_message = Some(message);
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.error_message = None;
        self.status_message = Some(message.into());
    }

    // =========================================================================
    // Form Submits
    // =========================================================================

    /// Submit whatever form is on screen.
    pub fn submit(&mut self) -> Result<()> {
        match self.page {
            AppPage::Config => self.submit_config(),
            AppPage::Login => {
                self.submit_login();
                Ok(())
            }
            AppPage::Register => {
                self.submit_register();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Save config and let navigation pick the next page.
    /// On failure the config page stays up with the error shown.
    pub fn submit_config(&mut self) -> Result<()> {
        let Some(form) = self.form.as_ref() else {
            return Ok(());
        };
        let endpoint = form.value(0).trim().to_string();
        let anon_key = form.value(1).trim().to_string();

        match self.storage.save_config(&endpoint, &anon_key) {
            Ok(()) => {
                self.set_status("Config saved");
                self.navigator.reset();
                self.form = None;
                self.refresh_page()
            }
            Err(e) => {
                error!(error = %e, "Failed to save config");
                self.set_error(e.to_string());
                Ok(())
            }
        }
    }

    /// Sign-in is not wired to a backend; the request is only logged.
    pub fn submit_login(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        let email = form.value(0).trim().to_string();
        if let Err(e) = validate_login(&email, form.value(1)) {
            self.set_error(e.to_string());
            return;
        }
        info!(email = %email, "Login requested");
        self.set_status("Sign-in is not available yet");
    }

    /// Registration is not wired to a backend; the request is only logged.
    pub fn submit_register(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        let email = form.value(0).trim().to_string();
        if let Err(e) = validate_register(&email, form.value(1), form.value(2)) {
            self.set_error(e.to_string());
            return;
        }
        info!(email = %email, "Registration requested");
        self.set_status("Registration is not available yet");
    }

    /// Follow the form's secondary button.
    pub fn follow_link(&mut self) -> Result<()> {
        match self.form.as_ref().and_then(|f| f.link) {
            Some((_, page)) => self.request_page(page),
            None => Ok(()),
        }
    }

    /// Leave the form without submitting when it has a cancel link.
    /// Returns false when there is nothing to go back to.
    pub fn cancel_form(&mut self) -> Result<bool> {
        match self.form.as_ref().and_then(|f| f.link) {
            Some((_, AppPage::Unknown)) => {
                self.request_page(AppPage::Unknown)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Clear stored credentials and return to whatever page navigation picks.
    pub fn sign_out(&mut self) -> Result<()> {
        match self.storage.clear_credentials() {
            Ok(ClearOutcome::Cleared) => self.set_status("Signed out"),
            Ok(ClearOutcome::NothingToClear) => self.set_status("No stored credentials"),
            Err(e) => {
                error!(error = %e, "Failed to clear credentials");
                self.set_error(e.to_string());
                return Ok(());
            }
        }
        self.navigator.reset();
        self.refresh_page()
    }

    /// Signed-in username, when credentials are present.
    pub fn username(&self) -> Option<&str> {
        let creds = &self.storage.state().credentials;
        creds.is_present().then_some(creds.username.as_str())
    }

    pub fn shutdown(&mut self) {
        if self.mode != AppMode::Quitting {
            warn!(mode = ?self.mode, "Shutting down outside of quit flow");
        }
        self.storage.close();
    }
}

// ============================================================================
// Tests
// ============================================================================
