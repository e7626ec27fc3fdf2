//! Keyboard input handling for the TUI.
//!
//! Form pages (config, login, register) send printable keys to the focused
//! field. The signed-in pages use single-key shortcuts.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use eldar_core::AppPage;

use crate::app::{App, AppMode, FormFocus};

/// Signed-in pages in tab order.
const SIGNED_IN_PAGES: [AppPage; 3] = [AppPage::Boards, AppPage::Group, AppPage::Users];

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if app.mode == AppMode::ShowingHelp {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.mode = AppMode::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if app.mode == AppMode::ConfirmingQuit {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.mode = AppMode::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.mode = AppMode::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    if app.form.is_some() {
        handle_form_input(app, key)?;
    } else {
        handle_page_input(app, key)?;
    }
    Ok(false)
}

fn handle_form_input(app: &mut App, key: KeyEvent) -> Result<()> {
    let Some(form) = app.form.as_mut() else {
        return Ok(());
    };

    match key.code {
        KeyCode::Esc => {
            // Esc backs out of an edit when there is a page to return to
            if !app.cancel_form()? {
                app.mode = AppMode::ConfirmingQuit;
            }
        }
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Enter => match form.focus() {
            // Enter on a field moves to the next one
            FormFocus::Field(_) => form.focus_next(),
            FormFocus::Submit => app.submit()?,
            FormFocus::Link => app.follow_link()?,
        },
        KeyCode::Char(c) => form.push_char(c),
        _ => {}
    }
    Ok(())
}

fn handle_page_input(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.mode = AppMode::ConfirmingQuit,
        KeyCode::Char('?') => app.mode = AppMode::ShowingHelp,

        KeyCode::Char('1') | KeyCode::Char('b') => app.request_page(AppPage::Boards)?,
        KeyCode::Char('2') | KeyCode::Char('g') => app.request_page(AppPage::Group)?,
        KeyCode::Char('3') | KeyCode::Char('u') => app.request_page(AppPage::Users)?,
        KeyCode::Tab | KeyCode::Right => cycle_page(app, 1)?,
        KeyCode::BackTab | KeyCode::Left => cycle_page(app, SIGNED_IN_PAGES.len() - 1)?,

        KeyCode::Char('c') => app.request_page(AppPage::Config)?,
        KeyCode::Char('s') => app.sign_out()?,
        _ => {}
    }
    Ok(())
}

fn cycle_page(app: &mut App, step: usize) -> Result<()> {
    let current = SIGNED_IN_PAGES
        .iter()
        .position(|p| *p == app.page())
        .unwrap_or(0);
    let next = SIGNED_IN_PAGES[(current + step) % SIGNED_IN_PAGES.len()];
    app.request_page(next)
}
