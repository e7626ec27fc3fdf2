use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use eldar_core::AppPage;

use super::styles;
use crate::app::{App, AppMode, Form, FormFocus};

/// Visible width of a form input.
const FIELD_WIDTH: usize = 32;

const LOGO: [&str; 3] = [
    "        ╔═╗╦  ╔╦╗╔═╗╦═╗",
    "        ║╣ ║   ║║╠═╣╠╦╝",
    "        ╚═╝╩═╝═╩╝╩ ╩╩╚═",
];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(0),    // Page body
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    match app.mode {
        AppMode::ShowingHelp => render_help_overlay(frame),
        AppMode::ConfirmingQuit => render_quit_overlay(frame),
        AppMode::Normal | AppMode::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(" Eldar ", styles::title_style())];

    if app.form.is_none() {
        for page in [AppPage::Boards, AppPage::Group, AppPage::Users] {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(page.title(), styles::tab_style(page == app.page())));
        }
    } else {
        spans.push(Span::styled(format!(" {}", app.page().title()), styles::muted_style()));
    }

    if let Some(username) = app.username() {
        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let right = format!("{} ", username);
        let pad = (area.width as usize).saturating_sub(used + right.chars().count());
        spans.push(Span::raw(" ".repeat(pad)));
        spans.push(Span::styled(right, styles::success_style()));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).style(styles::status_bar_style()), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match &app.form {
        Some(form) => render_form(frame, app, form, area),
        None => render_signed_in_page(frame, app, area),
    }
}

// ============================================================================
// Form Pages
// ============================================================================

fn render_form(frame: &mut Frame, app: &App, form: &Form, area: Rect) {
    let mut lines: Vec<Line> = LOGO
        .iter()
        .map(|l| Line::from(Span::styled(*l, styles::title_style())))
        .collect();
    lines.push(Line::from(""));

    let label_width = form.fields.iter().map(|f| f.label.len()).max().unwrap_or(0);
    for (i, field) in form.fields.iter().enumerate() {
        let focused = form.focus() == FormFocus::Field(i);
        let shown: String = if field.masked {
            "*".repeat(field.value.chars().count())
        } else {
            field.value.clone()
        };
        // Keep the tail visible while typing past the field width
        let skip = shown.chars().count().saturating_sub(FIELD_WIDTH);
        let visible: String = shown.chars().skip(skip).collect();
        let cursor = if focused { "▌" } else { "" };

        lines.push(Line::from(vec![
            Span::styled(format!("  {:>width$}: [", field.label, width = label_width), styles::muted_style()),
            Span::styled(
                format!("{:<width$}{}", visible, cursor, width = FIELD_WIDTH),
                styles::field_style(focused),
            ),
            Span::styled("]", styles::muted_style()),
        ]));
    }

    lines.push(Line::from(""));
    let mut buttons = vec![Span::raw("  ")];
    buttons.extend(button(form.submit_label, form.focus() == FormFocus::Submit));
    if let Some((label, _)) = form.link {
        buttons.push(Span::raw("   "));
        buttons.extend(button(label, form.focus() == FormFocus::Link));
    }
    lines.push(Line::from(buttons));

    if let Some(ref error) = app.error_message {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    }

    let width = (label_width + FIELD_WIDTH + 10) as u16;
    let height = lines.len() as u16 + 2;
    let rect = centered_rect_fixed(width, height, area);

    let block = Block::default()
        .title(format!(" {} ", app.page().title()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

fn button(label: &str, focused: bool) -> [Span<'static>; 3] {
    let text = if focused {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    [
        Span::raw("["),
        Span::styled(text, styles::field_style(focused)),
        Span::raw("]"),
    ]
}

// ============================================================================
// Signed-in Pages
// ============================================================================

fn render_signed_in_page(frame: &mut Frame, app: &App, area: Rect) {
    let body = match app.page() {
        AppPage::Boards => "Boards shared with you will be listed here.",
        AppPage::Group => "Members of your group will be listed here.",
        AppPage::Users => "Users you can share credentials with will be listed here.",
        _ => "",
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!(" {}", body), styles::muted_style())),
    ];

    let block = Block::default()
        .title(format!(" {} ", app.page().title()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.form.as_ref().and_then(|f| f.link) {
        Some((_, AppPage::Unknown)) => "[Tab] next | [Enter] select | [Esc] cancel",
        _ if app.form.is_some() => "[Tab] next | [Enter] select | [Esc] quit",
        _ => "[c]onfig | [s]ign out | [?] help | [q]uit",
    };

    let (left_text, left_style) = match (&app.error_message, &app.status_message) {
        (Some(err), _) if app.form.is_none() => (format!(" {} ", err), styles::error_style()),
        (_, Some(msg)) => (format!(" {} ", msg), styles::muted_style()),
        _ => (format!(" {} ", app.storage.path().display()), styles::muted_style()),
    };
    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(status_line).style(styles::status_bar_style()), area);
}

// ============================================================================
// Overlays
// ============================================================================

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(48, 18, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");
    let key_line = |key: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", key), styles::help_key_style()),
            Span::styled(desc, styles::help_desc_style()),
        ])
    };

    let mut lines: Vec<Line> = LOGO
        .iter()
        .map(|l| Line::from(Span::styled(*l, styles::title_style())))
        .collect();
    lines.extend([
        Line::from(Span::styled(
            format!("            version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Pages", styles::highlight_style())),
        key_line("1/b", "Boards"),
        key_line("2/g", "Group"),
        key_line("3/u", "Users"),
        key_line("Tab ←/→", "Next/previous page"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        key_line("c", "Edit config"),
        key_line("s", "Sign out"),
        key_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(42, 9, frame.area());
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = LOGO
        .iter()
        .map(|l| Line::from(Span::styled(*l, styles::title_style())))
        .collect();
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
