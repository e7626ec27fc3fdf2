//! Eldar - a terminal front end for a locally stored credential manager.
//!
//! Config and credentials live in a small embedded database; the page shown
//! on startup is decided from what is stored there.

mod app;
mod ui;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use serde::Serialize;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use eldar_core::store::CredentialRepository;
use eldar_core::{paths, AppPage, ClearOutcome, Storage};

use app::{App, AppMode};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 250;

const USAGE: &str = "\
Usage: eldar [OPTIONS]

Options:
  --page <name>             Start on a page (register, config, login, group, boards, users)
  --clear-credentials       Remove stored credentials and exit
  --seed-test-credentials   Store fixture credentials and exit
  --show-config             Print stored config as JSON and exit
  -h, --help                Show this message

Environment:
  ELDAR_DATA_DIR            Directory holding eldar.db and eldar.log
  RUST_LOG                  Log filter (default: warn)";

/// What the process was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run { page: AppPage },
    ClearCredentials,
    SeedTestCredentials,
    ShowConfig,
    Help,
}

impl Command {
    /// Only the interactive UI writes a log file; one-shot commands leave the
    /// data directory untouched and log to stderr.
    fn logs_to_file(&self) -> bool {
        matches!(self, Command::Run { .. })
    }
}

fn parse_args(args: &[String]) -> Result<Command> {
    let mut command = None;
    let mut page = AppPage::Unknown;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let next = match arg.as_str() {
            "--clear-credentials" => Command::ClearCredentials,
            "--seed-test-credentials" => Command::SeedTestCredentials,
            "--show-config" => Command::ShowConfig,
            "-h" | "--help" => return Ok(Command::Help),
            "--page" => {
                let name = iter.next().ok_or_else(|| anyhow!("--page needs a page name"))?;
                page = name
                    .parse()
                    .with_context(|| format!("Invalid --page value '{}'", name))?;
                continue;
            }
            other => bail!("Unknown argument '{}'\n\n{}", other, USAGE),
        };
        if command.replace(next).is_some() {
            bail!("Only one of --clear-credentials, --seed-test-credentials, --show-config may be given");
        }
    }

    Ok(command.unwrap_or(Command::Run { page }))
}

/// Initialize tracing, to the log file next to the database when `to_file`.
///
/// While the UI owns the terminal, logs only go to stderr when the log file
/// cannot be opened.
fn init_tracing(to_file: bool) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = if to_file {
        paths::app_dir().ok().filter(|dir| std::fs::create_dir_all(dir).is_ok())
    } else {
        None
    };
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, paths::LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    let _guard = init_tracing(command.logs_to_file());

    match command {
        Command::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        Command::ClearCredentials => clear_credentials(),
        Command::SeedTestCredentials => seed_test_credentials(),
        Command::ShowConfig => show_config(),
        Command::Run { page } => run(page),
    }
}

/// Open the default store and load its state.
fn open_storage() -> Result<Storage> {
    let mut storage = match Storage::open_default() {
        Ok(storage) => storage,
        Err(e) => {
            error!(error = %e, "Failed to open storage");
            return Err(e).context("Failed to open credential store");
        }
    };
    storage.reload();
    Ok(storage)
}

// ============================================================================
// One-shot Commands
// ============================================================================

fn clear_credentials() -> Result<()> {
    let path = paths::database_path()?;
    clear_credentials_at(&path)
}

fn clear_credentials_at(path: &Path) -> Result<()> {
    let outcome = CredentialRepository::clear_at(path)
        .with_context(|| format!("Failed to clear credentials in {}", path.display()))?;
    match outcome {
        ClearOutcome::Cleared => println!("Credentials cleared."),
        ClearOutcome::NothingToClear => println!("No stored credentials. Nothing to clear."),
    }
    Ok(())
}

fn seed_test_credentials() -> Result<()> {
    let mut storage = open_storage()?;
    storage
        .seed_test_credentials()
        .context("Failed to seed test credentials")?;
    storage.close();
    println!("Test credentials stored.");
    Ok(())
}

/// Stored config as printed by `--show-config`. Tokens are left out.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigReport<'a> {
    database: String,
    endpoint: &'a str,
    anon_key: &'a str,
    username: &'a str,
    signed_in: bool,
    start_page: AppPage,
}

impl<'a> ConfigReport<'a> {
    fn from_storage(storage: &'a Storage) -> Result<Self> {
        let state = storage.state();
        let start_page = eldar_core::navigation::resolve(AppPage::Unknown, state)?;
        Ok(Self {
            database: storage.path().display().to_string(),
            endpoint: &state.config.endpoint,
            anon_key: &state.config.anon_key,
            username: &state.credentials.username,
            signed_in: state.is_signed_in(),
            start_page,
        })
    }
}

fn show_config() -> Result<()> {
    let mut storage = open_storage()?;
    let report = ConfigReport::from_storage(&storage)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    storage.close();
    Ok(())
}

// ============================================================================
// Interactive UI
// ============================================================================

fn run(page: AppPage) -> Result<()> {
    info!("Eldar starting");
    let storage = open_storage()?;
    let mut app = App::new(storage, page)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.shutdown();

    if let Err(ref e) = result {
        error!(error = %e, "UI loop failed");
    }
    info!("Eldar shutting down");
    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    app.mode = AppMode::Quitting;
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        if app.mode == AppMode::Quitting {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_args_runs_undecided() {
        assert_eq!(
            parse_args(&[]).unwrap(),
            Command::Run { page: AppPage::Unknown }
        );
    }

    #[test]
    fn test_page_flag() {
        assert_eq!(
            parse_args(&args(&["--page", "users"])).unwrap(),
            Command::Run { page: AppPage::Users }
        );
    }

    #[test]
    fn test_invalid_page_is_error() {
        let err = parse_args(&args(&["--page", "settings"])).unwrap_err();
        assert!(err.to_string().contains("settings"));
        assert!(parse_args(&args(&["--page"])).is_err());
    }

    #[test]
    fn test_one_shot_flags() {
        assert_eq!(
            parse_args(&args(&["--clear-credentials"])).unwrap(),
            Command::ClearCredentials
        );
        assert_eq!(
            parse_args(&args(&["--seed-test-credentials"])).unwrap(),
            Command::SeedTestCredentials
        );
        assert_eq!(parse_args(&args(&["--show-config"])).unwrap(), Command::ShowConfig);
        assert_eq!(parse_args(&args(&["-h"])).unwrap(), Command::Help);
    }

    #[test]
    fn test_conflicting_flags_are_rejected() {
        assert!(parse_args(&args(&["--show-config", "--clear-credentials"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_only_interactive_run_logs_to_file() {
        assert!(Command::Run { page: AppPage::Unknown }.logs_to_file());
        assert!(Command::Run { page: AppPage::Boards }.logs_to_file());
        assert!(!Command::ClearCredentials.logs_to_file());
        assert!(!Command::SeedTestCredentials.logs_to_file());
        assert!(!Command::ShowConfig.logs_to_file());
        assert!(!Command::Help.logs_to_file());
    }

    #[test]
    fn test_clear_credentials_without_store_creates_nothing() {
        let dir = TempDir::new().unwrap();
        std::env::set_var(paths::DATA_DIR_ENV, dir.path());

        let command = parse_args(&args(&["--clear-credentials"])).unwrap();
        assert!(!command.logs_to_file());
        clear_credentials().unwrap();

        std::env::remove_var(paths::DATA_DIR_ENV);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_clear_credentials_at_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("eldar.db");
        clear_credentials_at(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_credentials_at_existing_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("eldar.db");
        {
            let mut storage = Storage::open(&path).unwrap();
            storage.seed_test_credentials().unwrap();
            storage.close();
        }

        clear_credentials_at(&path).unwrap();

        let mut storage = Storage::open(&path).unwrap();
        assert!(storage.load_credentials().unwrap().is_empty());
    }

    #[test]
    fn test_config_report_omits_tokens() {
        let dir = TempDir::new().unwrap();
        let mut storage = Storage::open(dir.path().join("eldar.db")).unwrap();
        storage.save_config("https://x", "key1").unwrap();
        storage.seed_test_credentials().unwrap();

        let report = ConfigReport::from_storage(&storage).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"endpoint\":\"https://x\""));
        assert!(json.contains("\"signedIn\":true"));
        assert!(json.contains("\"startPage\":\"boards\""));
        assert!(!json.contains("test-access-token-123"));
        assert!(!json.contains("test-refresh-token-456"));
    }
}
