// CLI module - command-line argument parsing and handlers
//
// Each subcommand drives one of the library controllers against the live
// backend, the way the home page would:
// - suggest / search / provinces: typeahead and submit
// - history: list, delete one, clear all
// - login / register / preferences / logout / whoami / emails: auth panel
// - dates: travel date window
// - config --show / --path / --reset: configuration management

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::time::Instant;

use tripsearch::api::{ApiClient, Backend, DeleteOutcome};
use tripsearch::auth::{AuthOutcome, AuthPanel, AuthStatus, NoModal};
use tripsearch::config::{Config, VERSION};
use tripsearch::dates::TravelDateWindow;
use tripsearch::history::HistoryPanel;
use tripsearch::session::{FileStorage, KeyValueStore, LocalSessionStore, RecentEmails};
use tripsearch::suggest::{AutocompleteController, Binding, ControllerState, ProvinceLookup};
use tripsearch::text::{EMPHASIS_CLOSE, EMPHASIS_OPEN};

/// How often a waiting command checks whether the controller settled
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// tripsearch - travel site search client
#[derive(Parser)]
#[command(name = "tripsearch")]
#[command(version = VERSION)]
#[command(about = "Destination search, history and login for the travel site", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show typeahead suggestions for a query
    Suggest {
        query: String,

        /// Pick row N (1-based) and print where it leads
        #[arg(long)]
        select: Option<usize>,
    },

    /// Resolve a query the way pressing Enter does
    Search { query: String },

    /// Look up provinces for the origin (default) or destination input
    Provinces {
        query: String,

        /// Use the destination ("to") input
        #[arg(long)]
        to: bool,

        /// Pick row N (1-based) and print the filled value
        #[arg(long)]
        select: Option<usize>,
    },

    /// Show or edit the search history
    History {
        /// Delete one query
        #[arg(long, conflicts_with = "all")]
        delete: Option<String>,

        /// Delete the whole history
        #[arg(long)]
        all: bool,
    },

    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,

        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account and store the session
    Register {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,

        /// Defaults to the password
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Save travel preferences for the logged-in user
    Preferences {
        /// Travel type, repeatable
        #[arg(long = "type", required = true)]
        travel_types: Vec<String>,

        /// Location, repeatable
        #[arg(long = "location", required = true)]
        locations: Vec<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show who is logged in
    Whoami,

    /// List remembered login emails
    Emails,

    /// Show the bookable travel date range
    Dates {
        /// Check (and clamp) a date, YYYY-MM-DD
        #[arg(long)]
        check: Option<String>,
    },

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a command needs, built once from config
struct App {
    config: Config,
    backend: Arc<dyn Backend>,
    storage: Arc<dyn KeyValueStore>,
}

impl App {
    fn new(config: Config) -> Result<Self> {
        let client = ApiClient::from_config(&config).context("Failed to create API client")?;
        tracing::debug!("Backend: {}", client.base_url());
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStorage::new(&config.storage_path));
        Ok(Self {
            config,
            backend: Arc::new(client),
            storage,
        })
    }

    fn emails(&self) -> RecentEmails {
        RecentEmails::with_cap(self.storage.clone(), self.config.recent_email_cap)
    }

    fn auth_panel(&self) -> AuthPanel {
        AuthPanel::new(
            self.backend.clone(),
            Arc::new(LocalSessionStore::new(self.storage.clone())),
            self.emails(),
            Arc::new(NoModal),
        )
    }

    /// Upper bound on how long a debounced lookup may take to settle
    fn settle_timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs) + Duration::from_secs(1)
    }
}

/// Run a non-config command
pub async fn run(command: Commands, config: Config) -> Result<()> {
    let app = App::new(config)?;

    match command {
        Commands::Suggest { query, select } => handle_suggest(&app, &query, select).await,
        Commands::Search { query } => handle_search(&app, &query).await,
        Commands::Provinces { query, to, select } => {
            handle_provinces(&app, &query, to, select).await
        }
        Commands::History { delete, all } => handle_history(&app, delete, all).await,
        Commands::Login { email, password } => {
            let password = password_or_prompt(password, "Password")?;
            let outcome = app.auth_panel().login(&email, &password).await?;
            report_outcome(outcome)
        }
        Commands::Register {
            username,
            email,
            password,
            confirm,
        } => {
            let password = password_or_prompt(password, "Password")?;
            let confirm = confirm.unwrap_or_else(|| password.clone());
            let outcome = app
                .auth_panel()
                .register(&username, &email, &password, &confirm)
                .await?;
            report_outcome(outcome)
        }
        Commands::Preferences {
            travel_types,
            locations,
        } => {
            app.auth_panel()
                .save_preferences(travel_types, locations)
                .await?;
            println!("Preferences saved");
            Ok(())
        }
        Commands::Logout => {
            app.auth_panel().logout().await?;
            println!("Logged out");
            Ok(())
        }
        Commands::Whoami => {
            match app.auth_panel().check_status() {
                AuthStatus::LoggedIn {
                    display_name,
                    email,
                } => println!("{} <{}>", display_name, email),
                AuthStatus::LoggedOut => println!("Not logged in"),
            }
            Ok(())
        }
        Commands::Emails => {
            for email in app.emails().list() {
                println!("{}", email);
            }
            Ok(())
        }
        Commands::Dates { check } => handle_dates(&app, check.as_deref()),
        // Handled by handle_config before startup
        Commands::Config { .. } => Ok(()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Suggestions
// ─────────────────────────────────────────────────────────────────────────────

/// Sleep through the debounce, then poll until the controller leaves
/// Pending/Waiting or the timeout elapses
async fn wait_settled(state: impl Fn() -> ControllerState, delay: Duration, timeout: Duration) {
    tokio::time::sleep(delay).await;
    let deadline = Instant::now() + timeout;
    while matches!(state(), ControllerState::Pending | ControllerState::Waiting)
        && Instant::now() < deadline
    {
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Emphasis markup as brackets for the terminal
fn plain(title: &str) -> String {
    title.replace(EMPHASIS_OPEN, "[").replace(EMPHASIS_CLOSE, "]")
}

async fn handle_suggest(app: &App, query: &str, select: Option<usize>) -> Result<()> {
    let controller =
        AutocompleteController::with_delay(app.backend.clone(), app.config.quick_search_delay());
    controller.on_input(query);
    wait_settled(
        || controller.state(),
        app.config.quick_search_delay(),
        app.settle_timeout(),
    )
    .await;

    if !controller.is_open() {
        println!("No suggestions");
        return Ok(());
    }

    for (i, item) in controller.items().iter().enumerate() {
        let view = &item.view;
        let mut line = format!("{:>2}. {}", i + 1, plain(&view.title));
        for extra in [&view.subtitle, &view.badge, &view.rating].into_iter().flatten() {
            line.push_str("  ");
            line.push_str(extra);
        }
        println!("{}", line);
    }

    if let Some(n) = select {
        match n.checked_sub(1).and_then(|i| controller.select(i)) {
            Some(navigation) => println!("\n→ {}", navigation),
            None => bail!("No suggestion number {}", n),
        }
    }
    Ok(())
}

async fn handle_search(app: &App, query: &str) -> Result<()> {
    let controller =
        AutocompleteController::with_delay(app.backend.clone(), app.config.quick_search_delay());
    controller.on_input(query);
    let navigation = controller.submit().await;
    println!("{}", navigation);
    Ok(())
}

async fn handle_provinces(app: &App, query: &str, to: bool, select: Option<usize>) -> Result<()> {
    let binding = if to {
        Binding::ToLocation
    } else {
        Binding::FromLocation
    };
    let lookup = ProvinceLookup::new(binding, app.backend.clone(), app.config.province_delay());
    lookup.on_input(query);
    wait_settled(
        || lookup.state(),
        app.config.province_delay(),
        app.settle_timeout(),
    )
    .await;

    let options = lookup.options();
    if !lookup.is_open() || options.is_empty() {
        println!("No provinces");
        return Ok(());
    }
    for (i, province) in options.iter().enumerate() {
        println!("{:>2}. {}", i + 1, province);
    }

    if let Some(n) = select {
        match n.checked_sub(1).and_then(|i| lookup.select(i)) {
            Some(value) => println!("\n{} = {}", binding.as_str(), value),
            None => bail!("No province number {}", n),
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// History
// ─────────────────────────────────────────────────────────────────────────────

async fn handle_history(app: &App, delete: Option<String>, all: bool) -> Result<()> {
    let history = HistoryPanel::with_limit(app.backend.clone(), app.config.history_limit);

    if all {
        match history.clear_all().await? {
            DeleteOutcome::Deleted => println!("History cleared"),
            DeleteOutcome::Failed(error) => bail!("{}", error),
        }
        return Ok(());
    }

    if let Some(query) = delete {
        if let DeleteOutcome::Failed(error) = history.delete(&query).await? {
            bail!("{}", error);
        }
    } else {
        history.load().await;
    }

    if !history.is_visible() {
        println!("No search history");
        return Ok(());
    }
    for entry in history.entries() {
        match entry.badge {
            Some(badge) => println!("{}  ({})  {}", entry.query, badge, entry.href),
            None => println!("{}  {}", entry.query, entry.href),
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth helpers
// ─────────────────────────────────────────────────────────────────────────────

fn password_or_prompt(password: Option<String>, label: &str) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    eprint!("{}: ", label);
    std::io::stderr().flush().ok();

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn report_outcome(outcome: AuthOutcome) -> Result<()> {
    match outcome {
        AuthOutcome::Accepted(session) => {
            println!("Logged in as {}", session.display_name());
            Ok(())
        }
        AuthOutcome::Rejected(message) => bail!("{}", message),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dates
// ─────────────────────────────────────────────────────────────────────────────

fn handle_dates(app: &App, check: Option<&str>) -> Result<()> {
    let window = TravelDateWindow::current(app.config.travel_window_days);
    println!("min = {}", window.min_iso());
    println!("max = {}", window.max_iso());

    if let Some(value) = check {
        let date = TravelDateWindow::parse_iso(value)
            .with_context(|| format!("Invalid date {:?}, expected YYYY-MM-DD", value))?;
        if window.contains(date) {
            println!("{} is bookable", date);
        } else {
            println!("{} is outside the window, nearest is {}", date, window.clamp(date));
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

/// Handle `config`. Returns true if it was the config command (exit after).
pub fn handle_config(command: &Commands) -> bool {
    let Commands::Config { show, reset, path } = command else {
        return false;
    };

    if *path {
        handle_config_path();
    } else if *show {
        handle_config_show();
    } else if *reset {
        handle_config_reset();
    } else {
        // No flag provided, show help
        println!("Usage: tripsearch config [--show|--reset|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --path    Show config file path");
    }
    true
}

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => {
            eprintln!("Error: Could not determine config path");
            std::process::exit(1);
        }
    }
}

fn handle_config_show() {
    let config = Config::from_env();

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());
}

fn handle_config_reset() {
    let Some(path) = Config::config_path() else {
        eprintln!("Error: Could not determine config path");
        std::process::exit(1);
    };

    if path.exists() {
        print!("Overwrite {} with defaults? [y/N] ", path.display());
        std::io::stdout().flush().ok();

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input).is_err() {
            println!("Aborted.");
            return;
        }
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return;
        }
    }

    if let Err(e) = Config::default().save() {
        eprintln!("Error writing config: {}", e);
        std::process::exit(1);
    }

    println!("Config reset to defaults: {}", path.display());
}
