mod api;
mod app;
mod auth;
mod components;
mod config;
mod error;
mod form;
mod logging;
mod mailbox;
mod models;
mod payment;
mod resource;
mod router;
mod schemas;
mod session;
mod toast;
mod tui;
mod utils;
mod validation;

use anyhow::Result;
use api::{http::HttpTransport, ApiClient};
use app::App;
use clap::Parser;
use config::Config;
use ratatui::prelude::{CrosstermBackend, Terminal};
use session::SqliteSessionStore;
use std::io;
use tracing::{error, info};
use tui::{CleanupGuard, Tui};

fn main() -> Result<()> {
    let config = Config::parse();
    logging::init(&config.log_file)?;
    info!(api = %config.api_url, "starting medidash");

    let store = SqliteSessionStore::open(&config.session_db)?;
    let transport = HttpTransport::new(&config.api_url, config.request_timeout())?;
    let mut app = App::new(ApiClient::new(Box::new(transport)), Box::new(store), config);
    app.restore_session()?;

    let _guard = CleanupGuard;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    let mut tui = Tui::new(terminal);
    tui.init()?;

    let res = app.run(&mut tui);

    tui.exit()?;

    if let Err(e) = res {
        error!(error = %e, "application error");
        eprintln!("Application Error: {e}");
    }
    info!("medidash stopped");
    Ok(())
}
