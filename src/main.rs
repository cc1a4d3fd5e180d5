mod cli;
mod config;
mod db;
mod models;
mod prayer_times;
mod session;
mod tui;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;

use cli::args::{Cli, Commands};
use cli::handlers;
use config::AppConfig;
use db::migrations::run_migrations;
use session::Session;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = AppConfig::load().context("Loading config")?;

    // Ensure data directory exists and open DB
    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Opening database at {:?}", db_path))?;

    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    // Run migrations on every startup
    run_migrations(&conn)?;

    match cli.command {
        Some(Commands::Signin { name }) => handlers::handle_signin(&conn, &config, &name)?,
        Some(Commands::Signout) => handlers::handle_signout(&conn, &config)?,
        Some(Commands::Whoami) => handlers::handle_whoami(&conn, &config)?,
        Some(Commands::Profile { action }) => handlers::handle_profile(&mut config, &action)?,
        Some(Commands::Methods) => handlers::handle_methods(&config)?,
        Some(Commands::Cache { action }) => handlers::handle_cache(&conn, &config, &action)?,

        // Everything below needs a signed-in user
        Some(Commands::Times { date }) => {
            let session = Session::require(&conn, &config)?;
            handlers::handle_times(&conn, &config, &session, date.as_deref())?;
        }
        Some(Commands::Next) => {
            let session = Session::require(&conn, &config)?;
            handlers::handle_next(&conn, &config, &session)?;
        }

        // No subcommand → launch the dashboard
        None => {
            let session = Session::require(&conn, &config)?;
            tui::app::run(conn, config, session)?;
        }
    }

    Ok(())
}
