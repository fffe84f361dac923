mod actions;
mod admin;
mod cli;
mod config;
mod db;
mod error;
mod listing;
mod notice;
mod operator;
mod params;
mod token;

use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Command};

use crate::config::Settings;
use crate::listing::{ListQuery, SortColumn, SortOrder, clamp_per_page};
use crate::operator::Operator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let settings_path = match cli.config {
        Some(path) => path,
        None => config::settings_path()?,
    };
    let settings = Settings::load(&settings_path)?;

    // Open database
    let db_path = settings.resolve_db_path()?;
    let db = db::Database::open(&db_path)?;
    tracing::debug!("Using database at {}", db_path.display());

    match cli.command {
        Command::Install => cli::install::install(&db)?,
        Command::Import { file } => cli::import::import(&db, &file)?,
        Command::List {
            search,
            orderby,
            order,
            page,
            per_page,
            status,
            json,
        } => {
            let query = ListQuery {
                page: page.max(1),
                per_page: clamp_per_page(per_page.unwrap_or(settings.default_per_page)),
                search: search.filter(|s| !s.trim().is_empty()),
                orderby: orderby.as_deref().and_then(SortColumn::parse),
                order: SortOrder::parse(&order),
                status: status.as_deref().and_then(|s| s.parse().ok()),
            };
            cli::submission::list_submissions(&db, query, json)?;
        }
        Command::Show { id } => cli::submission::show_submission(&db, id)?,
        Command::Delete { ids } => cli::delete::delete(&db, &Operator::local(), &ids)?,
        Command::Serve { bind } => {
            let bind = bind.unwrap_or(settings.bind);
            let state = admin::AppState::new(Arc::new(db), settings)?;
            admin::serve(state, bind).await?;
        }
    }

    Ok(())
}
