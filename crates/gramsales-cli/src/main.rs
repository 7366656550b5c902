//! Gramsales CLI - Instagram sales analytics
//!
//! Usage:
//!   gramsales analyze --posts posts.csv --sales sales.csv --leads leads.csv
//!   gramsales summary sales --sales sales.csv
//!   gramsales history show

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Analyze { files, json, save } => {
            let db_path = save.then_some(cli.db.as_path());
            commands::cmd_analyze(&files, config_path, db_path, json)
        }
        Commands::Daily { files, json } => commands::cmd_daily(&files, json),
        Commands::Summary { kind } => match kind {
            SummaryKind::Sales { files, today, json } => {
                commands::cmd_summary_sales(&files, config_path, today.as_deref(), json)
            }
            SummaryKind::Commissions { files, month, json } => {
                commands::cmd_summary_commissions(&files, config_path, month.as_deref(), json)
            }
            SummaryKind::Leads { files, json } => commands::cmd_summary_leads(&files, json),
            SummaryKind::Finance { files, json } => commands::cmd_summary_finance(&files, json),
        },
        Commands::Reconcile { files, json } => commands::cmd_reconcile(&files, json),
        Commands::History { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None => commands::cmd_history_list(&db, 10),
                Some(HistoryAction::List { limit }) => commands::cmd_history_list(&db, limit),
                Some(HistoryAction::Show { id, json }) => commands::cmd_history_show(&db, id, json),
            }
        }
        Commands::Config => commands::cmd_config(config_path),
    }
}
