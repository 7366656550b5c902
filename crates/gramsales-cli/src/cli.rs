//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Gramsales - Turn Instagram activity into sales insights
#[derive(Parser)]
#[command(name = "gramsales")]
#[command(about = "Sales intelligence for Instagram-driven businesses", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Insight history database path
    #[arg(long, default_value = "gramsales.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Insight config file
    ///
    /// Defaults to ~/.local/share/gramsales/config/insights.toml when it
    /// exists, otherwise the built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// CSV exports to analyze; every table is optional
#[derive(Args, Debug, Default, Clone)]
pub struct DataFiles {
    /// Instagram posts CSV
    #[arg(long)]
    pub posts: Option<PathBuf>,

    /// Sales CSV
    #[arg(long)]
    pub sales: Option<PathBuf>,

    /// Leads CSV
    #[arg(long)]
    pub leads: Option<PathBuf>,

    /// Instagram stories CSV
    #[arg(long)]
    pub stories: Option<PathBuf>,

    /// Business costs CSV
    #[arg(long)]
    pub costs: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the insight history database
    Init,

    /// Run every insight analyzer and print ranked recommendations
    Analyze {
        #[command(flatten)]
        files: DataFiles,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Store the run in the history database
        #[arg(long)]
        save: bool,
    },

    /// Per-day posts, sales and leads
    Daily {
        #[command(flatten)]
        files: DataFiles,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Business summaries
    Summary {
        #[command(subcommand)]
        kind: SummaryKind,
    },

    /// Close leads that bought and add leads for unknown buyers
    Reconcile {
        #[command(flatten)]
        files: DataFiles,

        /// Print the updated lead list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Browse stored insight runs
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },

    /// Show the effective insight configuration
    Config,
}

#[derive(Subcommand)]
pub enum SummaryKind {
    /// Revenue, sellers and today's progress
    Sales {
        #[command(flatten)]
        files: DataFiles,

        /// Day to report as "today" (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Commissions per seller for one month
    Commissions {
        #[command(flatten)]
        files: DataFiles,

        /// Month (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Lead counts by status and origin
    Leads {
        #[command(flatten)]
        files: DataFiles,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Revenue, costs, profit and ROI
    Finance {
        #[command(flatten)]
        files: DataFiles,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List recent runs
    List {
        /// Number of runs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show the records of a run
    Show {
        /// Run ID (defaults to the latest run)
        id: Option<i64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
