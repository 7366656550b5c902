//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the history database
//! - `load_config` - Resolve the insight config
//! - `load_dataset` - Read the CSV exports into a dataset
//! - `cmd_init` - Initialize the database
//! - `cmd_config` - Show the effective config

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use gramsales_core::config::default_config_path;
use gramsales_core::{db::Database, import, Dataset, InsightConfig};

use crate::cli::DataFiles;

pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

pub fn load_config(config_path: Option<&Path>) -> Result<InsightConfig> {
    InsightConfig::load(config_path).context("Failed to load insight config")
}

/// Open one CSV export and parse it, or return an empty table when not given
fn read_table<T>(
    path: Option<&Path>,
    what: &str,
    read: impl FnOnce(BufReader<File>) -> gramsales_core::Result<Vec<T>>,
) -> Result<Vec<T>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read(BufReader::new(file))
        .with_context(|| format!("Failed to import {} from {}", what, path.display()))
}

pub fn load_dataset(files: &DataFiles) -> Result<Dataset> {
    let posts = read_table(files.posts.as_deref(), "posts", import::read_posts)?;
    let sales = read_table(files.sales.as_deref(), "sales", import::read_sales)?;
    let leads = read_table(files.leads.as_deref(), "leads", import::read_leads)?;
    let stories = read_table(files.stories.as_deref(), "stories", import::read_stories)?;
    let costs = read_table(files.costs.as_deref(), "costs", import::read_costs)?;

    tracing::debug!(
        posts = posts.len(),
        sales = sales.len(),
        leads = leads.len(),
        stories = stories.len(),
        costs = costs.len(),
        "Loaded dataset"
    );

    Ok(Dataset::new(posts, sales, leads)
        .with_stories(stories)
        .with_costs(costs))
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path)?;

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Analyze: gramsales analyze --posts posts.csv --sales sales.csv --save");
    println!("  2. Review:  gramsales history show");

    Ok(())
}

pub fn cmd_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    let source = match config_path {
        Some(path) => path.display().to_string(),
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => path.display().to_string(),
            None => "built-in defaults".to_string(),
        },
    };

    println!("⚙️  Insight config ({})", source);
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}
