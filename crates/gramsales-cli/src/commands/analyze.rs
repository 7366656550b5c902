//! Insight engine commands

use std::path::Path;

use anyhow::{Context, Result};
use gramsales_core::insights::{InsightEngine, InsightRecord, Priority};
use gramsales_core::prepare::daily_aggregates;

use super::{load_config, load_dataset, open_db, truncate};
use crate::cli::DataFiles;

pub(crate) fn priority_icon(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "🔴",
        Priority::Medium => "🟡",
        Priority::Low => "🟢",
    }
}

/// Print ranked records as a numbered list
pub(crate) fn print_records(records: &[InsightRecord]) {
    if records.is_empty() {
        println!("   No insights for this data. Add more posts, sales or leads.");
        return;
    }

    for (i, record) in records.iter().enumerate() {
        let mut flags = Vec::new();
        if record.simulated {
            flags.push("estimate");
        }
        if record.degraded {
            flags.push("insufficient data");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", flags.join(", "))
        };

        println!(
            "{:>3}. {} [{}] {}{}",
            i + 1,
            priority_icon(record.priority),
            record.kind,
            record.title,
            flags
        );
        println!("       {}", record.message);
        if !record.recommended_action.is_empty() {
            println!("       👉 {}", record.recommended_action);
        }
        println!();
    }
}

/// Run the insight engine over the given exports
///
/// With `db_path` set the run is also stored in the history database.
pub fn cmd_analyze(
    files: &DataFiles,
    config_path: Option<&Path>,
    db_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let dataset = load_dataset(files)?;

    let engine = InsightEngine::new();
    let records = engine.analyze(&dataset, &config);

    let run_id = match db_path {
        Some(path) => {
            let db = open_db(path)?;
            Some(db.save_run(&records).context("Failed to save insight run")?)
        }
        None => None,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!(
        "🔍 Analyzed {} posts, {} sales, {} leads",
        dataset.posts.len(),
        dataset.sales.len(),
        dataset.leads.len()
    );
    println!();
    print_records(&records);

    if let Some(id) = run_id {
        println!("💾 Saved as run #{}. View later with 'gramsales history show {}'", id, id);
    }

    Ok(())
}

/// Print posts, sales and leads merged per day
pub fn cmd_daily(files: &DataFiles, json: bool) -> Result<()> {
    let dataset = load_dataset(files)?;
    let days = daily_aggregates(&dataset);

    if json {
        println!("{}", serde_json::to_string_pretty(&days)?);
        return Ok(());
    }

    if days.is_empty() {
        println!("No activity found.");
        return Ok(());
    }

    println!("📅 Daily activity");
    println!();
    println!(
        "{:<12} {:>6} {:>8} {:>10} {:>10} {:>12} {:>7}",
        "Date", "Posts", "Saves", "Save %", "Sales", "Revenue", "Leads"
    );
    println!("{}", "─".repeat(71));

    for day in &days {
        let save_rate = day
            .save_rate
            .map(|r| format!("{:.2}%", r))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:>6} {:>8} {:>10} {:>10} {:>12.2} {:>7}",
            day.date.to_string(),
            day.posts,
            day.saves,
            truncate(&save_rate, 10),
            day.sales_count,
            day.sales_total,
            day.leads
        );
    }

    Ok(())
}
