//! Insight history commands

use anyhow::Result;
use gramsales_core::db::Database;

use super::analyze::print_records;

pub fn cmd_history_list(db: &Database, limit: usize) -> Result<()> {
    let runs = db.list_runs(limit)?;

    if runs.is_empty() {
        println!("No stored runs. Use 'gramsales analyze --save' to record one.");
        return Ok(());
    }

    println!("📚 Insight runs");
    println!();
    println!("{:>6}  {:<20} {:>8} {:>6}", "ID", "Generated", "Insights", "High");
    println!("{}", "─".repeat(44));
    for run in &runs {
        println!(
            "{:>6}  {:<20} {:>8} {:>6}",
            run.id,
            run.generated_at.format("%Y-%m-%d %H:%M"),
            run.record_count,
            run.high_priority
        );
    }

    Ok(())
}

/// Show one run, or the latest when no id is given
pub fn cmd_history_show(db: &Database, id: Option<i64>, json: bool) -> Result<()> {
    let stored = match id {
        Some(id) => db.get_run(id)?,
        None => db.latest_run()?,
    };

    let Some(stored) = stored else {
        match id {
            Some(id) => anyhow::bail!("Run {} not found", id),
            None => {
                println!("No stored runs. Use 'gramsales analyze --save' to record one.");
                return Ok(());
            }
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stored)?);
        return Ok(());
    }

    println!(
        "📋 Run #{} ({})",
        stored.run.id,
        stored.run.generated_at.format("%Y-%m-%d %H:%M")
    );
    println!();
    print_records(&stored.records);

    Ok(())
}
