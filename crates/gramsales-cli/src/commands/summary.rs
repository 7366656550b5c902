//! Business summary commands

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use gramsales_core::reports;

use super::{load_config, load_dataset, truncate};
use crate::cli::DataFiles;

/// Parse "YYYY-MM" into (year, month); defaults to the current month
pub fn resolve_month(month: Option<&str>) -> Result<(i32, u32)> {
    match month {
        Some(m) => {
            let first = NaiveDate::parse_from_str(&format!("{}-01", m), "%Y-%m-%d")
                .context("Invalid --month format (use YYYY-MM)")?;
            Ok((first.year(), first.month()))
        }
        None => {
            let today = Utc::now().date_naive();
            Ok((today.year(), today.month()))
        }
    }
}

fn resolve_today(today: Option<&str>) -> Result<NaiveDate> {
    match today {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .context("Invalid --today date format (use YYYY-MM-DD)"),
        None => Ok(Utc::now().date_naive()),
    }
}

pub fn cmd_summary_sales(
    files: &DataFiles,
    config_path: Option<&Path>,
    today: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let dataset = load_dataset(files)?;
    let today = resolve_today(today)?;

    let summary = reports::sales_summary(&dataset.sales, &config, today);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("💰 Sales Summary");
    println!("   ─────────────────────────────");
    println!("   Confirmed revenue: {:>12.2}", summary.confirmed_revenue);
    println!("   Confirmed sales:   {:>12}", summary.confirmed_count);
    println!("   Average ticket:    {:>12.2}", summary.average_ticket);
    println!();
    println!(
        "   📆 {}: {:.2} of {:.2} daily goal ({:.1}%)",
        today, summary.today_revenue, summary.daily_goal, summary.daily_goal_progress
    );

    if !summary.sellers.is_empty() {
        println!();
        println!(
            "   {:<20} {:>6} {:>12} {:>12} {:>8}",
            "Seller", "Sales", "Revenue", "Commission", "Goal"
        );
        for seller in &summary.sellers {
            let goal = seller
                .goal_progress
                .map(|p| format!("{:.1}%", p))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "   {:<20} {:>6} {:>12.2} {:>12.2} {:>8}",
                truncate(&seller.display_name, 20),
                seller.count,
                seller.total,
                seller.commission,
                goal
            );
        }
    }

    Ok(())
}

pub fn cmd_summary_commissions(
    files: &DataFiles,
    config_path: Option<&Path>,
    month: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let dataset = load_dataset(files)?;
    let (year, month) = resolve_month(month)?;

    let commissions = reports::monthly_commissions(&dataset.sales, year, month, &config);

    if json {
        println!("{}", serde_json::to_string_pretty(&commissions)?);
        return Ok(());
    }

    println!("🧾 Commissions for {}-{:02}", year, month);
    println!();

    if commissions.is_empty() {
        println!("   No confirmed sales this month.");
        return Ok(());
    }

    println!(
        "   {:<20} {:>6} {:>12} {:>12}",
        "Seller", "Sales", "Revenue", "Commission"
    );
    for c in &commissions {
        println!(
            "   {:<20} {:>6} {:>12.2} {:>12.2}",
            truncate(&c.seller, 20),
            c.count,
            c.total,
            c.commission
        );
    }
    let total: f64 = commissions.iter().map(|c| c.commission).sum();
    println!();
    println!("   Total commission: {:.2}", total);

    Ok(())
}

pub fn cmd_summary_leads(files: &DataFiles, json: bool) -> Result<()> {
    let dataset = load_dataset(files)?;
    let funnel = reports::lead_funnel(&dataset.leads);

    if json {
        println!("{}", serde_json::to_string_pretty(&funnel)?);
        return Ok(());
    }

    println!("🎯 Lead Funnel ({} leads)", funnel.total);
    println!("   ─────────────────────────────");
    for (status, count) in &funnel.by_status {
        println!("   {:<14} {:>6}", status.as_str(), count);
    }
    println!();
    println!("   By origin:");
    for (origin, count) in &funnel.by_origin {
        println!("   {:<14} {:>6}", origin, count);
    }
    println!();
    println!("   Conversion rate: {:.1}%", funnel.conversion_rate);
    if let Some(score) = funnel.average_score {
        println!("   Average score:   {:.1}", score);
    }

    Ok(())
}

pub fn cmd_summary_finance(files: &DataFiles, json: bool) -> Result<()> {
    let dataset = load_dataset(files)?;
    let summary = reports::financial_summary(&dataset.sales, &dataset.costs);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let icon = if summary.net_profit >= 0.0 { "📈" } else { "📉" };

    println!("{} Financial Summary", icon);
    println!("   ─────────────────────────────");
    println!("   Revenue:    {:>12.2}", summary.revenue);
    println!("   Costs:      {:>12.2}", summary.total_cost);
    println!("   Net profit: {:>12.2}", summary.net_profit);
    println!("   ROI:        {:>11.1}%", summary.roi);
    println!("   Margin:     {:>11.1}%", summary.margin);

    if !summary.by_category.is_empty() {
        println!();
        println!("   Costs by category:");
        for category in &summary.by_category {
            println!(
                "   {:<20} {:>12.2} {:>6.1}%",
                truncate(&category.category, 20),
                category.amount,
                category.share
            );
        }
    }

    Ok(())
}
