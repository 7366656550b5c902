//! Business summaries: sales, commissions, lead funnel and finances
//!
//! Only confirmed sales count as revenue. Sales from a source without a
//! status column are treated as confirmed.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::config::InsightConfig;
use crate::models::{CostRecord, LeadRecord, LeadStatus, SaleRecord};
use crate::stats::{mean, percent, ratio, round_to};

/// Seller label for sales that carry no seller
pub const UNASSIGNED_SELLER: &str = "unassigned";

/// Revenue and commission of one seller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerSummary {
    pub seller: String,
    /// From the team config, falls back to the raw seller name
    pub display_name: String,
    pub total: f64,
    pub count: usize,
    pub commission: f64,
    pub monthly_goal: Option<f64>,
    /// Percent of the monthly goal reached
    pub goal_progress: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSummary {
    pub confirmed_revenue: f64,
    pub confirmed_count: usize,
    pub average_ticket: f64,
    /// Highest revenue first
    pub sellers: Vec<SellerSummary>,
    pub today_revenue: f64,
    /// Company monthly goal / 30
    pub daily_goal: f64,
    pub daily_goal_progress: f64,
}

/// Commission owed for one sale
pub fn sale_commission(sale: &SaleRecord, config: &InsightConfig) -> f64 {
    sale.amount
        * sale
            .commission_rate
            .unwrap_or(config.business.default_commission_rate)
}

/// Team login when the seller matches a profile, else the trimmed raw name
fn seller_key(sale: &SaleRecord, config: &InsightConfig) -> String {
    let Some(seller) = sale.seller.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return UNASSIGNED_SELLER.to_string();
    };
    config
        .team_entry(seller)
        .map(|(login, _)| login)
        .unwrap_or(seller)
        .to_string()
}

fn per_seller<'a>(
    sales: impl Iterator<Item = &'a SaleRecord>,
    config: &InsightConfig,
) -> BTreeMap<String, (f64, usize, f64)> {
    let mut by_seller: BTreeMap<String, (f64, usize, f64)> = BTreeMap::new();
    for sale in sales {
        let entry = by_seller.entry(seller_key(sale, config)).or_insert((0.0, 0, 0.0));
        entry.0 += sale.amount;
        entry.1 += 1;
        entry.2 += sale_commission(sale, config);
    }
    by_seller
}

/// Overview of confirmed sales, per seller and for `today`
pub fn sales_summary(
    sales: &[SaleRecord],
    config: &InsightConfig,
    today: NaiveDate,
) -> SalesSummary {
    let confirmed: Vec<&SaleRecord> = sales.iter().filter(|s| s.is_confirmed()).collect();
    let confirmed_revenue: f64 = confirmed.iter().map(|s| s.amount).sum();

    let mut sellers: Vec<SellerSummary> = per_seller(confirmed.iter().copied(), config)
        .into_iter()
        .map(|(seller, (total, count, commission))| {
            let member = config.team_member(&seller);
            let monthly_goal = member.and_then(|m| m.monthly_goal);
            SellerSummary {
                display_name: member
                    .map(|m| m.display_name.clone())
                    .unwrap_or_else(|| seller.clone()),
                seller,
                total: round_to(total, 2),
                count,
                commission: round_to(commission, 2),
                monthly_goal,
                goal_progress: monthly_goal.map(|goal| round_to(percent(total, goal), 1)),
            }
        })
        .collect();
    sellers.sort_by(|a, b| b.total.total_cmp(&a.total));

    let today_revenue: f64 = confirmed
        .iter()
        .filter(|s| s.date == today)
        .map(|s| s.amount)
        .sum();
    let daily_goal = config.business.monthly_goal / 30.0;

    SalesSummary {
        confirmed_revenue: round_to(confirmed_revenue, 2),
        confirmed_count: confirmed.len(),
        average_ticket: round_to(ratio(confirmed_revenue, confirmed.len() as f64), 2),
        sellers,
        today_revenue: round_to(today_revenue, 2),
        daily_goal: round_to(daily_goal, 2),
        daily_goal_progress: round_to(percent(today_revenue, daily_goal), 1),
    }
}

/// Commission owed to one seller for a month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerCommission {
    pub seller: String,
    pub total: f64,
    pub count: usize,
    pub commission: f64,
}

/// Confirmed sales of `year`-`month` grouped by seller, highest commission first
pub fn monthly_commissions(
    sales: &[SaleRecord],
    year: i32,
    month: u32,
    config: &InsightConfig,
) -> Vec<SellerCommission> {
    let in_month = sales
        .iter()
        .filter(|s| s.is_confirmed() && s.date.year() == year && s.date.month() == month);

    let mut commissions: Vec<SellerCommission> = per_seller(in_month, config)
        .into_iter()
        .map(|(seller, (total, count, commission))| SellerCommission {
            seller,
            total: round_to(total, 2),
            count,
            commission: round_to(commission, 2),
        })
        .collect();
    commissions.sort_by(|a, b| b.commission.total_cmp(&a.commission));
    commissions
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadFunnel {
    pub total: usize,
    /// Every status in funnel order, zero counts included
    pub by_status: Vec<(LeadStatus, usize)>,
    pub by_origin: BTreeMap<String, usize>,
    /// Closed leads as a percent of all leads
    pub conversion_rate: f64,
    pub average_score: Option<f64>,
}

pub fn lead_funnel(leads: &[LeadRecord]) -> LeadFunnel {
    let by_status = LeadStatus::all()
        .iter()
        .map(|status| (*status, leads.iter().filter(|l| l.status == *status).count()))
        .collect();

    let mut by_origin: BTreeMap<String, usize> = BTreeMap::new();
    for lead in leads {
        *by_origin.entry(lead.origin.as_str().to_string()).or_default() += 1;
    }

    let closed = leads.iter().filter(|l| l.status == LeadStatus::Closed).count();
    let scores: Vec<f64> = leads.iter().filter_map(|l| l.score).map(f64::from).collect();

    LeadFunnel {
        total: leads.len(),
        by_status,
        by_origin,
        conversion_rate: round_to(percent(closed as f64, leads.len() as f64), 1),
        average_score: mean(&scores).map(|s| round_to(s, 1)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCost {
    pub category: String,
    pub amount: f64,
    /// Percent of total cost
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub revenue: f64,
    pub total_cost: f64,
    pub net_profit: f64,
    /// Profit as a percent of cost (0 without costs)
    pub roi: f64,
    /// Profit as a percent of revenue (0 without revenue)
    pub margin: f64,
    /// Largest category first
    pub by_category: Vec<CategoryCost>,
}

pub fn financial_summary(sales: &[SaleRecord], costs: &[CostRecord]) -> FinancialSummary {
    let revenue: f64 = sales.iter().filter(|s| s.is_confirmed()).map(|s| s.amount).sum();
    let total_cost: f64 = costs.iter().map(|c| c.amount).sum();
    let net_profit = revenue - total_cost;

    let mut by_category: BTreeMap<&str, f64> = BTreeMap::new();
    for cost in costs {
        *by_category.entry(cost.category.as_str()).or_default() += cost.amount;
    }
    let mut by_category: Vec<CategoryCost> = by_category
        .into_iter()
        .map(|(category, amount)| CategoryCost {
            category: category.to_string(),
            amount: round_to(amount, 2),
            share: round_to(percent(amount, total_cost), 1),
        })
        .collect();
    by_category.sort_by(|a, b| b.amount.total_cmp(&a.amount));

    FinancialSummary {
        revenue: round_to(revenue, 2),
        total_cost: round_to(total_cost, 2),
        net_profit: round_to(net_profit, 2),
        roi: round_to(percent(net_profit, total_cost), 1),
        margin: round_to(percent(net_profit, revenue), 1),
        by_category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LeadOrigin, SaleStatus};
    use chrono::NaiveDateTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(day: NaiveDate, amount: f64, seller: Option<&str>) -> SaleRecord {
        let mut sale = SaleRecord::new(day, amount, "customer");
        sale.seller = seller.map(String::from);
        sale
    }

    fn cost(category: &str, amount: f64) -> CostRecord {
        CostRecord {
            date: date(2024, 3, 1),
            description: format!("{} cost", category),
            category: category.to_string(),
            amount,
            recurring: false,
        }
    }

    #[test]
    fn test_sales_summary() {
        let config = InsightConfig::embedded().unwrap();
        let today = date(2024, 3, 10);
        let mut cancelled = sale(today, 5000.0, Some("ana"));
        cancelled.status = Some(SaleStatus::Cancelled);
        let mut custom_rate = sale(date(2024, 3, 2), 1000.0, Some("fernando"));
        custom_rate.commission_rate = Some(0.1);

        let sales = vec![
            sale(today, 2000.0, Some("ana")),
            sale(date(2024, 3, 1), 3000.0, Some("Ana")),
            custom_rate,
            sale(today, 500.0, None),
            cancelled,
        ];

        let summary = sales_summary(&sales, &config, today);
        assert_eq!(summary.confirmed_revenue, 6500.0);
        assert_eq!(summary.confirmed_count, 4);
        assert_eq!(summary.average_ticket, 1625.0);
        assert_eq!(summary.today_revenue, 2500.0);
        assert_eq!(summary.daily_goal, 3333.33);
        assert_eq!(summary.daily_goal_progress, 75.0);

        // "ana" and "Ana" both resolve to the same team login
        assert_eq!(summary.sellers.len(), 3);
        let ana = &summary.sellers[0];
        assert_eq!(ana.seller, "ana");
        assert_eq!(ana.display_name, "Ana");
        assert_eq!(ana.count, 2);
        assert_eq!(ana.total, 5000.0);
        assert_eq!(ana.goal_progress, Some(10.0));

        let fernando = summary
            .sellers
            .iter()
            .find(|s| s.seller == "fernando")
            .unwrap();
        assert_eq!(fernando.commission, 100.0);
        assert_eq!(fernando.goal_progress, Some(2.0));

        let unassigned = summary
            .sellers
            .iter()
            .find(|s| s.seller == UNASSIGNED_SELLER)
            .unwrap();
        assert_eq!(unassigned.commission, 150.0);
        assert_eq!(unassigned.monthly_goal, None);
    }

    #[test]
    fn test_sales_summary_empty() {
        let config = InsightConfig::default();
        let summary = sales_summary(&[], &config, date(2024, 1, 1));
        assert_eq!(summary.confirmed_revenue, 0.0);
        assert_eq!(summary.average_ticket, 0.0);
        assert!(summary.sellers.is_empty());
    }

    #[test]
    fn test_monthly_commissions() {
        let config = InsightConfig::default();
        let sales = vec![
            sale(date(2024, 3, 1), 1000.0, Some("ana")),
            sale(date(2024, 3, 31), 1000.0, Some("ana")),
            sale(date(2024, 4, 1), 9000.0, Some("ana")),
            sale(date(2024, 3, 15), 500.0, Some("fernando")),
        ];

        let commissions = monthly_commissions(&sales, 2024, 3, &config);
        assert_eq!(commissions.len(), 2);
        assert_eq!(commissions[0].seller, "ana");
        assert_eq!(commissions[0].count, 2);
        assert_eq!(commissions[0].total, 2000.0);
        assert_eq!(commissions[0].commission, 600.0);
        assert_eq!(commissions[1].commission, 150.0);
    }

    #[test]
    fn test_lead_funnel() {
        let at = NaiveDateTime::parse_from_str("2024-03-01 10:00", "%Y-%m-%d %H:%M").unwrap();
        let mut leads = vec![
            LeadRecord::new(at, "a", LeadOrigin::Instagram, LeadStatus::Closed),
            LeadRecord::new(at, "b", LeadOrigin::Instagram, LeadStatus::New),
            LeadRecord::new(at, "c", LeadOrigin::WhatsApp, LeadStatus::Lost),
            LeadRecord::new(at, "d", LeadOrigin::Referral, LeadStatus::Closed),
        ];
        leads[0].score = Some(9);
        leads[1].score = Some(4);

        let funnel = lead_funnel(&leads);
        assert_eq!(funnel.total, 4);
        assert_eq!(funnel.conversion_rate, 50.0);
        assert_eq!(funnel.average_score, Some(6.5));
        assert_eq!(funnel.by_origin["instagram"], 2);
        assert_eq!(funnel.by_status.len(), LeadStatus::all().len());
        assert_eq!(funnel.by_status[4], (LeadStatus::Closed, 2));
        assert_eq!(funnel.by_status[2], (LeadStatus::Interested, 0));
    }

    #[test]
    fn test_lead_funnel_empty() {
        let funnel = lead_funnel(&[]);
        assert_eq!(funnel.conversion_rate, 0.0);
        assert_eq!(funnel.average_score, None);
    }

    #[test]
    fn test_financial_summary() {
        let sales = vec![sale(date(2024, 3, 1), 10_000.0, None)];
        let costs = vec![cost("ads", 3000.0), cost("tools", 1000.0), cost("ads", 1000.0)];

        let summary = financial_summary(&sales, &costs);
        assert_eq!(summary.revenue, 10_000.0);
        assert_eq!(summary.total_cost, 5000.0);
        assert_eq!(summary.net_profit, 5000.0);
        assert_eq!(summary.roi, 100.0);
        assert_eq!(summary.margin, 50.0);
        assert_eq!(summary.by_category[0].category, "ads");
        assert_eq!(summary.by_category[0].share, 80.0);
        assert_eq!(summary.by_category[1].share, 20.0);
    }

    #[test]
    fn test_financial_summary_without_costs_or_revenue() {
        let summary = financial_summary(&[], &[]);
        assert_eq!(summary.roi, 0.0);
        assert_eq!(summary.margin, 0.0);

        let summary = financial_summary(&[], &[cost("ads", 100.0)]);
        assert_eq!(summary.net_profit, -100.0);
        assert_eq!(summary.roi, -100.0);
        assert_eq!(summary.margin, 0.0);
    }
}
