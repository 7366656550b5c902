//! Saves-to-Sales Insight
//!
//! Checks whether days with a higher save rate are also days with more
//! sales: posts are grouped per day, inner-joined with daily sales, and the
//! Pearson coefficient between daily save rate and daily sales is reported.

use std::collections::HashMap;

use serde_json::json;

use crate::config::CorrelationConfig;
use crate::error::Result;
use crate::models::{Post, SaleRecord};
use crate::prepare::{daily_posts, daily_sales, has_column, PostColumn};
use crate::stats::{mean, pearson, round_to};

use super::engine::{AnalysisContext, Insight};
use super::types::{
    CorrelationStrength, InsightKind, InsightRecord, Priority, SaveSalesPoint, SavesToSalesData,
    TopSavedPost,
};

const TOP_SAVED_POSTS: usize = 5;

/// Correlate daily save rate with daily sales
///
/// Never fails: missing columns, empty tables and too few overlapping days
/// all produce a zero coefficient with an "insufficient data" message.
pub fn analyze_saves_to_sales(
    posts: &[Post],
    sales: &[SaleRecord],
    config: &CorrelationConfig,
) -> SavesToSalesData {
    if posts.is_empty() || sales.is_empty() {
        return insufficient(
            "Insufficient data for correlation analysis: posts or sales table is empty",
            0,
            Vec::new(),
            (0.0, 0.0),
        );
    }

    for column in [PostColumn::Timestamp, PostColumn::Saves, PostColumn::Reach] {
        if !has_column(posts, column) {
            return insufficient(
                &format!(
                    "Insufficient data for correlation analysis: posts have no {} column",
                    column.as_str()
                ),
                0,
                Vec::new(),
                (0.0, 0.0),
            );
        }
    }

    let days = daily_posts(posts);
    let rates: Vec<f64> = days.iter().filter_map(|d| d.save_rate).collect();
    let save_rate_stats = (
        rates.iter().copied().fold(0.0_f64, f64::max),
        mean(&rates).map(|m| round_to(m, 2)).unwrap_or(0.0),
    );

    let sales_by_day: HashMap<_, _> = daily_sales(sales)
        .into_iter()
        .map(|d| (d.date, d.total))
        .collect();

    let points: Vec<SaveSalesPoint> = days
        .iter()
        .filter_map(|day| {
            let save_rate = day.save_rate?;
            let sales_total = *sales_by_day.get(&day.date)?;
            Some(SaveSalesPoint {
                date: day.date,
                save_rate,
                sales_total,
            })
        })
        .collect();

    if points.len() < config.min_overlap_days {
        let overlap = points.len();
        return insufficient(
            &format!(
                "Insufficient data for analysis: {} overlapping day(s), at least {} needed",
                overlap, config.min_overlap_days
            ),
            overlap,
            points,
            save_rate_stats,
        );
    }

    let xs: Vec<f64> = points.iter().map(|p| p.save_rate).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.sales_total).collect();
    let correlation = round_to(pearson(&xs, &ys), 3);
    let strength = classify(correlation, config);

    let message = match strength {
        CorrelationStrength::Strong => format!(
            "Strong correlation: days with more saves bring more sales (r = {:.3})",
            correlation
        ),
        CorrelationStrength::Moderate => format!(
            "Moderate correlation: saves have some impact on sales (r = {:.3})",
            correlation
        ),
        _ => format!(
            "Weak or no correlation: saves do not directly drive sales (r = {:.3})",
            correlation
        ),
    };

    SavesToSalesData {
        correlation,
        strength,
        message,
        overlapping_days: points.len(),
        best_save_rate: save_rate_stats.0,
        avg_save_rate: save_rate_stats.1,
        points,
        top_saved_posts: top_saved_posts(posts),
    }
}

/// Map a coefficient to its strength band using fixed thresholds
pub fn classify(correlation: f64, config: &CorrelationConfig) -> CorrelationStrength {
    if correlation > config.strong_threshold {
        CorrelationStrength::Strong
    } else if correlation > config.moderate_threshold {
        CorrelationStrength::Moderate
    } else {
        CorrelationStrength::Weak
    }
}

fn insufficient(
    message: &str,
    overlapping_days: usize,
    points: Vec<SaveSalesPoint>,
    (best_save_rate, avg_save_rate): (f64, f64),
) -> SavesToSalesData {
    SavesToSalesData {
        correlation: 0.0,
        strength: CorrelationStrength::InsufficientData,
        message: message.to_string(),
        overlapping_days,
        best_save_rate,
        avg_save_rate,
        points,
        top_saved_posts: Vec::new(),
    }
}

fn top_saved_posts(posts: &[Post]) -> Vec<TopSavedPost> {
    let mut with_saves: Vec<&Post> = posts.iter().filter(|p| p.saves.is_some()).collect();
    with_saves.sort_by(|a, b| b.saves.cmp(&a.saves));
    with_saves
        .into_iter()
        .take(TOP_SAVED_POSTS)
        .map(|p| TopSavedPost {
            id: p.id.clone(),
            date: p.day(),
            saves: p.saves.unwrap_or(0),
            kind: p.kind,
            caption: p.caption.clone(),
        })
        .collect()
}

/// Insight that reports the saves-to-sales relationship
pub struct SavesCorrelationInsight;

impl SavesCorrelationInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SavesCorrelationInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Insight for SavesCorrelationInsight {
    fn id(&self) -> InsightKind {
        InsightKind::SavesCorrelation
    }

    fn name(&self) -> &'static str {
        "Saves to Sales"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<InsightRecord>> {
        let analysis = analyze_saves_to_sales(
            &ctx.dataset.posts,
            &ctx.dataset.sales,
            &ctx.config.correlation,
        );

        let (priority, title, action) = match analysis.strength {
            CorrelationStrength::Strong => (
                Priority::High,
                "Posts With Saves Drive Sales",
                format!(
                    "Focus on content that earns saves - your average daily save rate is {:.1}%",
                    analysis.avg_save_rate
                ),
            ),
            CorrelationStrength::Moderate => (
                Priority::Medium,
                "Saves Have Some Impact on Sales",
                format!(
                    "Test more save-worthy content (checklists, guides) - current save rate {:.1}%",
                    analysis.avg_save_rate
                ),
            ),
            CorrelationStrength::Weak => (
                Priority::Low,
                "Saves Are Not Driving Sales",
                "Look beyond saves for sales drivers: compare stories and direct messages"
                    .to_string(),
            ),
            CorrelationStrength::InsufficientData => (
                Priority::Low,
                "Not Enough Data for Saves vs Sales",
                format!(
                    "Keep logging posts and sales - at least {} overlapping days are needed",
                    ctx.config.correlation.min_overlap_days
                ),
            ),
        };

        let degraded = analysis.strength == CorrelationStrength::InsufficientData;
        let mut record = InsightRecord::new(self.id(), priority, title, analysis.message.clone())
            .with_action(action)
            .with_data(serde_json::to_value(&analysis).unwrap_or_else(|_| json!({})));
        if degraded {
            record = record.degraded();
        }

        Ok(vec![record])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InsightConfig;
    use crate::models::Dataset;
    use chrono::{NaiveDate, NaiveDateTime};

    fn post_on(day: &str, saves: u64, reach: u64) -> Post {
        Post {
            id: format!("p-{}", day),
            timestamp: Some(
                NaiveDateTime::parse_from_str(&format!("{} 12:00", day), "%Y-%m-%d %H:%M")
                    .unwrap(),
            ),
            saves: Some(saves),
            reach: Some(reach),
            ..Default::default()
        }
    }

    fn sale_on(day: &str, amount: f64) -> SaleRecord {
        SaleRecord::new(
            NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
            amount,
            "customer",
        )
    }

    #[test]
    fn test_perfect_positive_scenario() {
        let posts = vec![
            post_on("2024-01-01", 10, 100),
            post_on("2024-01-02", 50, 100),
            post_on("2024-01-03", 90, 100),
        ];
        let sales = vec![
            sale_on("2024-01-01", 100.0),
            sale_on("2024-01-02", 500.0),
            sale_on("2024-01-03", 900.0),
        ];

        let result = analyze_saves_to_sales(&posts, &sales, &CorrelationConfig::default());
        assert!((result.correlation - 1.0).abs() < 1e-9);
        assert_eq!(result.strength, CorrelationStrength::Strong);
        assert!(result.message.to_lowercase().contains("strong"));
        assert_eq!(result.overlapping_days, 3);
        assert_eq!(result.best_save_rate, 90.0);
        assert_eq!(result.avg_save_rate, 50.0);
        assert_eq!(result.top_saved_posts[0].saves, 90);
    }

    #[test]
    fn test_empty_posts_is_insufficient() {
        let sales = vec![sale_on("2024-01-01", 100.0)];
        let result = analyze_saves_to_sales(&[], &sales, &CorrelationConfig::default());
        assert_eq!(result.correlation, 0.0);
        assert_eq!(result.strength, CorrelationStrength::InsufficientData);
        assert!(result.message.to_lowercase().contains("insufficient data"));
    }

    #[test]
    fn test_fewer_than_three_overlapping_days() {
        let posts = vec![
            post_on("2024-01-01", 10, 100),
            post_on("2024-01-02", 50, 100),
            post_on("2024-01-03", 90, 100),
        ];
        // only two sale days overlap with post days
        let sales = vec![
            sale_on("2024-01-01", 100.0),
            sale_on("2024-01-02", 500.0),
            sale_on("2024-02-01", 900.0),
        ];

        let result = analyze_saves_to_sales(&posts, &sales, &CorrelationConfig::default());
        assert_eq!(result.correlation, 0.0);
        assert_eq!(result.overlapping_days, 2);
        assert!(result.message.to_lowercase().contains("insufficient data"));
    }

    #[test]
    fn test_zero_variance_normalizes_to_zero() {
        let posts = vec![
            post_on("2024-01-01", 10, 100),
            post_on("2024-01-02", 10, 100),
            post_on("2024-01-03", 10, 100),
        ];
        let sales = vec![
            sale_on("2024-01-01", 100.0),
            sale_on("2024-01-02", 500.0),
            sale_on("2024-01-03", 900.0),
        ];

        let result = analyze_saves_to_sales(&posts, &sales, &CorrelationConfig::default());
        assert_eq!(result.correlation, 0.0);
        assert_eq!(result.strength, CorrelationStrength::Weak);
    }

    #[test]
    fn test_missing_reach_column_is_insufficient() {
        let mut posts = vec![
            post_on("2024-01-01", 10, 100),
            post_on("2024-01-02", 50, 100),
            post_on("2024-01-03", 90, 100),
        ];
        for p in &mut posts {
            p.reach = None;
        }
        let sales = vec![sale_on("2024-01-01", 100.0)];

        let result = analyze_saves_to_sales(&posts, &sales, &CorrelationConfig::default());
        assert_eq!(result.strength, CorrelationStrength::InsufficientData);
        assert!(result.message.contains("reach"));
    }

    #[test]
    fn test_classify_bands() {
        let config = CorrelationConfig::default();
        assert_eq!(classify(0.61, &config), CorrelationStrength::Strong);
        assert_eq!(classify(0.6, &config), CorrelationStrength::Moderate);
        assert_eq!(classify(0.45, &config), CorrelationStrength::Moderate);
        assert_eq!(classify(0.3, &config), CorrelationStrength::Weak);
        assert_eq!(classify(-0.9, &config), CorrelationStrength::Weak);
    }

    #[test]
    fn test_insight_priority_follows_strength() {
        let posts = vec![
            post_on("2024-01-01", 10, 100),
            post_on("2024-01-02", 50, 100),
            post_on("2024-01-03", 90, 100),
        ];
        let sales = vec![
            sale_on("2024-01-01", 100.0),
            sale_on("2024-01-02", 500.0),
            sale_on("2024-01-03", 900.0),
        ];
        let dataset = Dataset::new(posts, sales, vec![]);
        let config = InsightConfig::default();
        let ctx = AnalysisContext::new(&dataset, &config);

        let records = SavesCorrelationInsight::new().analyze(&ctx).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].priority, Priority::High);
        assert!(!records[0].degraded);
        assert!(!records[0].simulated);
        assert_eq!(records[0].supporting_data["strength"], "strong");
    }

    #[test]
    fn test_insight_degraded_on_empty_dataset() {
        let dataset = Dataset::default();
        let config = InsightConfig::default();
        let ctx = AnalysisContext::new(&dataset, &config);

        let records = SavesCorrelationInsight::new().analyze(&ctx).unwrap();
        assert_eq!(records[0].priority, Priority::Low);
        assert!(records[0].degraded);
        assert_eq!(records[0].supporting_data["correlation"], 0.0);
    }
}
