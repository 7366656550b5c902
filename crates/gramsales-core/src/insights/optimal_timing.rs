//! Optimal Timing Insight
//!
//! Scores each hour of the day by mean engagement, mean viral score and how
//! quickly posts published at that hour turn into sales:
//!
//! `score = w_e * engagement + w_v * viral + w_c * normalized inverse conversion speed`
//!
//! Conversion speed is measured from sales that carry a `recorded_at`
//! timestamp: hours from publication to the first sale inside the
//! conversion window. A post with no sale in the window counts as the full
//! window. With no timestamped sales at all, the conversion component is 0.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde_json::json;

use crate::config::TimingConfig;
use crate::error::Result;
use crate::models::SaleRecord;
use crate::prepare::{normalize, require_columns, PostColumn, PreparedPost};
use crate::stats::{finite_or_zero, mean, round_to};

use super::engine::{AnalysisContext, Insight};
use super::types::{HourPerformance, InsightKind, InsightRecord, Priority, TimingData};

/// Hours from `published` to the first sale recorded within the window
///
/// Returns the full window when nothing sold in time.
pub fn hours_to_first_sale(
    published: NaiveDateTime,
    sale_times: &[NaiveDateTime],
    window_hours: f64,
) -> f64 {
    sale_times
        .iter()
        .map(|t| (*t - published).num_seconds() as f64 / 3600.0)
        .filter(|h| *h >= 0.0 && *h <= window_hours)
        .fold(window_hours, f64::min)
}

/// Per-hour performance, best and worst hours
///
/// Returns `None` when no post has both a timestamp and an engagement rate.
pub fn analyze_posting_times(
    posts: &[PreparedPost<'_>],
    sales: &[SaleRecord],
    config: &TimingConfig,
) -> Option<TimingData> {
    let sale_times: Vec<NaiveDateTime> = sales.iter().filter_map(|s| s.recorded_at).collect();
    let conversion_measured = !sale_times.is_empty();

    let mut by_hour: BTreeMap<u32, Vec<&PreparedPost<'_>>> = BTreeMap::new();
    for prepared in posts {
        if let (Some(hour), Some(_)) = (prepared.post.hour(), prepared.engagement_rate) {
            by_hour.entry(hour).or_default().push(prepared);
        }
    }
    if by_hour.is_empty() {
        return None;
    }

    let mut hours: Vec<HourPerformance> = by_hour
        .into_iter()
        .map(|(hour, group)| {
            let engagement: Vec<f64> = group.iter().filter_map(|p| p.engagement_rate).collect();
            let viral: Vec<f64> = group.iter().map(|p| p.viral_score).collect();
            let conversion_speed_hours = conversion_measured
                .then(|| {
                    let speeds: Vec<f64> = group
                        .iter()
                        .filter_map(|p| p.post.timestamp)
                        .map(|ts| {
                            hours_to_first_sale(ts, &sale_times, config.conversion_window_hours)
                        })
                        .collect();
                    mean(&speeds)
                })
                .flatten()
                .map(|h| round_to(h, 1));

            HourPerformance {
                hour,
                posts: group.len(),
                mean_engagement: round_to(mean(&engagement).unwrap_or(0.0), 2),
                mean_viral_score: round_to(mean(&viral).unwrap_or(0.0), 1),
                conversion_speed_hours,
                performance_score: 0.0,
            }
        })
        .collect();

    // Faster conversion scores higher
    let inverse_speed: Vec<f64> = hours
        .iter()
        .map(|h| {
            h.conversion_speed_hours
                .map(|s| config.conversion_window_hours - s)
                .unwrap_or(0.0)
        })
        .collect();
    let conversion_component = normalize(&inverse_speed);

    for (hour, conversion) in hours.iter_mut().zip(conversion_component) {
        let score = config.engagement_weight * hour.mean_engagement
            + config.viral_weight * hour.mean_viral_score
            + config.conversion_weight * conversion;
        hour.performance_score = round_to(finite_or_zero(score), 2);
    }

    let mut ranked: Vec<&HourPerformance> = hours.iter().collect();
    ranked.sort_by(|a, b| b.performance_score.total_cmp(&a.performance_score));

    let best_hours: Vec<u32> = ranked.iter().take(config.top_hours).map(|h| h.hour).collect();
    let worst_hours: Vec<u32> = ranked
        .iter()
        .rev()
        .take(config.top_hours)
        .map(|h| h.hour)
        .collect();
    let golden_hour = *best_hours.first()?;
    let fastest_conversion_hours = hours
        .iter()
        .filter_map(|h| h.conversion_speed_hours)
        .reduce(f64::min);

    hours.sort_by_key(|h| h.hour);

    Some(TimingData {
        hours,
        best_hours,
        worst_hours,
        golden_hour,
        conversion_measured,
        fastest_conversion_hours,
    })
}

fn format_hours(hours: &[u32]) -> String {
    hours
        .iter()
        .map(|h| format!("{:02}h", h))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Insight that recommends when to publish
pub struct OptimalTimingInsight;

impl OptimalTimingInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OptimalTimingInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Insight for OptimalTimingInsight {
    fn id(&self) -> InsightKind {
        InsightKind::OptimalTiming
    }

    fn name(&self) -> &'static str {
        "Optimal Posting Time"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<InsightRecord>> {
        require_columns(
            &ctx.dataset.posts,
            &[PostColumn::Timestamp, PostColumn::EngagementRate],
        )?;

        let Some(analysis) =
            analyze_posting_times(ctx.prepared_posts(), &ctx.dataset.sales, &ctx.config.timing)
        else {
            return Ok(vec![]);
        };

        let mut message = format!(
            "Best posting hours: {} (golden hour {:02}h); weakest: {}",
            format_hours(&analysis.best_hours),
            analysis.golden_hour,
            format_hours(&analysis.worst_hours)
        );
        if let Some(fastest) = analysis.fastest_conversion_hours {
            message.push_str(&format!(
                "; fastest path to a sale is {:.1}h after posting",
                fastest
            ));
        }

        let record = InsightRecord::new(
            self.id(),
            Priority::Medium,
            format!("Post Around {:02}h", analysis.golden_hour),
            message,
        )
        .with_action(format!(
            "Schedule your strongest content at {}",
            format_hours(&analysis.best_hours)
        ))
        .with_data(serde_json::to_value(&analysis).unwrap_or_else(|_| json!({})));

        Ok(vec![record])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InsightConfig;
    use crate::models::{Dataset, Post};
    use chrono::NaiveDate;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn post(at: &str, engagement: f64) -> Post {
        Post {
            id: at.to_string(),
            timestamp: Some(ts(at)),
            engagement_rate: Some(engagement),
            ..Default::default()
        }
    }

    fn timed_sale(at: &str) -> SaleRecord {
        let mut sale = SaleRecord::new(ts(at).date(), 100.0, "c");
        sale.recorded_at = Some(ts(at));
        sale
    }

    #[test]
    fn test_hours_to_first_sale() {
        let published = ts("2024-01-01 10:00");
        let sales = vec![
            ts("2024-01-01 09:00"),
            ts("2024-01-01 13:30"),
            ts("2024-01-01 12:00"),
        ];
        assert_eq!(hours_to_first_sale(published, &sales, 24.0), 2.0);
        assert_eq!(hours_to_first_sale(published, &[ts("2024-01-03 10:00")], 24.0), 24.0);
        assert_eq!(hours_to_first_sale(published, &[], 24.0), 24.0);
    }

    #[test]
    fn test_best_and_worst_hours_without_sales() {
        let dataset = Dataset::new(
            vec![
                post("2024-01-01 08:00", 1.0),
                post("2024-01-01 12:00", 5.0),
                post("2024-01-02 12:00", 7.0),
                post("2024-01-01 19:00", 9.0),
                post("2024-01-01 22:00", 3.0),
            ],
            vec![],
            vec![],
        );
        let config = InsightConfig::default();
        let ctx = AnalysisContext::new(&dataset, &config);

        let analysis =
            analyze_posting_times(ctx.prepared_posts(), &[], &config.timing).unwrap();
        assert!(!analysis.conversion_measured);
        assert!(analysis.hours.iter().all(|h| h.conversion_speed_hours.is_none()));
        assert_eq!(analysis.golden_hour, 19);
        assert_eq!(analysis.best_hours, vec![19, 12, 22]);
        assert_eq!(analysis.worst_hours, vec![8, 22, 12]);
        // hour 12 averages its two posts
        let noon = analysis.hours.iter().find(|h| h.hour == 12).unwrap();
        assert_eq!(noon.posts, 2);
        assert_eq!(noon.mean_engagement, 6.0);
    }

    #[test]
    fn test_fast_conversion_lifts_an_hour() {
        // equal engagement; only the 09h post is followed by a quick sale
        let dataset = Dataset::new(
            vec![post("2024-01-01 09:00", 4.0), post("2024-01-01 20:00", 4.0)],
            vec![timed_sale("2024-01-01 10:00")],
            vec![],
        );
        let config = InsightConfig::default();
        let ctx = AnalysisContext::new(&dataset, &config);

        let analysis =
            analyze_posting_times(ctx.prepared_posts(), &dataset.sales, &config.timing).unwrap();
        assert!(analysis.conversion_measured);
        assert_eq!(analysis.golden_hour, 9);
        assert_eq!(analysis.fastest_conversion_hours, Some(1.0));
        let evening = analysis.hours.iter().find(|h| h.hour == 20).unwrap();
        assert_eq!(evening.conversion_speed_hours, Some(24.0));
    }

    #[test]
    fn test_deterministic_across_runs() {
        let dataset = Dataset::new(
            vec![post("2024-01-01 09:00", 4.0), post("2024-01-01 20:00", 6.0)],
            vec![timed_sale("2024-01-01 21:00")],
            vec![],
        );
        let config = InsightConfig::default();
        let ctx = AnalysisContext::new(&dataset, &config);

        let first = analyze_posting_times(ctx.prepared_posts(), &dataset.sales, &config.timing);
        let second = analyze_posting_times(ctx.prepared_posts(), &dataset.sales, &config.timing);
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_top_hours_gives_no_analysis() {
        let dataset = Dataset::new(
            vec![post("2024-01-01 09:00", 4.0), post("2024-01-01 20:00", 6.0)],
            vec![],
            vec![],
        );
        let mut config = InsightConfig::default();
        config.timing.top_hours = 0;
        let ctx = AnalysisContext::new(&dataset, &config);

        assert!(analyze_posting_times(ctx.prepared_posts(), &[], &config.timing).is_none());
        let records = OptimalTimingInsight::new().analyze(&ctx).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_insight_record() {
        let dataset = Dataset::new(
            vec![post("2024-01-01 09:00", 4.0), post("2024-01-01 20:00", 6.0)],
            vec![SaleRecord::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 10.0, "c")],
            vec![],
        );
        let config = InsightConfig::default();
        let ctx = AnalysisContext::new(&dataset, &config);

        let records = OptimalTimingInsight::new().analyze(&ctx).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Post Around 20h");
        assert!(!records[0].simulated);
        assert_eq!(records[0].supporting_data["conversion_measured"], false);
    }
}
