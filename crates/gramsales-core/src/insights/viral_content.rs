//! Viral Content Insight
//!
//! Estimates the funnel impact of posts above the viral threshold. The
//! figures come from fixed multipliers in the funnel config, not from
//! measured follower, lead or sale data, so every record is marked
//! simulated.

use serde_json::json;

use crate::config::FunnelConfig;
use crate::error::Result;
use crate::prepare::PreparedPost;
use crate::stats::round_to;

use super::engine::{AnalysisContext, Insight};
use super::types::{InsightKind, InsightRecord, Priority, ViralFunnelData, ViralPostImpact};

const CAPTION_PREVIEW_CHARS: usize = 50;

/// Estimated follower gain, leads and sales for one viral score
///
/// Each stage truncates to whole units before feeding the next.
pub fn estimate_funnel(viral_score: f64, config: &FunnelConfig) -> (u64, u64, u64) {
    let follower_gain = (viral_score * config.followers_per_viral_point).max(0.0) as u64;
    let leads = (follower_gain as f64 * config.lead_rate) as u64;
    let sales = (leads as f64 * config.sale_rate) as u64;
    (follower_gain, leads, sales)
}

/// Funnel estimate over every post whose viral score exceeds the threshold
pub fn analyze_viral_funnel(posts: &[PreparedPost<'_>], config: &FunnelConfig) -> ViralFunnelData {
    let impacts: Vec<ViralPostImpact> = posts
        .iter()
        .filter(|p| p.viral_score > config.viral_threshold)
        .map(|p| {
            let (follower_gain, leads, sales) = estimate_funnel(p.viral_score, config);
            ViralPostImpact {
                id: p.post.id.clone(),
                date: p.post.day(),
                viral_score: p.viral_score,
                caption_preview: p
                    .post
                    .caption
                    .as_ref()
                    .map(|c| c.chars().take(CAPTION_PREVIEW_CHARS).collect()),
                follower_gain,
                leads,
                sales,
                revenue: round_to(sales as f64 * config.average_ticket, 2),
            }
        })
        .collect();

    ViralFunnelData {
        viral_posts: impacts.len(),
        total_follower_gain: impacts.iter().map(|i| i.follower_gain).sum(),
        total_leads: impacts.iter().map(|i| i.leads).sum(),
        total_sales: impacts.iter().map(|i| i.sales).sum(),
        total_revenue: round_to(impacts.iter().map(|i| i.revenue).sum(), 2),
        posts: impacts,
        estimated: true,
    }
}

/// Insight that estimates what viral posts are worth
pub struct ViralContentInsight;

impl ViralContentInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ViralContentInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Insight for ViralContentInsight {
    fn id(&self) -> InsightKind {
        InsightKind::ViralContent
    }

    fn name(&self) -> &'static str {
        "Viral Content Funnel"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<InsightRecord>> {
        let funnel = &ctx.config.funnel;
        let analysis = analyze_viral_funnel(ctx.prepared_posts(), funnel);
        if analysis.viral_posts == 0 {
            return Ok(vec![]);
        }

        let priority = if analysis.total_sales > 0 {
            Priority::High
        } else {
            Priority::Medium
        };

        let record = InsightRecord::new(
            self.id(),
            priority,
            format!("{} Viral Post(s) Worth Repeating", analysis.viral_posts),
            format!(
                "Estimated impact: +{} followers, {} leads, {} sales (~{:.2} in revenue)",
                analysis.total_follower_gain,
                analysis.total_leads,
                analysis.total_sales,
                analysis.total_revenue
            ),
        )
        .with_action(format!(
            "Reuse the format of posts scoring above {:.0} - hooks, length and topic",
            funnel.viral_threshold
        ))
        .with_data(serde_json::to_value(&analysis).unwrap_or_else(|_| json!({})))
        .simulated();

        Ok(vec![record])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InsightConfig;
    use crate::models::{Dataset, Post};

    fn post(id: &str, reach: u64, saves: u64, comments: u64, likes: u64) -> Post {
        Post {
            id: id.to_string(),
            reach: Some(reach),
            saves: Some(saves),
            comments: Some(comments),
            likes: Some(likes),
            caption: Some(format!("Caption for {}", id)),
            ..Default::default()
        }
    }

    #[test]
    fn test_estimate_funnel_truncates() {
        let config = FunnelConfig::default();
        assert_eq!(estimate_funnel(100.0, &config), (250, 7, 1));
        assert_eq!(estimate_funnel(80.0, &config), (200, 6, 0));
        assert_eq!(estimate_funnel(0.0, &config), (0, 0, 0));
    }

    #[test]
    fn test_only_posts_above_threshold_count() {
        let dataset = Dataset::new(
            vec![post("top", 1000, 100, 50, 200), post("weak", 100, 1, 1, 2)],
            vec![],
            vec![],
        );
        let config = InsightConfig::default();
        let ctx = AnalysisContext::new(&dataset, &config);

        let analysis = analyze_viral_funnel(ctx.prepared_posts(), &config.funnel);
        assert_eq!(analysis.viral_posts, 1);
        assert_eq!(analysis.posts[0].id, "top");
        assert_eq!(analysis.total_sales, 1);
        assert_eq!(analysis.total_revenue, 1997.0);
        assert!(analysis.estimated);
    }

    #[test]
    fn test_record_is_simulated() {
        let dataset = Dataset::new(vec![post("top", 1000, 100, 50, 200)], vec![], vec![]);
        let config = InsightConfig::default();
        let ctx = AnalysisContext::new(&dataset, &config);

        let records = ViralContentInsight::new().analyze(&ctx).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].simulated);
        assert_eq!(records[0].priority, Priority::High);
    }

    #[test]
    fn test_neutral_scores_are_not_viral() {
        // without engagement data every post scores the neutral 50
        let dataset = Dataset::new(
            vec![Post {
                id: "x".into(),
                reach: Some(1000),
                ..Default::default()
            }],
            vec![],
            vec![],
        );
        let config = InsightConfig::default();
        let ctx = AnalysisContext::new(&dataset, &config);

        assert!(ViralContentInsight::new().analyze(&ctx).unwrap().is_empty());
    }
}
