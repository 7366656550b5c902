//! Content Type Insight
//!
//! Compares mean engagement across post kinds (photos, videos/reels,
//! carousels) and recommends the winner.

use std::collections::BTreeMap;

use serde_json::json;

use crate::error::Result;
use crate::models::PostKind;
use crate::prepare::{require_columns, PostColumn, PreparedPost};
use crate::stats::{mean, round_to};

use super::engine::{AnalysisContext, Insight};
use super::types::{ContentTypeData, InsightKind, InsightRecord, KindPerformance, Priority};

/// Per-kind aggregates and the best kind by mean engagement
///
/// Returns `None` when fewer than two distinct kinds carry an engagement
/// rate: there is nothing to compare.
pub fn analyze_content_types(posts: &[PreparedPost<'_>]) -> Option<ContentTypeData> {
    let mut by_kind: BTreeMap<PostKind, Vec<&PreparedPost<'_>>> = BTreeMap::new();
    for prepared in posts {
        if let (Some(kind), Some(_)) = (prepared.post.kind, prepared.engagement_rate) {
            by_kind.entry(kind).or_default().push(prepared);
        }
    }

    if by_kind.len() < 2 {
        return None;
    }

    let kinds: Vec<KindPerformance> = by_kind
        .into_iter()
        .map(|(kind, group)| {
            let engagement: Vec<f64> = group.iter().filter_map(|p| p.engagement_rate).collect();
            let saves: Vec<f64> = group
                .iter()
                .filter_map(|p| p.post.saves)
                .map(|s| s as f64)
                .collect();
            let reach: Vec<f64> = group
                .iter()
                .filter_map(|p| p.post.reach)
                .map(|r| r as f64)
                .collect();
            let viral: Vec<f64> = group.iter().map(|p| p.viral_score).collect();

            KindPerformance {
                kind,
                posts: group.len(),
                mean_engagement: round_to(mean(&engagement).unwrap_or(0.0), 2),
                mean_saves: round_to(mean(&saves).unwrap_or(0.0), 1),
                mean_reach: round_to(mean(&reach).unwrap_or(0.0), 1),
                mean_viral_score: round_to(mean(&viral).unwrap_or(0.0), 1),
            }
        })
        .collect();

    // First maximum wins on ties (kinds are in a fixed order)
    let (best_kind, best_engagement) = kinds
        .iter()
        .fold((kinds[0].kind, kinds[0].mean_engagement), |best, k| {
            if k.mean_engagement > best.1 {
                (k.kind, k.mean_engagement)
            } else {
                best
            }
        });

    Some(ContentTypeData {
        best_kind,
        best_engagement,
        kinds,
    })
}

/// Insight that recommends the best performing post kind
pub struct ContentTypeInsight;

impl ContentTypeInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ContentTypeInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Insight for ContentTypeInsight {
    fn id(&self) -> InsightKind {
        InsightKind::ContentType
    }

    fn name(&self) -> &'static str {
        "Content Type Performance"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<InsightRecord>> {
        require_columns(
            &ctx.dataset.posts,
            &[PostColumn::Kind, PostColumn::EngagementRate],
        )?;

        let Some(analysis) = analyze_content_types(ctx.prepared_posts()) else {
            return Ok(vec![]);
        };

        let label = analysis.best_kind.display_name();
        let record = InsightRecord::new(
            self.id(),
            Priority::Medium,
            format!("{} Perform Best", label),
            format!(
                "{} reach {:.2}% mean engagement, the highest of {} content types",
                label,
                analysis.best_engagement,
                analysis.kinds.len()
            ),
        )
        .with_action(format!(
            "Post more {} - they have {:.2}% engagement",
            label.to_lowercase(),
            analysis.best_engagement
        ))
        .with_data(serde_json::to_value(&analysis).unwrap_or_else(|_| json!({})));

        Ok(vec![record])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InsightConfig;
    use crate::error::Error;
    use crate::models::{Dataset, Post};

    fn post(kind: PostKind, engagement: f64) -> Post {
        Post {
            id: format!("{}-{}", kind, engagement),
            kind: Some(kind),
            engagement_rate: Some(engagement),
            reach: Some(1000),
            saves: Some(10),
            ..Default::default()
        }
    }

    #[test]
    fn test_best_kind_by_mean_engagement() {
        let dataset = Dataset::new(
            vec![
                post(PostKind::Image, 2.0),
                post(PostKind::Image, 4.0),
                post(PostKind::Video, 6.0),
                post(PostKind::Video, 8.0),
                post(PostKind::Carousel, 5.0),
            ],
            vec![],
            vec![],
        );
        let config = InsightConfig::default();
        let ctx = AnalysisContext::new(&dataset, &config);

        let analysis = analyze_content_types(ctx.prepared_posts()).unwrap();
        assert_eq!(analysis.best_kind, PostKind::Video);
        assert_eq!(analysis.best_engagement, 7.0);
        assert_eq!(analysis.kinds.len(), 3);

        let records = ContentTypeInsight::new().analyze(&ctx).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Videos/Reels Perform Best");
        assert!(records[0].recommended_action.contains("7.00%"));
        assert_eq!(records[0].supporting_data["best_kind"], "video");
    }

    #[test]
    fn test_single_kind_produces_no_record() {
        let dataset = Dataset::new(
            vec![post(PostKind::Image, 2.0), post(PostKind::Image, 9.0)],
            vec![],
            vec![],
        );
        let config = InsightConfig::default();
        let ctx = AnalysisContext::new(&dataset, &config);

        let records = ContentTypeInsight::new().analyze(&ctx).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_kind_column_is_skipped() {
        let mut p = post(PostKind::Image, 2.0);
        p.kind = None;
        let dataset = Dataset::new(vec![p], vec![], vec![]);
        let config = InsightConfig::default();
        let ctx = AnalysisContext::new(&dataset, &config);

        let err = ContentTypeInsight::new().analyze(&ctx).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { column: "kind", .. }));
    }
}
