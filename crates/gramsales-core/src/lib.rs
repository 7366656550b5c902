//! Gramsales Core Library
//!
//! Sales intelligence for Instagram-driven businesses:
//! - Domain models for posts, sales, leads, stories and costs
//! - CSV import with English and Portuguese header aliases
//! - Derived post metrics (engagement, save rate, viral score)
//! - Insight Engine producing ranked recommendations
//! - Business summaries (sales, commissions, lead funnel, finances)
//! - Lead reconciliation from recorded sales
//! - Insight history stored in SQLite

pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod insights;
pub mod models;
pub mod prepare;
pub mod reconcile;
pub mod reports;
pub mod stats;

pub use config::{InsightConfig, TeamMember};
pub use db::{Database, InsightRun, StoredRun};
pub use error::{Error, Result};
pub use insights::{
    AnalysisContext, Insight, InsightEngine, InsightKind, InsightRecord, Priority,
};
pub use models::{
    CostRecord, Dataset, LeadOrigin, LeadRecord, LeadStatus, Post, PostKind, SaleRecord,
    SaleStatus, StoryRecord,
};
pub use reconcile::{reconcile_sale, LeadAction};
pub use reports::{FinancialSummary, LeadFunnel, SalesSummary, SellerCommission};
