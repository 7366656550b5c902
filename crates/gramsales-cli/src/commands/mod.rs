//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (open_db, load_config, load_dataset), init and config
//! - `analyze` - Insight engine run and per-day aggregates
//! - `summary` - Sales, commission, lead and finance summaries
//! - `reconcile` - Lead reconciliation from sales
//! - `history` - Stored insight runs

pub mod analyze;
pub mod core;
pub mod history;
pub mod reconcile;
pub mod summary;

// Re-export command functions for main.rs
pub use analyze::*;
pub use core::*;
pub use history::*;
pub use reconcile::*;
pub use summary::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
