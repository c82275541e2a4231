//! Analysis algorithms for fileaudit.
//!
//! This crate turns an in-memory inventory [`Snapshot`] into derived
//! tables. Every analysis is a pure, synchronous function of its inputs:
//! it borrows the snapshot immutably, runs to completion, and returns an
//! owned result. Missing columns degrade to empty or zeroed output;
//! unparsable values are already missing by the time a snapshot exists
//! (see `fileaudit_core::coerce`). The one fallible input is the risk
//! policy, which is validated loudly.
//!
//! # Duplicate Detection
//!
//! Groups records by exact content hash, or by a `name|size` pseudo-hash
//! when the snapshot carries no hash column:
//!
//! ```rust,ignore
//! use fileaudit_analyze::find_duplicates;
//!
//! let report = find_duplicates(&snapshot);
//! println!("{} duplicate groups", report.group_count);
//! println!("{} bytes recoverable", report.recoverable_bytes);
//! ```
//!
//! # Risk Scoring
//!
//! Applies an ordered table of weighted heuristic rules per record and
//! classifies totals into bands:
//!
//! ```rust,ignore
//! use fileaudit_analyze::score_records;
//! use fileaudit_core::RiskPolicy;
//!
//! let report = score_records(&snapshot, &RiskPolicy::default())?;
//! for row in &report.rows {
//!     println!("{} {} [{}] {:?}", row.points, row.path, row.band, row.reasons);
//! }
//! ```
//!
//! # Dedup Simulation
//!
//! Simulates which duplicates could be removed under a retention strategy,
//! without touching anything:
//!
//! ```rust,ignore
//! use fileaudit_analyze::{simulate_dedup, RetentionStrategy};
//! use fileaudit_core::Column;
//!
//! let plan = simulate_dedup(&snapshot, Column::Folder, RetentionStrategy::KeepLargest);
//! println!("{} drops, {} bytes saved", plan.drops.len(), plan.savings_bytes);
//! ```

mod dedup;
mod duplicates;
mod kpi;
pub mod perms;
mod risk;

pub use dedup::{
    simulate_dedup, DedupPlan, DropEntry, RetentionStrategy, ACTION_DELETE_DUPLICATE,
};
pub use duplicates::{find_duplicates, DuplicateGroup, DuplicateKeyKind, DuplicateReport};
pub use kpi::{
    advanced_kpis, overview, size_buckets, top_by_size, usage_by_folder, FolderUsage, Kpi,
    KpiValue, LargeFile, Overview, SizeBucket,
};
pub use risk::{
    score_records, RiskReport, RiskRow, RULE_BAD_NAME, RULE_BIG_FILE, RULE_DEEP_LEVELS,
    RULE_DUPLICATE_HASH, RULE_HIDDEN, RULE_LONG_PATH, RULE_STALE, RULE_WORLD_READABLE,
    RULE_WORLD_WRITABLE,
};

// Re-export core types
pub use fileaudit_core::{Column, ColumnSet, FileRecord, PolicyError, RiskPolicy, Snapshot};
