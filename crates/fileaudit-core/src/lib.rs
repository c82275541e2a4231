//! Core types for fileaudit.
//!
//! This crate provides the data model shared by all fileaudit analyses:
//! inventory records and snapshots, the optional-column registry, lenient
//! value coercion for loaders, and the risk scoring policy.

pub mod coerce;
mod error;
mod policy;
mod record;

pub use error::PolicyError;
pub use policy::{RiskBand, RiskPolicy, RiskPolicyBuilder, RuleWeights};
pub use record::{Column, ColumnSet, FileRecord, FileRecordBuilder, Snapshot};
