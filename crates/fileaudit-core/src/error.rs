//! Error types for caller-supplied configuration.
//!
//! Analyses themselves never fail: a missing column degrades to an empty
//! result and an unparsable value becomes a missing one. A malformed risk
//! policy is the one input that must be rejected loudly, since scoring
//! thresholds feed downstream retention and security decisions.

use thiserror::Error;

/// Errors raised when validating a [`RiskPolicy`](crate::RiskPolicy).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// No risk bands were configured.
    #[error("Risk bands must not be empty")]
    EmptyBands,

    /// Band cut points are not strictly ascending.
    #[error("Risk band cut points must be strictly ascending (band {index})")]
    UnorderedBands { index: usize },

    /// The last band does not cover all scores.
    #[error("Last risk band must have max_points == u32::MAX to cover all scores")]
    UnboundedBands,

    /// A band has an empty label.
    #[error("Risk band {index} has an empty label")]
    EmptyBandLabel { index: usize },

    /// The stale threshold is negative.
    #[error("stale_days must be non-negative (got {days})")]
    NegativeStaleDays { days: i64 },
}
