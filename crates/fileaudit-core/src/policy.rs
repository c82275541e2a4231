//! Risk scoring policy.
//!
//! A [`RiskPolicy`] is an explicit, immutable configuration value injected
//! into every scoring call; there is no ambient default constant. The
//! builder validates on build, and [`RiskPolicy::validate`] re-checks a
//! hand-assembled policy before use.

use chrono::NaiveDateTime;
use compact_str::CompactString;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// 2 GiB, the default "big file" threshold.
const DEFAULT_BIG_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Integer weight added to a record's score when a rule fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleWeights {
    /// Size at or above the big-file threshold.
    pub big_file: u32,
    /// Exact content hash shared with another record.
    pub duplicate_hash: u32,
    /// World-writable permission bits.
    pub world_writable: u32,
    /// World-readable (and not world-writable) permission bits.
    pub world_readable: u32,
    /// Hidden flag set.
    pub hidden: u32,
    /// Path longer than the configured maximum.
    pub long_path: u32,
    /// Path deeper than the configured maximum.
    pub deep_levels: u32,
    /// Not touched within the stale window.
    pub stale: u32,
    /// Name contains a suspicious substring.
    pub bad_name: u32,
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            big_file: 3,
            duplicate_hash: 4,
            world_writable: 4,
            world_readable: 1,
            hidden: 1,
            long_path: 2,
            deep_levels: 2,
            stale: 2,
            bad_name: 1,
        }
    }
}

/// One risk band: scores up to and including `max_points` map to `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBand {
    /// Inclusive upper bound on the score for this band.
    pub max_points: u32,
    /// Band label.
    pub label: CompactString,
}

impl RiskBand {
    /// Create a new band.
    pub fn new(max_points: u32, label: impl Into<CompactString>) -> Self {
        Self {
            max_points,
            label: label.into(),
        }
    }
}

/// Configuration for risk scoring.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct RiskPolicy {
    /// Days since the best available date before a record counts as stale.
    #[builder(default = "365")]
    pub stale_days: i64,

    /// Maximum path length in characters.
    #[builder(default = "255")]
    pub long_path: usize,

    /// Maximum path depth in segments.
    #[builder(default = "20")]
    pub deep_levels: usize,

    /// Byte threshold for the big-file rule.
    #[builder(default = "DEFAULT_BIG_BYTES")]
    pub big_bytes: u64,

    /// Case-insensitive substrings flagging a suspicious name.
    #[builder(default = "default_bad_name_patterns()")]
    pub bad_name_patterns: Vec<String>,

    /// Per-rule score weights.
    #[builder(default)]
    pub weights: RuleWeights,

    /// Ascending band cut points; the last must cover all scores.
    #[builder(default = "default_bands()")]
    pub bands: Vec<RiskBand>,

    /// Reference time for staleness (default: now).
    #[builder(default = "chrono::Utc::now().naive_utc()")]
    pub reference_time: NaiveDateTime,
}

fn default_bad_name_patterns() -> Vec<String> {
    ["copia", "copy", "tmp", "backup", "old", "viejo"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_bands() -> Vec<RiskBand> {
    vec![
        RiskBand::new(1, "Low"),
        RiskBand::new(3, "Medium"),
        RiskBand::new(6, "High"),
        RiskBand::new(u32::MAX, "Critical"),
    ]
}

impl RiskPolicyBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref bands) = self.bands {
            validate_bands(bands).map_err(|e| e.to_string())?;
        }
        if let Some(days) = self.stale_days {
            if days < 0 {
                return Err(PolicyError::NegativeStaleDays { days }.to_string());
            }
        }
        Ok(())
    }
}

fn validate_bands(bands: &[RiskBand]) -> Result<(), PolicyError> {
    if bands.is_empty() {
        return Err(PolicyError::EmptyBands);
    }
    for (index, band) in bands.iter().enumerate() {
        if band.label.is_empty() {
            return Err(PolicyError::EmptyBandLabel { index });
        }
        if index > 0 && band.max_points <= bands[index - 1].max_points {
            return Err(PolicyError::UnorderedBands { index });
        }
    }
    if bands.last().map(|b| b.max_points) != Some(u32::MAX) {
        return Err(PolicyError::UnboundedBands);
    }
    Ok(())
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            stale_days: 365,
            long_path: 255,
            deep_levels: 20,
            big_bytes: DEFAULT_BIG_BYTES,
            bad_name_patterns: default_bad_name_patterns(),
            weights: RuleWeights::default(),
            bands: default_bands(),
            reference_time: chrono::Utc::now().naive_utc(),
        }
    }
}

impl RiskPolicy {
    /// Create a policy builder.
    pub fn builder() -> RiskPolicyBuilder {
        RiskPolicyBuilder::default()
    }

    /// Validate a hand-assembled policy.
    pub fn validate(&self) -> Result<(), PolicyError> {
        validate_bands(&self.bands)?;
        if self.stale_days < 0 {
            return Err(PolicyError::NegativeStaleDays {
                days: self.stale_days,
            });
        }
        Ok(())
    }

    /// Label of the first band whose cut point covers `points`.
    ///
    /// Assumes a validated policy; the last band covers every score.
    pub fn band_for(&self, points: u32) -> &str {
        self.bands
            .iter()
            .find(|b| points <= b.max_points)
            .map(|b| b.label.as_str())
            .unwrap_or_default()
    }
}
