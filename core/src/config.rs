//! Engine configuration: feature cutoffs, detector rules, risk bands.
//!
//! Every field has a default, so a JSON file only needs to name the
//! values it overrides. A config is validated once, before any graph
//! is built; the engine never runs with an invalid one.

use crate::error::{FlowError, FlowResult};
use crate::types::{Amount, Score, MAX_SCORE};
use serde::{Deserialize, Serialize};

/// Upper bound for every minute-valued window: one year.
pub const MAX_WINDOW_MINUTES: i64 = 365 * 24 * 60;

// ── Feature extraction ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Transfers strictly below this amount are flagged `is_small_tx`.
    pub small_tx_cutoff: Amount,
    /// Trailing window used for `tx_count_10min`.
    pub burst_window_minutes: i64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            small_tx_cutoff: 100.0,
            burst_window_minutes: 10,
        }
    }
}

// ── Detector rules ─────────────────────────────────────────────────

/// Threshold and weight for a counting detector.
///
/// `threshold` is a count whose meaning depends on the detector:
/// out-degree for fan-out, in-degree for fan-in, qualifying edge count
/// for the edge-based detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorRule {
    pub enabled: bool,
    pub threshold: usize,
    pub weight: Score,
}

impl DetectorRule {
    pub const fn new(threshold: usize, weight: Score) -> Self {
        Self { enabled: true, threshold, weight }
    }
}

/// Weight for a detector that matches a fixed shape and takes no
/// threshold (peeling chain, fast consecutive). A `threshold` key is
/// rejected rather than silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShapeRule {
    pub enabled: bool,
    pub weight: Score,
}

impl ShapeRule {
    pub const fn new(weight: Score) -> Self {
        Self { enabled: true, weight }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub fan_out: DetectorRule,
    pub fan_in: DetectorRule,
    pub wash_trading: DetectorRule,
    pub burst: DetectorRule,
    pub smurfing: DetectorRule,
    pub peeling_chain: ShapeRule,
    pub fast_consecutive: ShapeRule,
    /// An edge counts toward the burst rule when its `tx_count_10min`
    /// reaches this value.
    pub burst_min_tx_count_10min: usize,
    /// Consecutive outgoing transfers closer than or equal to this
    /// fire the fast-consecutive rule.
    pub fast_transfer_limit_minutes: i64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            fan_out: DetectorRule::new(5, 40),
            fan_in: DetectorRule::new(5, 40),
            wash_trading: DetectorRule::new(2, 30),
            burst: DetectorRule::new(2, 30),
            smurfing: DetectorRule::new(4, 30),
            peeling_chain: ShapeRule::new(40),
            fast_consecutive: ShapeRule::new(20),
            burst_min_tx_count_10min: 3,
            fast_transfer_limit_minutes: 60,
        }
    }
}

// ── Risk bands ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Scores at or above this are High.
    pub high: Score,
    /// Scores at or above this (and below `high`) are Medium.
    pub medium: Score,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self { high: 70, medium: 40 }
    }
}

// ── Top level ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub features: FeatureConfig,
    pub detectors: DetectorConfig,
    pub risk: RiskThresholds,
}

impl EngineConfig {
    /// Lower fan thresholds and weights, tuned for short relay chains.
    pub fn peeling_chain_preset() -> Self {
        let mut config = Self::default();
        config.detectors.fan_out = DetectorRule::new(3, 30);
        config.detectors.fan_in = DetectorRule::new(3, 30);
        config
    }

    /// Load from a JSON file. Missing keys take their defaults.
    pub fn load(path: &str) -> FlowResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> FlowResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject structurally invalid settings before any graph is built.
    pub fn validate(&self) -> FlowResult<()> {
        let f = &self.features;
        if !f.small_tx_cutoff.is_finite() || f.small_tx_cutoff < 0.0 {
            return Err(FlowError::invalid_config(
                "features.small_tx_cutoff",
                format!("must be a finite non-negative amount, got {}", f.small_tx_cutoff),
            ));
        }
        check_window("features.burst_window_minutes", f.burst_window_minutes)?;

        let d = &self.detectors;
        let counted = [
            ("detectors.fan_out.threshold", d.fan_out),
            ("detectors.fan_in.threshold", d.fan_in),
            ("detectors.wash_trading.threshold", d.wash_trading),
            ("detectors.burst.threshold", d.burst),
            ("detectors.smurfing.threshold", d.smurfing),
        ];
        for (field, rule) in counted {
            if rule.enabled && rule.threshold == 0 {
                return Err(FlowError::invalid_config(field, "must be at least 1"));
            }
        }
        if d.burst.enabled && d.burst_min_tx_count_10min == 0 {
            return Err(FlowError::invalid_config(
                "detectors.burst_min_tx_count_10min",
                "must be at least 1",
            ));
        }
        if d.fast_consecutive.enabled {
            check_window("detectors.fast_transfer_limit_minutes", d.fast_transfer_limit_minutes)?;
        }

        let r = &self.risk;
        if r.high > MAX_SCORE || r.medium > MAX_SCORE {
            return Err(FlowError::invalid_config(
                "risk",
                format!("thresholds must lie in [0, {MAX_SCORE}]"),
            ));
        }
        if r.medium > r.high {
            return Err(FlowError::invalid_config(
                "risk.medium",
                format!("{} exceeds risk.high {}", r.medium, r.high),
            ));
        }
        Ok(())
    }
}

fn check_window(field: &str, minutes: i64) -> FlowResult<()> {
    if minutes <= 0 || minutes > MAX_WINDOW_MINUTES {
        return Err(FlowError::invalid_config(
            field,
            format!("must lie in [1, {MAX_WINDOW_MINUTES}] minutes, got {minutes}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        EngineConfig::default().validate().unwrap();
        EngineConfig::peeling_chain_preset().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "features": { "small_tx_cutoff": 5.0 } }"#)
            .unwrap();
        assert_eq!(config.features.small_tx_cutoff, 5.0);
        assert_eq!(config.features.burst_window_minutes, 10);
        assert_eq!(config.detectors, DetectorConfig::default());
        assert_eq!(config.risk, RiskThresholds::default());
    }

    #[test]
    fn disabled_rule_may_have_zero_threshold() {
        let mut config = EngineConfig::default();
        config.detectors.smurfing = DetectorRule { enabled: false, threshold: 0, weight: 30 };
        assert!(config.validate().is_ok());
    }
}
