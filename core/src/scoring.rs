//! Score aggregation: detector outputs → per-wallet score records.
//!
//! A wallet's score is the sum of the weights of every detector that
//! flagged it, saturated at 100. Reasons follow `DetectorKind` order,
//! whatever order the results arrive in. The aggregator returns a fresh
//! sheet on every call and keeps no state between runs.

use crate::config::RiskThresholds;
use crate::detector::DetectionResult;
use crate::types::{Score, WalletId, MAX_SCORE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Shown in reports for wallets with no reasons. Never stored.
pub const NORMAL_BEHAVIOR: &str = "Normal behavior";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Inclusive lower bounds: `high` and above is High, `medium` and
    /// above is Medium, everything else Low.
    pub fn from_score(score: Score, thresholds: &RiskThresholds) -> Self {
        if score >= thresholds.high {
            Self::High
        } else if score >= thresholds.medium {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: Score,
    pub level: RiskLevel,
    pub reasons: Vec<String>,
}

impl ScoreRecord {
    /// Reasons joined for display, or "Normal behavior" when empty.
    pub fn reason_text(&self) -> String {
        if self.reasons.is_empty() {
            NORMAL_BEHAVIOR.to_string()
        } else {
            self.reasons.join(", ")
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

/// The per-run output mapping, keyed by wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreSheet {
    records: BTreeMap<WalletId, ScoreRecord>,
}

impl ScoreSheet {
    pub fn get(&self, wallet: &str) -> Option<&ScoreRecord> {
        self.records.get(wallet)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in wallet id order.
    pub fn iter(&self) -> impl Iterator<Item = (&WalletId, &ScoreRecord)> + '_ {
        self.records.iter()
    }

    /// Highest score first; ties by wallet id.
    pub fn ranked(&self) -> Vec<(&WalletId, &ScoreRecord)> {
        let mut ranked: Vec<_> = self.records.iter().collect();
        ranked.sort_by(|a, b| b.1.score.cmp(&a.1.score).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    pub fn level_counts(&self) -> LevelCounts {
        let mut counts = LevelCounts::default();
        for record in self.records.values() {
            match record.level {
                RiskLevel::Low => counts.low += 1,
                RiskLevel::Medium => counts.medium += 1,
                RiskLevel::High => counts.high += 1,
            }
        }
        counts
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub struct ScoreAggregator {
    thresholds: RiskThresholds,
}

impl ScoreAggregator {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    /// Score every wallet in `wallets` against the detector results.
    /// Wallets no detector flagged get score 0, level Low, no reasons.
    pub fn aggregate<'a>(
        &self,
        wallets: impl IntoIterator<Item = &'a WalletId>,
        results: &[DetectionResult],
    ) -> ScoreSheet {
        let mut ordered: Vec<&DetectionResult> = results.iter().collect();
        ordered.sort_by_key(|r| r.kind);

        let mut records = BTreeMap::new();
        for wallet in wallets {
            let mut sum: Score = 0;
            let mut reasons = Vec::new();
            for result in &ordered {
                if result.flagged.contains(wallet) {
                    sum = sum.saturating_add(result.weight);
                    reasons.push(result.kind.reason().to_string());
                }
            }
            let score = sum.min(MAX_SCORE);
            records.insert(
                wallet.clone(),
                ScoreRecord {
                    score,
                    level: RiskLevel::from_score(score, &self.thresholds),
                    reasons,
                },
            );
        }

        let sheet = ScoreSheet { records };
        let counts = sheet.level_counts();
        log::info!(
            "scored {} wallets: {} high, {} medium, {} low",
            sheet.len(),
            counts.high,
            counts.medium,
            counts.low
        );
        sheet
    }
}
