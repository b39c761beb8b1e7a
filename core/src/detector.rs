//! Detector trait and the fixed detector order.
//!
//! RULE: Every pattern detector implements `Detector`.
//! Detectors only read the graph. The engine evaluates them in
//! `DetectorKind` declaration order, and that order is the order
//! reasons appear in a wallet's score record.

use crate::graph::TransactionGraph;
use crate::types::{Score, WalletId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Stable detector identities, in evaluation order.
/// NEVER reorder: reason lists are ordered by this declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    FanOut,
    FanIn,
    WashTrading,
    Burst,
    Smurfing,
    PeelingChain,
    FastConsecutive,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 7] = [
        Self::FanOut,
        Self::FanIn,
        Self::WashTrading,
        Self::Burst,
        Self::Smurfing,
        Self::PeelingChain,
        Self::FastConsecutive,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::FanOut => "fan_out",
            Self::FanIn => "fan_in",
            Self::WashTrading => "wash_trading",
            Self::Burst => "burst",
            Self::Smurfing => "smurfing",
            Self::PeelingChain => "peeling_chain",
            Self::FastConsecutive => "fast_consecutive",
        }
    }

    /// Human-readable reason attached to a flagged wallet.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::FanOut => "Heavy fan-out",
            Self::FanIn => "Heavy fan-in",
            Self::WashTrading => "Wash trading",
            Self::Burst => "Transaction bursts",
            Self::Smurfing => "Smurfing pattern",
            Self::PeelingChain => "Peeling chain detected",
            Self::FastConsecutive => "Fast consecutive transfers",
        }
    }
}

/// Wallets flagged by one detector, with the weight they earn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResult {
    pub kind: DetectorKind,
    pub weight: Score,
    pub flagged: BTreeSet<WalletId>,
}

/// The contract every pattern detector must fulfill.
pub trait Detector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    fn weight(&self) -> Score;

    /// Whether `wallet` matches this detector's pattern.
    /// Wallets absent from the graph never match.
    fn matches(&self, graph: &TransactionGraph, wallet: &str) -> bool;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn reason(&self) -> &'static str {
        self.kind().reason()
    }

    /// Run over every wallet in the graph.
    fn detect(&self, graph: &TransactionGraph) -> DetectionResult {
        let flagged: BTreeSet<WalletId> = graph
            .wallets()
            .filter(|w| self.matches(graph, w))
            .cloned()
            .collect();
        log::debug!("detector {} flagged {} wallets", self.name(), flagged.len());
        DetectionResult {
            kind: self.kind(),
            weight: self.weight(),
            flagged,
        }
    }
}
