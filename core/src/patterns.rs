//! The money-laundering pattern detectors.
//!
//! - Fan-out / fan-in: out- or in-degree at or above a threshold
//! - Wash trading: repeated self-transfers
//! - Burst: several transfers sent inside a crowded 10-minute window
//! - Smurfing: many small outgoing transfers
//! - Peeling chain: exactly one transfer in and one out
//! - Fast consecutive: two outgoing transfers closer than a time limit
//!
//! A wallet with no outgoing edges never fires an outgoing-edge rule.

use crate::config::{DetectorConfig, DetectorRule, ShapeRule};
use crate::detector::{Detector, DetectorKind};
use crate::graph::TransactionGraph;
use crate::transfer::Transfer;
use crate::types::Score;
use chrono::Duration;

/// Count outgoing edges of `wallet` satisfying `pred`.
fn count_outgoing(graph: &TransactionGraph, wallet: &str, pred: impl Fn(&Transfer) -> bool) -> usize {
    graph.outgoing(wallet).into_iter().filter(|t| pred(t)).count()
}

// ── Degree rules ─────────────────────────────────────────────────────────────

pub struct FanOutDetector {
    rule: DetectorRule,
}

impl FanOutDetector {
    pub fn new(rule: DetectorRule) -> Self {
        Self { rule }
    }
}

impl Detector for FanOutDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::FanOut
    }

    fn weight(&self) -> Score {
        self.rule.weight
    }

    fn matches(&self, graph: &TransactionGraph, wallet: &str) -> bool {
        graph.out_degree(wallet) >= self.rule.threshold
    }
}

pub struct FanInDetector {
    rule: DetectorRule,
}

impl FanInDetector {
    pub fn new(rule: DetectorRule) -> Self {
        Self { rule }
    }
}

impl Detector for FanInDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::FanIn
    }

    fn weight(&self) -> Score {
        self.rule.weight
    }

    fn matches(&self, graph: &TransactionGraph, wallet: &str) -> bool {
        graph.in_degree(wallet) >= self.rule.threshold
    }
}

/// Exactly one transfer in, exactly one out.
pub struct PeelingChainDetector {
    rule: ShapeRule,
}

impl PeelingChainDetector {
    pub fn new(rule: ShapeRule) -> Self {
        Self { rule }
    }
}

impl Detector for PeelingChainDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::PeelingChain
    }

    fn weight(&self) -> Score {
        self.rule.weight
    }

    fn matches(&self, graph: &TransactionGraph, wallet: &str) -> bool {
        graph.in_degree(wallet) == 1 && graph.out_degree(wallet) == 1
    }
}

// ── Outgoing-edge rules ──────────────────────────────────────────────────────

pub struct WashTradingDetector {
    rule: DetectorRule,
}

impl WashTradingDetector {
    pub fn new(rule: DetectorRule) -> Self {
        Self { rule }
    }
}

impl Detector for WashTradingDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::WashTrading
    }

    fn weight(&self) -> Score {
        self.rule.weight
    }

    fn matches(&self, graph: &TransactionGraph, wallet: &str) -> bool {
        count_outgoing(graph, wallet, |t| t.features.self_transfer) >= self.rule.threshold
    }
}

pub struct BurstDetector {
    rule: DetectorRule,
    min_tx_count_10min: u32,
}

impl BurstDetector {
    pub fn new(rule: DetectorRule, min_tx_count_10min: usize) -> Self {
        Self {
            rule,
            min_tx_count_10min: u32::try_from(min_tx_count_10min).unwrap_or(u32::MAX),
        }
    }
}

impl Detector for BurstDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Burst
    }

    fn weight(&self) -> Score {
        self.rule.weight
    }

    fn matches(&self, graph: &TransactionGraph, wallet: &str) -> bool {
        let crowded = count_outgoing(graph, wallet, |t| {
            t.features.tx_count_10min >= self.min_tx_count_10min
        });
        crowded >= self.rule.threshold
    }
}

pub struct SmurfingDetector {
    rule: DetectorRule,
}

impl SmurfingDetector {
    pub fn new(rule: DetectorRule) -> Self {
        Self { rule }
    }
}

impl Detector for SmurfingDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Smurfing
    }

    fn weight(&self) -> Score {
        self.rule.weight
    }

    fn matches(&self, graph: &TransactionGraph, wallet: &str) -> bool {
        count_outgoing(graph, wallet, |t| t.features.is_small_tx) >= self.rule.threshold
    }
}

/// Any two time-adjacent outgoing transfers at most `limit` apart.
/// `None` means the limit is too large to represent: every gap is within it.
pub struct FastConsecutiveDetector {
    rule: ShapeRule,
    limit: Option<Duration>,
}

impl FastConsecutiveDetector {
    pub fn new(rule: ShapeRule, limit_minutes: i64) -> Self {
        Self {
            rule,
            limit: Duration::try_minutes(limit_minutes),
        }
    }
}

impl Detector for FastConsecutiveDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::FastConsecutive
    }

    fn weight(&self) -> Score {
        self.rule.weight
    }

    fn matches(&self, graph: &TransactionGraph, wallet: &str) -> bool {
        graph
            .outgoing(wallet)
            .windows(2)
            .any(|pair| {
                let gap = pair[1].timestamp - pair[0].timestamp;
                self.limit.map_or(true, |limit| gap <= limit)
            })
    }
}

/// Build the enabled detectors in `DetectorKind` order.
pub fn standard_detectors(config: &DetectorConfig) -> Vec<Box<dyn Detector>> {
    let mut detectors: Vec<Box<dyn Detector>> = Vec::new();
    for kind in DetectorKind::ALL {
        if !is_enabled(config, kind) {
            log::debug!("detector {} disabled", kind.name());
            continue;
        }
        let detector: Box<dyn Detector> = match kind {
            DetectorKind::FanOut => Box::new(FanOutDetector::new(config.fan_out)),
            DetectorKind::FanIn => Box::new(FanInDetector::new(config.fan_in)),
            DetectorKind::WashTrading => Box::new(WashTradingDetector::new(config.wash_trading)),
            DetectorKind::Burst => Box::new(BurstDetector::new(
                config.burst,
                config.burst_min_tx_count_10min,
            )),
            DetectorKind::Smurfing => Box::new(SmurfingDetector::new(config.smurfing)),
            DetectorKind::PeelingChain => Box::new(PeelingChainDetector::new(config.peeling_chain)),
            DetectorKind::FastConsecutive => Box::new(FastConsecutiveDetector::new(
                config.fast_consecutive,
                config.fast_transfer_limit_minutes,
            )),
        };
        detectors.push(detector);
    }
    detectors
}

pub fn is_enabled(config: &DetectorConfig, kind: DetectorKind) -> bool {
    match kind {
        DetectorKind::FanOut => config.fan_out.enabled,
        DetectorKind::FanIn => config.fan_in.enabled,
        DetectorKind::WashTrading => config.wash_trading.enabled,
        DetectorKind::Burst => config.burst.enabled,
        DetectorKind::Smurfing => config.smurfing.enabled,
        DetectorKind::PeelingChain => config.peeling_chain.enabled,
        DetectorKind::FastConsecutive => config.fast_consecutive.enabled,
    }
}
