//! Behavioural risk profile — a continuous score channel kept apart
//! from the rule-based suspicion score.
//!
//! The profile reads the same graph the detectors read and never feeds
//! back into the score sheet. Each wallet gets a graded score built from
//! ratios and counts of its outgoing features, plus two pattern bonuses:
//! - Smurfing: many sends, mostly small
//! - Mule collector: many receipts, almost no sends

use crate::graph::TransactionGraph;
use crate::types::WalletId;
use serde::Serialize;
use std::fmt;

// ── Constants ────────────────────────────────────────────────────────────────

const SMALL_RATIO_WEIGHT: f64 = 30.0;
const BURST_WEIGHT: f64 = 3.0;
const BURST_CAP: u32 = 10;
const REPEAT_DEST_WEIGHT: f64 = 2.0;
const SELF_TRANSFER_WEIGHT: f64 = 10.0;

const SMURF_MIN_SENT: usize = 5;
const SMURF_MIN_SMALL_RATIO: f64 = 0.6;
const SMURF_BONUS: f64 = 20.0;

const MULE_MIN_RECEIVED: usize = 5;
const MULE_MAX_SENT: usize = 1;
const MULE_BONUS: f64 = 15.0;

const RED_THRESHOLD: f64 = 70.0;
const YELLOW_THRESHOLD: f64 = 40.0;
const PROFILE_CAP: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskColor {
    Green,
    Yellow,
    Red,
}

impl RiskColor {
    pub fn from_score(score: f64) -> Self {
        if score >= RED_THRESHOLD {
            Self::Red
        } else if score >= YELLOW_THRESHOLD {
            Self::Yellow
        } else {
            Self::Green
        }
    }
}

impl fmt::Display for RiskColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Green => "GREEN",
            Self::Yellow => "YELLOW",
            Self::Red => "RED",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskProfile {
    pub wallet_id: WalletId,
    pub tx_sent: usize,
    pub tx_received: usize,
    pub small_tx_ratio: f64,
    pub peak_tx_count_10min: u32,
    pub repeat_dest_total: u64,
    pub self_transfers: usize,
    /// In [0, 100], one decimal place.
    pub risk_score: f64,
    pub risk_color: RiskColor,
}

pub fn profile_wallet(graph: &TransactionGraph, wallet: &str) -> RiskProfile {
    let outgoing = graph.outgoing(wallet);
    let tx_sent = outgoing.len();
    let tx_received = graph.in_degree(wallet);

    let small = outgoing.iter().filter(|t| t.features.is_small_tx).count();
    let small_tx_ratio = if tx_sent > 0 {
        small as f64 / tx_sent as f64
    } else {
        0.0
    };
    let peak_tx_count_10min = outgoing
        .iter()
        .map(|t| t.features.tx_count_10min)
        .max()
        .unwrap_or(0);
    let repeat_dest_total: u64 = outgoing.iter().map(|t| u64::from(t.features.repeat_dest)).sum();
    let self_transfers = outgoing.iter().filter(|t| t.features.self_transfer).count();

    let mut score = small_tx_ratio * SMALL_RATIO_WEIGHT
        + f64::from(peak_tx_count_10min.min(BURST_CAP)) * BURST_WEIGHT
        + repeat_dest_total as f64 * REPEAT_DEST_WEIGHT
        + self_transfers as f64 * SELF_TRANSFER_WEIGHT;

    if tx_sent >= SMURF_MIN_SENT && small_tx_ratio > SMURF_MIN_SMALL_RATIO {
        score += SMURF_BONUS;
    }
    if tx_received >= MULE_MIN_RECEIVED && tx_sent <= MULE_MAX_SENT {
        score += MULE_BONUS;
    }

    let risk_score = ((score * 10.0).round() / 10.0).min(PROFILE_CAP);

    RiskProfile {
        wallet_id: wallet.to_string(),
        tx_sent,
        tx_received,
        small_tx_ratio,
        peak_tx_count_10min,
        repeat_dest_total,
        self_transfers,
        risk_score,
        risk_color: RiskColor::from_score(risk_score),
    }
}

/// One profile per wallet, in graph discovery order.
pub fn profile_all(graph: &TransactionGraph) -> Vec<RiskProfile> {
    let profiles: Vec<RiskProfile> = graph.wallets().map(|w| profile_wallet(graph, w)).collect();
    let red = profiles.iter().filter(|p| p.risk_color == RiskColor::Red).count();
    log::info!("profiled {} wallets, {} red", profiles.len(), red);
    profiles
}
