//! Wallet summary projector — traffic statistics for reporting.
//!
//! Read-only over the graph and score sheet. Counts and totals come from
//! the graph's edges, so dropped rows never contribute.

use crate::graph::TransactionGraph;
use crate::scoring::{RiskLevel, ScoreSheet};
use crate::types::{Amount, Score, WalletId};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletSummary {
    pub wallet_id: WalletId,
    pub incoming_tx_count: usize,
    pub outgoing_tx_count: usize,
    pub total_received: Amount,
    pub total_sent: Amount,
    /// `total_received - total_sent`.
    pub net_flow: Amount,
    pub unique_senders: usize,
    pub unique_receivers: usize,
    pub suspicion_score: Score,
    pub risk_level: RiskLevel,
    pub reasons: Vec<String>,
}

pub fn summarize_wallet(graph: &TransactionGraph, scores: &ScoreSheet, wallet: &str) -> WalletSummary {
    let incoming = graph.incoming(wallet);
    let outgoing = graph.outgoing(wallet);

    let total_received: Amount = incoming.iter().map(|t| t.amount).sum();
    let total_sent: Amount = outgoing.iter().map(|t| t.amount).sum();
    let unique_senders = incoming.iter().map(|t| t.source.as_str()).collect::<BTreeSet<_>>().len();
    let unique_receivers = outgoing.iter().map(|t| t.dest.as_str()).collect::<BTreeSet<_>>().len();

    let (suspicion_score, risk_level, reasons) = match scores.get(wallet) {
        Some(record) => (record.score, record.level, record.reasons.clone()),
        None => (0, RiskLevel::Low, Vec::new()),
    };

    WalletSummary {
        wallet_id: wallet.to_string(),
        incoming_tx_count: incoming.len(),
        outgoing_tx_count: outgoing.len(),
        total_received,
        total_sent,
        net_flow: total_received - total_sent,
        unique_senders,
        unique_receivers,
        suspicion_score,
        risk_level,
        reasons,
    }
}

/// One summary per wallet, highest score first, ties by wallet id.
pub fn summarize(graph: &TransactionGraph, scores: &ScoreSheet) -> Vec<WalletSummary> {
    let mut rows: Vec<WalletSummary> = graph
        .wallets()
        .map(|w| summarize_wallet(graph, scores, w))
        .collect();
    rows.sort_by(|a, b| {
        b.suspicion_score
            .cmp(&a.suspicion_score)
            .then_with(|| a.wallet_id.cmp(&b.wallet_id))
    });
    rows
}
