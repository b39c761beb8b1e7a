//! Transaction graph builder.
//!
//! Turns an ordered sequence of raw transfer rows into a
//! `TransactionGraph`, deriving per-source behavioural features on the
//! way. Rows that cannot become edges are dropped and reported back,
//! never fatal.
//!
//! Features are computed per source wallet in timestamp order, ties
//! broken by input row order. Edges are inserted in input row order, so
//! the same input always yields the same graph.

use crate::config::FeatureConfig;
use crate::graph::TransactionGraph;
use crate::transfer::{parse_timestamp, RawTransfer, Transfer, TransferFeatures};
use crate::types::Timestamp;
use chrono::Duration;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DropReason {
    UnparseableTimestamp { raw: String },
    InvalidAmount,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnparseableTimestamp { raw } => write!(f, "unparseable timestamp {raw:?}"),
            Self::InvalidAmount => write!(f, "negative or non-finite amount"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedRow {
    pub row_index: usize,
    #[serde(flatten)]
    pub reason: DropReason,
}

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub graph: TransactionGraph,
    pub dropped: Vec<DroppedRow>,
}

pub struct GraphBuilder {
    features: FeatureConfig,
}

impl GraphBuilder {
    pub fn new(features: FeatureConfig) -> Self {
        Self { features }
    }

    pub fn build(&self, rows: &[RawTransfer]) -> BuildOutcome {
        let mut dropped = Vec::new();
        let mut accepted: Vec<(usize, &RawTransfer, Timestamp)> = Vec::with_capacity(rows.len());

        for (row_index, row) in rows.iter().enumerate() {
            if !row.amount.is_finite() || row.amount < 0.0 {
                log::debug!("row {row_index} dropped: invalid amount {}", row.amount);
                dropped.push(DroppedRow { row_index, reason: DropReason::InvalidAmount });
                continue;
            }
            match parse_timestamp(&row.timestamp) {
                Some(ts) => accepted.push((row_index, row, ts)),
                None => {
                    log::debug!("row {row_index} dropped: timestamp {:?}", row.timestamp);
                    dropped.push(DroppedRow {
                        row_index,
                        reason: DropReason::UnparseableTimestamp { raw: row.timestamp.clone() },
                    });
                }
            }
        }

        let features = self.derive_features(&accepted);

        let mut graph = TransactionGraph::default();
        for ((row_index, row, ts), features) in accepted.into_iter().zip(features) {
            graph.add_transfer(Transfer {
                row_index,
                source: row.source_id.clone(),
                dest: row.dest_id.clone(),
                amount: row.amount,
                timestamp: ts,
                token_type: row.token_type.clone(),
                features,
            });
        }

        log::info!(
            "graph built: {} rows in, {} edges, {} wallets, {} dropped",
            rows.len(),
            graph.edge_count(),
            graph.node_count(),
            dropped.len()
        );

        BuildOutcome { graph, dropped }
    }

    /// Features for each accepted row, in the same order as `accepted`.
    fn derive_features(&self, accepted: &[(usize, &RawTransfer, Timestamp)]) -> Vec<TransferFeatures> {
        // `None` when the window cannot be represented; it then spans everything.
        let window = Duration::try_minutes(self.features.burst_window_minutes);

        // Positions into `accepted`, grouped by source wallet.
        let mut by_source: HashMap<&str, Vec<usize>> = HashMap::new();
        for (pos, (_, row, _)) in accepted.iter().enumerate() {
            by_source.entry(row.source_id.as_str()).or_default().push(pos);
        }

        let mut out = vec![
            TransferFeatures {
                time_delta: None,
                repeat_dest: 0,
                self_transfer: false,
                tx_count_10min: 0,
                is_small_tx: false,
            };
            accepted.len()
        ];

        for positions in by_source.values_mut() {
            // Stable sort keeps input order for equal timestamps.
            positions.sort_by_key(|&pos| accepted[pos].2);

            let mut seen_dest: HashMap<&str, u32> = HashMap::new();
            let mut window_start = 0usize;
            let mut prev_ts: Option<Timestamp> = None;

            for (i, &pos) in positions.iter().enumerate() {
                let (_, row, ts) = accepted[pos];

                if let Some(floor) = window.and_then(|w| ts.checked_sub_signed(w)) {
                    while window_start < i && accepted[positions[window_start]].2 < floor {
                        window_start += 1;
                    }
                }

                let repeats = seen_dest.entry(row.dest_id.as_str()).or_insert(0);
                out[pos] = TransferFeatures {
                    time_delta: prev_ts.map(|prev| (ts - prev).num_seconds()),
                    repeat_dest: *repeats,
                    self_transfer: row.source_id == row.dest_id,
                    tx_count_10min: (i - window_start + 1) as u32,
                    is_small_tx: row.amount < self.features.small_tx_cutoff,
                };
                *repeats += 1;
                prev_ts = Some(ts);
            }
        }

        out
    }
}
