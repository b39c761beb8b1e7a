//! The transaction graph: a directed multigraph keyed by wallet.
//!
//! Parallel edges and self-loops are kept. A self-loop counts once
//! toward in-degree and once toward out-degree. The graph is only
//! mutated by the builder; everything downstream takes `&TransactionGraph`.

use crate::transfer::Transfer;
use crate::types::WalletId;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction::{Incoming, Outgoing};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct TransactionGraph {
    graph: DiGraph<WalletId, Transfer>,
    node_map: HashMap<WalletId, NodeIndex>,
}

impl TransactionGraph {
    fn get_or_add_node(&mut self, wallet: &str) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(wallet) {
            return idx;
        }
        let idx = self.graph.add_node(wallet.to_string());
        self.node_map.insert(wallet.to_string(), idx);
        idx
    }

    pub(crate) fn add_transfer(&mut self, transfer: Transfer) {
        let from = self.get_or_add_node(&transfer.source);
        let to = self.get_or_add_node(&transfer.dest);
        self.graph.add_edge(from, to, transfer);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, wallet: &str) -> bool {
        self.node_map.contains_key(wallet)
    }

    /// Wallets in discovery order.
    pub fn wallets(&self) -> impl Iterator<Item = &WalletId> + '_ {
        self.graph.node_weights()
    }

    /// All transfers in input row order.
    pub fn transfers(&self) -> impl Iterator<Item = &Transfer> + '_ {
        self.graph.edge_weights()
    }

    pub fn out_degree(&self, wallet: &str) -> usize {
        self.node_map
            .get(wallet)
            .map_or(0, |&idx| self.graph.edges_directed(idx, Outgoing).count())
    }

    pub fn in_degree(&self, wallet: &str) -> usize {
        self.node_map
            .get(wallet)
            .map_or(0, |&idx| self.graph.edges_directed(idx, Incoming).count())
    }

    /// Outgoing transfers ordered by timestamp, ties by row order.
    pub fn outgoing(&self, wallet: &str) -> Vec<&Transfer> {
        self.directed(wallet, Outgoing)
    }

    /// Incoming transfers ordered by timestamp, ties by row order.
    pub fn incoming(&self, wallet: &str) -> Vec<&Transfer> {
        self.directed(wallet, Incoming)
    }

    fn directed(&self, wallet: &str, dir: petgraph::Direction) -> Vec<&Transfer> {
        let Some(&idx) = self.node_map.get(wallet) else {
            return Vec::new();
        };
        let mut edges: Vec<&Transfer> = self
            .graph
            .edges_directed(idx, dir)
            .map(|e| e.weight())
            .collect();
        edges.sort_by_key(|t| (t.timestamp, t.row_index));
        edges
    }
}
