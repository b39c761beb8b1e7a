//! The analysis engine: builder → detectors → aggregator.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Fan-out
//!   2. Fan-in
//!   3. Wash trading
//!   4. Burst
//!   5. Smurfing
//!   6. Peeling chain
//!   7. Fast consecutive
//!
//! RULES:
//!   - The graph is fully built before any detector runs.
//!   - Detectors only read the graph; none sees another's output.
//!   - Aggregation waits for every detector, then merges by addition.
//!   - Every run returns a fresh score sheet. Nothing carries over.

use crate::{
    builder::{BuildOutcome, DroppedRow, GraphBuilder},
    config::EngineConfig,
    detector::{DetectionResult, Detector},
    error::FlowResult,
    graph::TransactionGraph,
    patterns::standard_detectors,
    scoring::{ScoreAggregator, ScoreSheet},
    transfer::RawTransfer,
};

/// Everything one analysis run produces.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub graph: TransactionGraph,
    pub dropped: Vec<DroppedRow>,
    pub scores: ScoreSheet,
}

pub struct AnalysisEngine {
    config: EngineConfig,
    detectors: Vec<Box<dyn Detector>>,
}

impl AnalysisEngine {
    /// An engine with no detectors. Fails if `config` is invalid.
    pub fn new(config: EngineConfig) -> FlowResult<Self> {
        if let Err(e) = config.validate() {
            log::warn!("configuration rejected: {e}");
            return Err(e);
        }
        Ok(Self {
            config,
            detectors: Vec::new(),
        })
    }

    /// Build a fully wired engine with every enabled detector registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(config: EngineConfig) -> FlowResult<Self> {
        let mut engine = Self::new(config)?;
        for detector in standard_detectors(&engine.config.detectors) {
            engine.register(detector);
        }
        Ok(engine)
    }

    /// Register a detector. A detector of the same kind is replaced.
    pub fn register(&mut self, detector: Box<dyn Detector>) {
        if let Some(slot) = self.detectors.iter_mut().find(|d| d.kind() == detector.kind()) {
            log::warn!("replacing registered detector {}", detector.name());
            *slot = detector;
        } else {
            self.detectors.push(detector);
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    pub fn build_graph(&self, rows: &[RawTransfer]) -> BuildOutcome {
        GraphBuilder::new(self.config.features.clone()).build(rows)
    }

    /// Run every detector, one after another.
    pub fn detect(&self, graph: &TransactionGraph) -> Vec<DetectionResult> {
        self.detectors.iter().map(|d| d.detect(graph)).collect()
    }

    /// Run every detector on its own scoped thread.
    /// Produces the same results as `detect`.
    pub fn detect_parallel(&self, graph: &TransactionGraph) -> Vec<DetectionResult> {
        std::thread::scope(|s| {
            let handles: Vec<_> = self
                .detectors
                .iter()
                .map(|d| s.spawn(move || d.detect(graph)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        })
    }

    pub fn score(&self, graph: &TransactionGraph) -> ScoreSheet {
        let results = self.detect(graph);
        self.aggregator().aggregate(graph.wallets(), &results)
    }

    pub fn score_parallel(&self, graph: &TransactionGraph) -> ScoreSheet {
        let results = self.detect_parallel(graph);
        self.aggregator().aggregate(graph.wallets(), &results)
    }

    /// Build the graph from `rows` and score it.
    pub fn analyze(&self, rows: &[RawTransfer]) -> AnalysisReport {
        let BuildOutcome { graph, dropped } = self.build_graph(rows);
        let scores = self.score(&graph);
        AnalysisReport { graph, dropped, scores }
    }

    fn aggregator(&self) -> ScoreAggregator {
        ScoreAggregator::new(self.config.risk)
    }
}
