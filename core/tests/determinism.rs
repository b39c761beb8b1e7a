//! Two runs, same input, same config.
//! They must produce byte-identical score sheets.
//! Any divergence is a blocker — do not merge until fixed.

use chrono::{Duration, TimeZone, Utc};
use flowwatch_core::{
    config::EngineConfig,
    engine::AnalysisEngine,
    transfer::RawTransfer,
};

const WALLETS: i64 = 13;

/// A fixed 100-row ledger with a mix of amounts, repeats and self-loops.
fn ledger() -> Vec<RawTransfer> {
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    (0..100i64)
        .map(|i| {
            let src = format!("0xw{:02}", i % WALLETS);
            let dst = format!("0xw{:02}", (i * 7 + 3) % WALLETS);
            let amount = ((i * 37) % 500) as f64 + 0.5;
            let ts = base + Duration::minutes(i * 3 + (i % 5));
            let token = if i % 3 == 0 { "USDT" } else { "ETH" };
            RawTransfer::new(src, dst, amount, ts.to_rfc3339(), token)
        })
        .collect()
}

fn engine() -> AnalysisEngine {
    AnalysisEngine::build(EngineConfig::default()).expect("default config")
}

#[test]
fn same_input_produces_identical_score_sheets() {
    let rows = ledger();
    let a = engine().analyze(&rows);
    let b = engine().analyze(&rows);

    let json_a = a.scores.to_json().expect("serialize a");
    let json_b = b.scores.to_json().expect("serialize b");
    assert_eq!(json_a, json_b, "score sheets diverged between runs");
    assert_eq!(a.graph.edge_count(), 100);
    assert_eq!(a.graph.node_count(), WALLETS as usize);
}

#[test]
fn parallel_detection_matches_sequential() {
    let engine = engine();
    let outcome = engine.build_graph(&ledger());

    let sequential = engine.score(&outcome.graph);
    let parallel = engine.score_parallel(&outcome.graph);
    assert_eq!(sequential, parallel);
    assert_eq!(engine.detect(&outcome.graph), engine.detect_parallel(&outcome.graph));
}

#[test]
fn every_score_is_bounded_and_bucketed() {
    let config = EngineConfig::default();
    let report = engine().analyze(&ledger());
    for (wallet, record) in report.scores.iter() {
        assert!(record.score <= 100, "{wallet} scored {}", record.score);
        let expected = flowwatch_core::scoring::RiskLevel::from_score(record.score, &config.risk);
        assert_eq!(record.level, expected, "{wallet} level mismatch");
        let mut unique = record.reasons.clone();
        unique.dedup();
        assert_eq!(unique.len(), record.reasons.len(), "{wallet} has duplicate reasons");
    }
}

/// One malformed row removes exactly one edge and leaves every wallet
/// not touching that edge untouched.
#[test]
fn one_malformed_row_only_affects_its_own_wallets() {
    let rows = ledger();
    let mut damaged = rows.clone();
    damaged[50].timestamp = "31/31/2024 99:99".into();
    let (src, dst) = (damaged[50].source_id.clone(), damaged[50].dest_id.clone());

    let clean = engine().analyze(&rows);
    let broken = engine().analyze(&damaged);

    assert_eq!(clean.graph.edge_count() - broken.graph.edge_count(), 1);
    assert_eq!(broken.dropped.len(), 1);
    assert_eq!(broken.dropped[0].row_index, 50);

    for (wallet, record) in clean.scores.iter() {
        if *wallet == src || *wallet == dst {
            continue;
        }
        assert_eq!(
            broken.scores.get(wallet),
            Some(record),
            "score for unaffected wallet {wallet} changed"
        );
    }
}
