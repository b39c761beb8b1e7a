//! Reporting tests — wallet summaries, risk profiles and CSV output.

use chrono::{Duration, TimeZone, Utc};
use flowwatch_core::{
    config::EngineConfig,
    engine::{AnalysisEngine, AnalysisReport},
    profile::{profile_all, profile_wallet, RiskColor},
    report::{profile_csv, scores_csv, summary_csv, SCORES_HEADER},
    scoring::RiskLevel,
    summary::{summarize, summarize_wallet},
    transfer::RawTransfer,
};

fn at(minutes: i64) -> String {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (base + Duration::minutes(minutes)).to_rfc3339()
}

fn tx(src: &str, dst: &str, amount: f64, minutes: i64) -> RawTransfer {
    RawTransfer::new(src, dst, amount, at(minutes), "ETH")
}

fn analyze(rows: &[RawTransfer]) -> AnalysisReport {
    AnalysisEngine::build(EngineConfig::default())
        .expect("default config")
        .analyze(rows)
}

// ── Wallet summary ───────────────────────────────────────────────────────────

#[test]
fn summary_counts_totals_and_net_flow() {
    let rows = vec![
        tx("a", "b", 100.0, 0),
        tx("a", "b", 50.0, 120),
        tx("b", "c", 30.0, 240),
        tx("c", "a", 10.0, 360),
    ];
    let report = analyze(&rows);
    let b = summarize_wallet(&report.graph, &report.scores, "b");

    assert_eq!(b.incoming_tx_count, 2);
    assert_eq!(b.outgoing_tx_count, 1);
    assert_eq!(b.total_received, 150.0);
    assert_eq!(b.total_sent, 30.0);
    assert_eq!(b.net_flow, 120.0);
    assert_eq!(b.unique_senders, 1);
    assert_eq!(b.unique_receivers, 1);

    // c relays one in, one out.
    let c = summarize_wallet(&report.graph, &report.scores, "c");
    assert_eq!(c.suspicion_score, 40);
    assert_eq!(c.risk_level, RiskLevel::Medium);
    assert_eq!(c.reasons, vec!["Peeling chain detected"]);
    assert_eq!(c.net_flow, 20.0);
}

#[test]
fn summaries_are_ranked_by_score() {
    let mut rows: Vec<RawTransfer> = (0..6).map(|i| tx("hub", &format!("d{i}"), 500.0, i * 120)).collect();
    rows.push(tx("x", "y", 500.0, 0));
    let report = analyze(&rows);

    let summaries = summarize(&report.graph, &report.scores);
    assert_eq!(summaries.len(), report.graph.node_count());
    assert_eq!(summaries[0].wallet_id, "hub");
    assert!(summaries.windows(2).all(|w| w[0].suspicion_score >= w[1].suspicion_score));
}

// ── Risk profile ─────────────────────────────────────────────────────────────

#[test]
fn collector_gets_mule_bonus() {
    let rows: Vec<RawTransfer> = (0..5).map(|i| tx(&format!("s{i}"), "sink", 500.0, i * 120)).collect();
    let report = analyze(&rows);

    let p = profile_wallet(&report.graph, "sink");
    assert_eq!((p.tx_sent, p.tx_received), (0, 5));
    assert_eq!(p.risk_score, 15.0);
    assert_eq!(p.risk_color, RiskColor::Green);
}

#[test]
fn small_rapid_sends_get_smurf_bonus() {
    let rows: Vec<RawTransfer> = (0..5).map(|i| tx("s", &format!("d{i}"), 10.0, i)).collect();
    let report = analyze(&rows);

    let p = profile_wallet(&report.graph, "s");
    assert_eq!(p.small_tx_ratio, 1.0);
    assert_eq!(p.peak_tx_count_10min, 5);
    // 30 (ratio) + 15 (burst) + 20 (smurf bonus)
    assert_eq!(p.risk_score, 65.0);
    assert_eq!(p.risk_color, RiskColor::Yellow);
}

#[test]
fn repeats_and_self_transfers_add_up() {
    let rows = vec![
        tx("r", "d", 500.0, 0),
        tx("r", "d", 500.0, 60),
        tx("r", "d", 500.0, 120),
        tx("w", "w", 500.0, 0),
        tx("w", "w", 500.0, 120),
    ];
    let report = analyze(&rows);

    // burst 1*3 + repeats (0+1+2)*2
    assert_eq!(profile_wallet(&report.graph, "r").risk_score, 9.0);
    // burst 1*3 + repeats 1*2 + self 2*10
    assert_eq!(profile_wallet(&report.graph, "w").risk_score, 25.0);
}

#[test]
fn profile_is_capped_and_separate_from_rule_scores() {
    let rows: Vec<RawTransfer> = (0..6).map(|i| tx("z", "z", 5.0, i)).collect();
    let report = analyze(&rows);
    let before = report.scores.clone();

    let profiles = profile_all(&report.graph);
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].risk_score, 100.0);
    assert_eq!(profiles[0].risk_color, RiskColor::Red);
    assert_eq!(report.scores, before);
}

// ── CSV ──────────────────────────────────────────────────────────────────────

#[test]
fn scores_csv_quotes_joined_reasons() {
    let rows: Vec<RawTransfer> = (0..5).map(|i| tx("s", &format!("d{i}"), 10.0, i * 120)).collect();
    let report = analyze(&rows);
    let csv = scores_csv(&report.scores);

    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some(SCORES_HEADER));
    assert_eq!(lines.next(), Some("s,70,High,\"Heavy fan-out, Smurfing pattern\""));
    assert_eq!(lines.next(), Some("d0,0,Low,Normal behavior"));
    assert_eq!(csv.lines().count(), 1 + report.scores.len());
}

#[test]
fn summary_and_profile_csv_have_one_line_per_wallet() {
    let rows = vec![tx("a", "b", 100.0, 0), tx("b", "c", 30.0, 240)];
    let report = analyze(&rows);

    let summary = summary_csv(&summarize(&report.graph, &report.scores));
    assert_eq!(summary.lines().count(), 4);
    assert!(summary.lines().nth(1).unwrap().starts_with("b,1,1,100,30,70,1,1,40,Medium,"));

    let profile = profile_csv(&profile_all(&report.graph));
    assert_eq!(profile.lines().count(), 4);
    assert!(profile.lines().any(|l| l == "a,1,0,3.0,GREEN"));
}
