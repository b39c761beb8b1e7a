//! flow-runner: headless batch runner for flowwatch.
//!
//! Usage:
//!   flow-runner --input data.csv --out outputs
//!   flow-runner --input data.csv --config rules.json --parallel
//!   flow-runner --input data.csv --preset peeling

use anyhow::{bail, Context, Result};
use chrono::SecondsFormat;
use flowwatch_core::{
    config::EngineConfig,
    engine::{AnalysisEngine, AnalysisReport},
    profile::profile_all,
    report::{profile_csv, scores_csv, summary_csv},
    summary::summarize,
    transfer::RawTransfer,
};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;

const COL_SOURCE: &str = "Source_Wallet_ID";
const COL_DEST: &str = "Dest_Wallet_ID";
const COL_AMOUNT: &str = "Amount";
const COL_TIMESTAMP: &str = "Timestamp";
const COL_TOKEN: &str = "Token_Type";

#[derive(serde::Serialize)]
struct RunSummary<'a> {
    input: &'a str,
    rows_read: usize,
    rows_skipped_at_load: usize,
    rows_dropped_by_builder: usize,
    wallets: usize,
    edges: usize,
    high: usize,
    medium: usize,
    low: usize,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let input = string_arg(&args, "--input").unwrap_or("data.csv");
    let out_dir = string_arg(&args, "--out").unwrap_or("outputs");
    let preset = string_arg(&args, "--preset").unwrap_or("default");
    let parallel = args.iter().any(|a| a == "--parallel");

    let config = match string_arg(&args, "--config") {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading config {path}"))?,
        None => match preset {
            "default" => EngineConfig::default(),
            "peeling" => EngineConfig::peeling_chain_preset(),
            other => bail!("unknown preset {other:?} (expected default or peeling)"),
        },
    };

    println!("flowwatch — flow-runner");
    println!("  input:     {input}");
    println!("  out:       {out_dir}");
    println!("  preset:    {preset}");
    println!("  parallel:  {parallel}");
    println!();

    let content = fs::read_to_string(input).with_context(|| format!("Cannot read {input}"))?;
    let (rows, skipped) = parse_transfers(&content)?;

    let engine = AnalysisEngine::build(config)?;
    log::info!("detectors: {}", engine.detector_names().join(", "));

    let report = if parallel {
        let outcome = engine.build_graph(&rows);
        let scores = engine.score_parallel(&outcome.graph);
        AnalysisReport {
            graph: outcome.graph,
            dropped: outcome.dropped,
            scores,
        }
    } else {
        engine.analyze(&rows)
    };

    fs::create_dir_all(out_dir).with_context(|| format!("Cannot create {out_dir}"))?;
    write_outputs(&report, Path::new(out_dir))?;
    print_summary(input, &rows, skipped, &report)?;
    Ok(())
}

fn write_outputs(report: &AnalysisReport, out_dir: &Path) -> Result<()> {
    let scores_path = out_dir.join("suspicion_scores.csv");
    fs::write(&scores_path, scores_csv(&report.scores))?;
    println!("Exported {}", scores_path.display());

    let summary_path = out_dir.join("wallet_summary.csv");
    fs::write(&summary_path, summary_csv(&summarize(&report.graph, &report.scores)))?;
    println!("Exported {}", summary_path.display());

    let profile_path = out_dir.join("wallet_risk_labeled.csv");
    fs::write(&profile_path, profile_csv(&profile_all(&report.graph)))?;
    println!("Exported {}", profile_path.display());

    let json_path = out_dir.join("suspicion_scores.json");
    fs::write(&json_path, report.scores.to_json()?)?;
    println!("Exported {}", json_path.display());
    Ok(())
}

fn print_summary(
    input: &str,
    rows: &[RawTransfer],
    skipped: usize,
    report: &AnalysisReport,
) -> Result<()> {
    let unique: BTreeSet<&str> = rows
        .iter()
        .flat_map(|r| [r.source_id.as_str(), r.dest_id.as_str()])
        .collect();
    let counts = report.scores.level_counts();

    println!();
    println!("=== RUN SUMMARY ===");
    println!("  total transactions: {}", rows.len() + skipped);
    println!("  skipped at load:    {skipped}");
    println!("  dropped by builder: {}", report.dropped.len());
    println!("  unique wallets:     {}", unique.len());
    println!("  graph nodes:        {}", report.graph.node_count());
    println!("  graph edges:        {}", report.graph.edge_count());

    let first = report.graph.transfers().map(|t| t.timestamp).min();
    let last = report.graph.transfers().map(|t| t.timestamp).max();
    if let (Some(first), Some(last)) = (first, last) {
        println!(
            "  time span:          {} .. {}",
            first.to_rfc3339_opts(SecondsFormat::Secs, true),
            last.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }
    println!("  risk levels:        {} high / {} medium / {} low", counts.high, counts.medium, counts.low);

    println!();
    println!("=== TOP WALLETS ===");
    let ranked = report.scores.ranked();
    if ranked.is_empty() {
        println!("  (no wallets scored)");
    }
    for (wallet, record) in ranked.iter().take(10) {
        println!("  {wallet} | {:>3} | {:<6} | {}", record.score, record.level, record.reason_text());
    }

    let summary = RunSummary {
        input,
        rows_read: rows.len(),
        rows_skipped_at_load: skipped,
        rows_dropped_by_builder: report.dropped.len(),
        wallets: report.graph.node_count(),
        edges: report.graph.edge_count(),
        high: counts.high,
        medium: counts.medium,
        low: counts.low,
    };
    log::debug!("run summary: {}", serde_json::to_string(&summary)?);
    Ok(())
}

/// Parse the transfer CSV. Returns the usable rows and the number of
/// rows skipped for missing fields or a bad amount. Timestamps are left
/// for the builder to judge.
fn parse_transfers(content: &str) -> Result<(Vec<RawTransfer>, usize)> {
    let mut lines = split_csv_records(content).into_iter().filter(|l| !l.trim().is_empty());
    let header = lines.next().context("input has no header row")?;
    let columns = split_csv_line(header);
    let index_of = |name: &str| -> Result<usize> {
        columns
            .iter()
            .position(|c| c.trim() == name)
            .with_context(|| format!("missing column {name}"))
    };
    let (src, dst, amt, ts, tok) = (
        index_of(COL_SOURCE)?,
        index_of(COL_DEST)?,
        index_of(COL_AMOUNT)?,
        index_of(COL_TIMESTAMP)?,
        index_of(COL_TOKEN)?,
    );

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (record_no, line) in lines.enumerate() {
        let fields = split_csv_line(line);
        let field = |i: usize| fields.get(i).map(|f| f.trim()).filter(|f| !f.is_empty());

        let (Some(source), Some(dest), Some(amount)) = (field(src), field(dst), field(amt)) else {
            log::warn!("record {}: missing source, destination or amount", record_no + 2);
            skipped += 1;
            continue;
        };
        let amount: f64 = match amount.parse() {
            Ok(a) if a >= 0.0 => a,
            _ => {
                log::warn!("record {}: bad amount {amount:?}", record_no + 2);
                skipped += 1;
                continue;
            }
        };
        rows.push(RawTransfer::new(
            source,
            dest,
            amount,
            field(ts).unwrap_or_default(),
            field(tok).unwrap_or_default(),
        ));
    }
    Ok((rows, skipped))
}

/// Split input into records on line breaks outside double quotes, so a
/// quoted field may span lines. A trailing `\r` is stripped.
fn split_csv_records(content: &str) -> Vec<&str> {
    let mut records = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in content.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '\n' if !in_quotes => {
                records.push(content[start..i].trim_end_matches('\r'));
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < content.len() {
        records.push(content[start..].trim_end_matches('\r'));
    }
    records
}

/// Split one CSV record, honouring double-quoted fields.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
