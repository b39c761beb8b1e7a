//! CSV rendering for the score sheet, wallet summaries and risk profiles.
//!
//! Pure string rendering; writing files is the caller's business.

use crate::profile::RiskProfile;
use crate::scoring::ScoreSheet;
use crate::summary::WalletSummary;
use std::fmt::Write;

pub const SCORES_HEADER: &str = "Wallet_ID,Suspicion_Score,Risk_Level,Reason";

pub const SUMMARY_HEADER: &str = "Wallet_ID,Incoming_Tx_Count,Outgoing_Tx_Count,Total_Received,\
Total_Sent,Net_Flow,Unique_Senders,Unique_Receivers,Suspicion_Score,Risk_Level,Reason";

pub const PROFILE_HEADER: &str = "Wallet_ID,Tx_Sent,Tx_Received,Risk_Score,Risk_Color";

/// Quote a field when it holds a delimiter, quote or line break.
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// Scores sorted highest first; empty reasons render as "Normal behavior".
pub fn scores_csv(sheet: &ScoreSheet) -> String {
    let mut out = String::from(SCORES_HEADER);
    out.push('\n');
    for (wallet, record) in sheet.ranked() {
        let _ = writeln!(
            out,
            "{},{},{},{}",
            csv_field(wallet),
            record.score,
            record.level,
            csv_field(&record.reason_text())
        );
    }
    out
}

/// Rows are written in the order given. Empty reasons stay empty here.
pub fn summary_csv(rows: &[WalletSummary]) -> String {
    let mut out = String::from(SUMMARY_HEADER);
    out.push('\n');
    for r in rows {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{}",
            csv_field(&r.wallet_id),
            r.incoming_tx_count,
            r.outgoing_tx_count,
            r.total_received,
            r.total_sent,
            r.net_flow,
            r.unique_senders,
            r.unique_receivers,
            r.suspicion_score,
            r.risk_level,
            csv_field(&r.reasons.join(", "))
        );
    }
    out
}

pub fn profile_csv(profiles: &[RiskProfile]) -> String {
    let mut out = String::from(PROFILE_HEADER);
    out.push('\n');
    for p in profiles {
        let _ = writeln!(
            out,
            "{},{},{},{:.1},{}",
            csv_field(&p.wallet_id),
            p.tx_sent,
            p.tx_received,
            p.risk_score,
            p.risk_color
        );
    }
    out
}
