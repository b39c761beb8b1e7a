//! Transfer records: the raw input row and the validated graph edge.

use crate::types::{Amount, Timestamp, WalletId};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One input row as handed over by the loading layer.
/// The timestamp is still unparsed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransfer {
    pub source_id: WalletId,
    pub dest_id: WalletId,
    pub amount: Amount,
    pub timestamp: String,
    pub token_type: String,
}

impl RawTransfer {
    pub fn new(
        source_id: impl Into<WalletId>,
        dest_id: impl Into<WalletId>,
        amount: Amount,
        timestamp: impl Into<String>,
        token_type: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            dest_id: dest_id.into(),
            amount,
            timestamp: timestamp.into(),
            token_type: token_type.into(),
        }
    }
}

/// Behavioural features derived per source wallet during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFeatures {
    /// Seconds since the source's previous outgoing transfer.
    /// `None` for the source's first transfer.
    pub time_delta: Option<i64>,
    /// Prior transfers from this source to this same destination.
    pub repeat_dest: u32,
    pub self_transfer: bool,
    /// Outgoing transfers of this source in the trailing burst window,
    /// this one included.
    pub tx_count_10min: u32,
    pub is_small_tx: bool,
}

/// A validated transfer: one directed edge of the transaction graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    /// Position of the originating row in the input sequence.
    pub row_index: usize,
    pub source: WalletId,
    pub dest: WalletId,
    pub amount: Amount,
    pub timestamp: Timestamp,
    pub token_type: String,
    pub features: TransferFeatures,
}

const NAIVE_DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Parse a timestamp as RFC 3339 or one of the common naive layouts
/// (taken as UTC). Returns `None` when nothing matches.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_supported_layouts() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        for raw in [
            "2024-03-01T12:30:00Z",
            "2024-03-01T14:30:00+02:00",
            "2024-03-01 12:30:00",
            "2024-03-01T12:30:00.000",
            "2024-03-01 12:30",
            " 2024/03/01 12:30:00 ",
        ] {
            assert_eq!(parse_timestamp(raw), Some(expected), "layout {raw:?}");
        }
        assert_eq!(
            parse_timestamp("2024-03-01"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn rejects_garbage() {
        for raw in ["", "   ", "not-a-date", "2024-13-01 00:00:00", "NaT"] {
            assert_eq!(parse_timestamp(raw), None, "input {raw:?}");
        }
    }
}
