//! Shared primitive types used across the entire engine.

use chrono::{DateTime, Utc};

/// An opaque wallet address. Wallets exist only as transfer endpoints.
pub type WalletId = String;

/// An absolute instant on the transfer timeline.
pub type Timestamp = DateTime<Utc>;

/// A token movement amount. Never negative once inside the graph.
pub type Amount = f64;

/// A suspicion score in [0, 100].
pub type Score = u32;

/// Upper bound of every suspicion score.
pub const MAX_SCORE: Score = 100;
