//! Claim correlation: maps the opaque token baked into a button back to
//! the notification that advertised the row.
//!
//! `take` is the single mutation point: whoever removes the entry owns the
//! claim, so two taps racing on one row resolve to exactly one winner.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const TOKEN_PREFIX: &str = "take";

/// A notified row waiting for someone to claim it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingClaim {
    /// Absolute sheet row the notification refers to.
    pub row: u32,
    /// Chat the notification was sent to.
    pub chat_id: String,
    /// Message id of the notification, target of the claim edit.
    pub message_id: i64,
    /// Text as advertised, base for the claimed-version edit.
    pub text: String,
}

/// All pending claims, keyed by absolute sheet row.
#[derive(Debug, Default)]
pub struct ClaimBook {
    pending: HashMap<u32, PendingClaim>,
}

impl ClaimBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending claim. Re-registering the same row replaces the
    /// old entry; one row never has two live notifications.
    pub fn register(&mut self, claim: PendingClaim) {
        self.pending.insert(claim.row, claim);
    }

    /// Atomically remove and return the pending claim for a row. `None`
    /// means already claimed or never advertised; callers treat both the
    /// same way.
    pub fn take(&mut self, row: u32) -> Option<PendingClaim> {
        self.pending.remove(&row)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// Token embedded in a claim button for a given row.
pub fn claim_token(row: u32) -> String {
    format!("{TOKEN_PREFIX}{row}")
}

/// Parse a button payload back into a row. Strict: the whole suffix must be
/// an integer, anything else is not a claim.
pub fn parse_token(data: &str) -> Option<u32> {
    data.strip_prefix(TOKEN_PREFIX)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(row: u32) -> PendingClaim {
        PendingClaim {
            row,
            chat_id: "@Lviv_leads".into(),
            message_id: 42,
            text: "New lead: Bob".into(),
        }
    }

    #[test]
    fn test_token_round_trip() {
        assert_eq!(claim_token(3), "take3");
        assert_eq!(parse_token("take3"), Some(3));
        assert_eq!(parse_token(&claim_token(600)), Some(600));
    }

    #[test]
    fn test_parse_token_is_strict() {
        assert_eq!(parse_token("take"), None);
        assert_eq!(parse_token("take12x"), None);
        assert_eq!(parse_token("grab3"), None);
        assert_eq!(parse_token("TAKE3"), None);
        assert_eq!(parse_token(""), None);
    }

    #[test]
    fn test_register_then_take_then_gone() {
        let mut book = ClaimBook::new();
        book.register(claim(5));
        assert_eq!(book.pending_count(), 1);

        let taken = book.take(5).unwrap();
        assert_eq!(taken.message_id, 42);
        // claimed: the same token now resolves to nothing
        assert_eq!(book.take(5), None);
        assert_eq!(book.pending_count(), 0);
    }

    #[test]
    fn test_take_unknown_row() {
        let mut book = ClaimBook::new();
        assert_eq!(book.take(3), None);
    }

    #[test]
    fn test_register_last_write_wins() {
        let mut book = ClaimBook::new();
        book.register(claim(7));
        let mut newer = claim(7);
        newer.message_id = 99;
        book.register(newer);

        assert_eq!(book.pending_count(), 1);
        assert_eq!(book.take(7).unwrap().message_id, 99);
    }
}
