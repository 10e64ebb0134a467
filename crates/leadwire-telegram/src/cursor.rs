//! Update dedup cursor.
//!
//! getUpdates is at-least-once: an update acknowledged by offset can still
//! arrive again after a reconnect. The cursor pairs a seen-set (hard
//! guarantee, process lifetime) with a high-water offset (keeps the server
//! feed short). Admission is the single gate in front of every handler.

use std::collections::HashSet;

/// Tracks which update ids were already dispatched.
#[derive(Debug, Default)]
pub struct UpdateCursor {
    seen: HashSet<i64>,
    high_water: Option<i64>,
}

impl UpdateCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit an update id. True exactly once per id; every later call with
    /// the same id is false, whatever order ids arrive in.
    pub fn admit(&mut self, update_id: i64) -> bool {
        let fresh = self.seen.insert(update_id);
        if fresh {
            self.high_water = Some(match self.high_water {
                Some(h) => h.max(update_id),
                None => update_id,
            });
        }
        fresh
    }

    /// Offset to pass to the next getUpdates call, once anything was seen.
    pub fn next_offset(&self) -> Option<i64> {
        self.high_water.map(|h| h + 1)
    }

    /// How many ids were admitted so far.
    pub fn admitted(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_exactly_once() {
        let mut cursor = UpdateCursor::new();
        assert!(cursor.admit(900100));
        assert!(!cursor.admit(900100));
        assert!(!cursor.admit(900100));
        assert_eq!(cursor.admitted(), 1);
    }

    #[test]
    fn test_duplicate_delivery_processed_once() {
        let mut cursor = UpdateCursor::new();
        let mut handled = 0;
        // transport redelivers the same update back to back
        for id in [900200, 900200] {
            if cursor.admit(id) {
                handled += 1;
            }
        }
        assert_eq!(handled, 1);
    }

    #[test]
    fn test_next_offset_tracks_high_water() {
        let mut cursor = UpdateCursor::new();
        assert_eq!(cursor.next_offset(), None);
        cursor.admit(10);
        cursor.admit(12);
        assert_eq!(cursor.next_offset(), Some(13));
        // late redelivery of an older id never rolls the offset back
        cursor.admit(11);
        assert_eq!(cursor.next_offset(), Some(13));
    }

    #[test]
    fn test_out_of_order_ids_still_dedup() {
        let mut cursor = UpdateCursor::new();
        assert!(cursor.admit(5));
        assert!(cursor.admit(3));
        assert!(!cursor.admit(5));
        assert!(!cursor.admit(3));
    }
}
