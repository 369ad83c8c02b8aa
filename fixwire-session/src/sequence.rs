/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Sequence number management.
//!
//! Each direction of a session carries its own counter. The outbound side
//! works in two steps, peek then commit, so tag 34 always matches the
//! counter and the counter only advances for frames actually written to
//! the transport.

use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome of checking an inbound sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceCheck {
    /// The frame carries exactly the expected number.
    InOrder,
    /// The frame's number was already consumed.
    Duplicate {
        /// Expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
    },
    /// Frames are missing between the counter and this frame.
    Gap {
        /// Expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
    },
}

/// Manages the send and receive counters for one session.
#[derive(Debug)]
pub struct SequenceManager {
    /// Number the next outbound frame will carry.
    outbound: AtomicU64,
    /// Number the next inbound frame is expected to carry.
    inbound: AtomicU64,
}

impl SequenceManager {
    /// Creates a manager with both counters at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::with_initial(1, 1)
    }

    /// Creates a manager with explicit starting values.
    #[must_use]
    pub fn with_initial(outbound: u64, inbound: u64) -> Self {
        Self {
            outbound: AtomicU64::new(outbound),
            inbound: AtomicU64::new(inbound),
        }
    }

    /// Returns the number the next outbound frame must carry, without
    /// advancing.
    #[inline]
    #[must_use]
    pub fn peek_outbound(&self) -> u64 {
        self.outbound.load(Ordering::SeqCst)
    }

    /// Advances the outbound counter by one. Call after the frame was
    /// written to the transport.
    #[inline]
    pub fn commit_outbound(&self) {
        self.outbound.fetch_add(1, Ordering::SeqCst);
    }

    /// Resets the outbound counter to 1, for a Logon carrying `141=Y`.
    #[inline]
    pub fn reset_outbound(&self) {
        self.outbound.store(1, Ordering::SeqCst);
    }

    /// Returns the expected inbound sequence number.
    #[inline]
    #[must_use]
    pub fn expected_inbound(&self) -> u64 {
        self.inbound.load(Ordering::SeqCst)
    }

    /// Advances the inbound counter by one. Call only for a frame that
    /// matched the expected number.
    #[inline]
    pub fn advance_inbound(&self) {
        self.inbound.fetch_add(1, Ordering::SeqCst);
    }

    /// Overwrites the inbound counter (SequenceReset, peer `141=Y`).
    #[inline]
    pub fn set_inbound(&self, value: u64) {
        self.inbound.store(value, Ordering::SeqCst);
    }

    /// Classifies an inbound sequence number against the counter.
    #[must_use]
    pub fn check_inbound(&self, received: u64) -> SequenceCheck {
        let expected = self.expected_inbound();
        if received == expected {
            SequenceCheck::InOrder
        } else if received < expected {
            SequenceCheck::Duplicate { expected, received }
        } else {
            SequenceCheck::Gap { expected, received }
        }
    }
}

impl Default for SequenceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_then_commit() {
        let seq = SequenceManager::new();
        assert_eq!(seq.peek_outbound(), 1);
        // Peeking never advances; an aborted write keeps the counter.
        assert_eq!(seq.peek_outbound(), 1);

        seq.commit_outbound();
        assert_eq!(seq.peek_outbound(), 2);
        seq.commit_outbound();
        assert_eq!(seq.peek_outbound(), 3);
    }

    #[test]
    fn test_reset_outbound() {
        let seq = SequenceManager::with_initial(57, 12);
        seq.reset_outbound();
        assert_eq!(seq.peek_outbound(), 1);
        // Inbound counter is untouched by an outbound reset.
        assert_eq!(seq.expected_inbound(), 12);
    }

    #[test]
    fn test_check_inbound() {
        let seq = SequenceManager::with_initial(1, 5);

        assert_eq!(seq.check_inbound(5), SequenceCheck::InOrder);
        assert_eq!(
            seq.check_inbound(3),
            SequenceCheck::Duplicate {
                expected: 5,
                received: 3
            }
        );
        assert_eq!(
            seq.check_inbound(8),
            SequenceCheck::Gap {
                expected: 5,
                received: 8
            }
        );
    }

    #[test]
    fn test_inbound_advancement() {
        let seq = SequenceManager::new();
        for n in 1..=4u64 {
            assert_eq!(seq.check_inbound(n), SequenceCheck::InOrder);
            seq.advance_inbound();
        }
        assert_eq!(seq.expected_inbound(), 5);
    }

    #[test]
    fn test_set_inbound() {
        let seq = SequenceManager::with_initial(1, 5);
        seq.set_inbound(10);
        assert_eq!(seq.expected_inbound(), 10);
    }
}
