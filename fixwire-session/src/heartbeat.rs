/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Heartbeat timing.
//!
//! Tracks when the session last sent and received bytes, decides when a
//! Heartbeat (35=0) is due, and optionally drives TestRequest probing of a
//! silent peer. The probe side only runs when the session opts in; the
//! default leaves liveness policy to the handler.

use std::time::{Duration, Instant};

/// Extra silence allowed beyond the interval before a probe fires.
const PROBE_GRACE: Duration = Duration::from_secs(1);

/// Heartbeat and probe timing for one connection.
#[derive(Debug)]
pub struct HeartbeatClock {
    /// Negotiated heartbeat interval.
    interval: Duration,
    /// When the session last wrote a frame.
    last_sent: Instant,
    /// When the session last received a frame.
    last_received: Instant,
    /// TestReqID of an outstanding probe, if any.
    pending_probe: Option<String>,
    /// When the outstanding probe was sent.
    probe_sent_at: Option<Instant>,
}

impl HeartbeatClock {
    /// Creates a clock with both marks set to now.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            interval,
            last_sent: now,
            last_received: now,
            pending_probe: None,
            probe_sent_at: None,
        }
    }

    /// Records that a frame was written.
    #[inline]
    pub fn record_sent(&mut self) {
        self.last_sent = Instant::now();
    }

    /// Records that a frame arrived.
    ///
    /// A Heartbeat echoing the outstanding TestReqID clears the pending
    /// probe.
    pub fn record_received(&mut self, is_heartbeat: bool, test_req_id: Option<&str>) {
        self.last_received = Instant::now();

        if is_heartbeat {
            if let (Some(pending), Some(echoed)) = (&self.pending_probe, test_req_id) {
                if pending == echoed {
                    self.pending_probe = None;
                    self.probe_sent_at = None;
                }
            }
        }
    }

    /// Returns true when the outbound side has been quiet for a full
    /// interval and a Heartbeat should go out.
    #[must_use]
    pub fn heartbeat_due(&self) -> bool {
        self.last_sent.elapsed() >= self.interval
    }

    /// Returns true when the peer has been silent long enough to probe and
    /// no probe is outstanding.
    #[must_use]
    pub fn probe_due(&self) -> bool {
        self.pending_probe.is_none() && self.last_received.elapsed() >= self.interval + PROBE_GRACE
    }

    /// Returns true when an outstanding probe went unanswered for a full
    /// interval.
    #[must_use]
    pub fn probe_timed_out(&self) -> bool {
        self.probe_sent_at
            .is_some_and(|sent_at| sent_at.elapsed() >= self.interval)
    }

    /// Records that a TestRequest probe was written.
    pub fn note_probe(&mut self, test_req_id: String) {
        self.pending_probe = Some(test_req_id);
        self.probe_sent_at = Some(Instant::now());
        self.last_sent = Instant::now();
    }

    /// Returns the outstanding TestReqID, if any.
    #[must_use]
    pub fn pending_probe(&self) -> Option<&str> {
        self.pending_probe.as_deref()
    }

    /// Returns the heartbeat interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

/// Generates a TestReqID from the current wall clock.
#[must_use]
pub fn next_test_req_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    format!("PROBE{nanos}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_heartbeat_due_after_interval() {
        let clock = HeartbeatClock::new(Duration::from_millis(10));
        assert!(!clock.heartbeat_due());

        sleep(Duration::from_millis(15));
        assert!(clock.heartbeat_due());
    }

    #[test]
    fn test_record_sent_defers_heartbeat() {
        let mut clock = HeartbeatClock::new(Duration::from_millis(10));
        sleep(Duration::from_millis(15));
        assert!(clock.heartbeat_due());

        clock.record_sent();
        assert!(!clock.heartbeat_due());
    }

    #[test]
    fn test_probe_cleared_by_matching_echo() {
        let mut clock = HeartbeatClock::new(Duration::from_secs(30));

        clock.note_probe("PROBE1".to_string());
        assert_eq!(clock.pending_probe(), Some("PROBE1"));

        // A heartbeat with a different id leaves the probe outstanding.
        clock.record_received(true, Some("OTHER"));
        assert_eq!(clock.pending_probe(), Some("PROBE1"));

        clock.record_received(true, Some("PROBE1"));
        assert!(clock.pending_probe().is_none());
        assert!(!clock.probe_timed_out());
    }

    #[test]
    fn test_probe_due_respects_grace_and_pending() {
        let mut clock = HeartbeatClock::new(Duration::from_millis(5));
        assert!(!clock.probe_due());

        sleep(Duration::from_millis(10));
        // Interval elapsed but the one-second grace has not.
        assert!(!clock.probe_due());

        clock.note_probe("PROBE2".to_string());
        assert!(!clock.probe_due());
    }

    #[test]
    fn test_probe_timeout() {
        let mut clock = HeartbeatClock::new(Duration::from_millis(5));
        assert!(!clock.probe_timed_out());

        clock.note_probe("PROBE3".to_string());
        sleep(Duration::from_millis(10));
        assert!(clock.probe_timed_out());
    }

    #[test]
    fn test_next_test_req_id_format() {
        let id = next_test_req_id();
        assert!(id.starts_with("PROBE"));
        assert!(id.len() > 5);
    }
}
