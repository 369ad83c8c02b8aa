/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Session lifecycle phases.
//!
//! `Disconnected -> Connecting -> LogonSent -> LoggedOn -> LoggingOut ->
//! Disconnected`. Every non-terminal fall back to `Disconnected` schedules
//! a reconnect; the cycle ends only on an explicit stop.

use std::fmt;

/// Lifecycle phase of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No transport connection.
    Disconnected,
    /// Transport connect in progress.
    Connecting,
    /// Logon written, awaiting the peer's Logon reply.
    LogonSent,
    /// Handshake complete; application traffic flows.
    LoggedOn,
    /// Logout written, connection about to close.
    LoggingOut,
}

impl Phase {
    /// Returns true when application messages may be sent.
    #[inline]
    #[must_use]
    pub const fn is_logged_on(self) -> bool {
        matches!(self, Self::LoggedOn)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::LogonSent => "LOGON_SENT",
            Self::LoggedOn => "LOGGED_ON",
            Self::LoggingOut => "LOGGING_OUT",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_is_logged_on() {
        assert!(Phase::LoggedOn.is_logged_on());
        assert!(!Phase::Disconnected.is_logged_on());
        assert!(!Phase::LogonSent.is_logged_on());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::LogonSent.to_string(), "LOGON_SENT");
        assert_eq!(Phase::LoggedOn.to_string(), "LOGGED_ON");
    }
}
