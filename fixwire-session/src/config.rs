/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Session configuration.
//!
//! One [`SessionConfig`] describes one session endpoint: where to connect,
//! which identities go into the standard headers, how the Logon body is
//! assembled, and the protocol knobs the session honors. Validation runs
//! when the session starts, so a bad configuration fails fast instead of
//! producing a connect loop that can never log on.

use crate::logon::{LogonStrategy, Standard};
use arrayvec::ArrayString;
use fixwire_core::error::SessionError;
use fixwire_core::types::CompId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Maximum length for session keys in bytes.
pub const SESSION_KEY_MAX_LEN: usize = 32;

/// Short symbolic name a running session is registered under.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct SessionKey(ArrayString<SESSION_KEY_MAX_LEN>);

impl SessionKey {
    /// Creates a new session key.
    ///
    /// # Returns
    /// `Some(SessionKey)` if the string fits within the maximum length,
    /// `None` otherwise.
    #[must_use]
    pub fn new(s: &str) -> Option<Self> {
        ArrayString::from(s).ok().map(Self)
    }

    /// Returns the key as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns true if the key is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionKey {
    type Err = arrayvec::CapacityError<()>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArrayString::try_from(s)
            .map(Self)
            .map_err(|_| arrayvec::CapacityError::new(()))
    }
}

/// Configuration for one FIX session.
#[derive(Clone)]
pub struct SessionConfig {
    /// Registry key for this session.
    pub session_key: SessionKey,
    /// Broker DNS name or IP address.
    pub host: String,
    /// Broker TCP port.
    pub port: u16,
    /// BeginString declared in tag 8.
    pub begin_string: String,
    /// SenderCompID (tag 49).
    pub sender_comp_id: CompId,
    /// TargetCompID (tag 56).
    pub target_comp_id: CompId,
    /// Optional SenderSubID (tag 50), omitted from headers when absent.
    pub sender_sub_id: Option<String>,
    /// Heartbeat interval.
    pub heartbeat_interval: Duration,
    /// Opaque options handed to the transport connector (TLS certificates,
    /// verify mode, SNI and so on).
    pub transport_opts: HashMap<String, String>,
    /// Producer of the Logon (35=A) body fields.
    pub logon_strategy: Arc<dyn LogonStrategy>,
    /// Parameters the strategy reads (username, password, ...).
    pub logon_fields: HashMap<String, String>,
    /// Whether inbound frames with a bad checksum are dropped.
    pub validate_checksum: bool,
    /// Maximum inbound frame size in bytes.
    pub max_message_size: usize,
    /// Whether the session probes a silent peer with TestRequest and treats
    /// an unanswered probe as connection loss. Off by default; liveness
    /// policy normally belongs to the handler.
    pub enforce_test_request: bool,
}

impl SessionConfig {
    /// Creates a configuration with required fields and defaults.
    #[must_use]
    pub fn new(
        session_key: SessionKey,
        host: impl Into<String>,
        port: u16,
        sender_comp_id: CompId,
        target_comp_id: CompId,
    ) -> Self {
        Self {
            session_key,
            host: host.into(),
            port,
            begin_string: "FIX.4.4".to_string(),
            sender_comp_id,
            target_comp_id,
            sender_sub_id: None,
            heartbeat_interval: Duration::from_secs(30),
            transport_opts: HashMap::new(),
            logon_strategy: Arc::new(Standard),
            logon_fields: HashMap::new(),
            validate_checksum: true,
            max_message_size: 1024 * 1024,
            enforce_test_request: false,
        }
    }

    /// Sets the BeginString (tag 8).
    #[must_use]
    pub fn with_begin_string(mut self, value: impl Into<String>) -> Self {
        self.begin_string = value.into();
        self
    }

    /// Sets the SenderSubID (tag 50).
    #[must_use]
    pub fn with_sender_sub_id(mut self, value: impl Into<String>) -> Self {
        self.sender_sub_id = Some(value.into());
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, value: Duration) -> Self {
        self.heartbeat_interval = value;
        self
    }

    /// Sets the logon strategy.
    #[must_use]
    pub fn with_logon_strategy(mut self, strategy: Arc<dyn LogonStrategy>) -> Self {
        self.logon_strategy = strategy;
        self
    }

    /// Records a parameter for the logon strategy.
    #[must_use]
    pub fn with_logon_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.logon_fields.insert(name.into(), value.into());
        self
    }

    /// Records an option for the transport connector.
    #[must_use]
    pub fn with_transport_opt(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.transport_opts.insert(name.into(), value.into());
        self
    }

    /// Sets whether inbound frames with a bad checksum are dropped.
    #[must_use]
    pub const fn with_validate_checksum(mut self, value: bool) -> Self {
        self.validate_checksum = value;
        self
    }

    /// Sets the maximum inbound frame size.
    #[must_use]
    pub const fn with_max_message_size(mut self, value: usize) -> Self {
        self.max_message_size = value;
        self
    }

    /// Enables TestRequest probing of a silent peer.
    #[must_use]
    pub const fn with_enforce_test_request(mut self, value: bool) -> Self {
        self.enforce_test_request = value;
        self
    }

    /// Returns the heartbeat interval in whole seconds.
    #[must_use]
    pub fn heartbeat_interval_secs(&self) -> u64 {
        self.heartbeat_interval.as_secs()
    }

    /// Checks the configuration for values that can never log on.
    ///
    /// Also runs the logon strategy once, so a missing credential fails
    /// here instead of inside the connect loop.
    ///
    /// # Errors
    /// Returns `SessionError::Configuration` for an invalid value and
    /// `SessionError::Logon` when the strategy rejects its parameters.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.session_key.is_empty() {
            return Err(SessionError::Configuration(
                "session_key must not be empty".to_string(),
            ));
        }
        if self.host.is_empty() {
            return Err(SessionError::Configuration(
                "host must not be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(SessionError::Configuration(
                "port must not be zero".to_string(),
            ));
        }
        if self.sender_comp_id.is_empty() || self.target_comp_id.is_empty() {
            return Err(SessionError::Configuration(
                "sender_comp_id and target_comp_id must not be empty".to_string(),
            ));
        }
        if self.begin_string.is_empty() {
            return Err(SessionError::Configuration(
                "begin_string must not be empty".to_string(),
            ));
        }
        if self.heartbeat_interval < Duration::from_secs(1) {
            return Err(SessionError::Configuration(
                "heartbeat_interval must be at least one second".to_string(),
            ));
        }

        self.logon_strategy.build_logon_fields(self)?;
        Ok(())
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // logon_fields may carry credentials; show keys only.
        f.debug_struct("SessionConfig")
            .field("session_key", &self.session_key)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("begin_string", &self.begin_string)
            .field("sender_comp_id", &self.sender_comp_id)
            .field("target_comp_id", &self.target_comp_id)
            .field("sender_sub_id", &self.sender_sub_id)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("logon_strategy", &self.logon_strategy)
            .field(
                "logon_fields",
                &self.logon_fields.keys().collect::<Vec<_>>(),
            )
            .field("validate_checksum", &self.validate_checksum)
            .field("max_message_size", &self.max_message_size)
            .field("enforce_test_request", &self.enforce_test_request)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logon::UsernamePassword;
    use fixwire_core::error::LogonError;

    fn base_config() -> SessionConfig {
        SessionConfig::new(
            SessionKey::new("broker-a").unwrap(),
            "fix.example.com",
            9876,
            CompId::new("CLIENT").unwrap(),
            CompId::new("BROKER").unwrap(),
        )
    }

    #[test]
    fn test_config_defaults() {
        let config = base_config();
        assert_eq!(config.begin_string, "FIX.4.4");
        assert_eq!(config.heartbeat_interval_secs(), 30);
        assert!(config.validate_checksum);
        assert!(!config.enforce_test_request);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_chained_setters() {
        let config = base_config()
            .with_begin_string("FIX.4.4")
            .with_sender_sub_id("DESK-7")
            .with_heartbeat_interval(Duration::from_secs(10))
            .with_transport_opt("tls", "true")
            .with_max_message_size(64 * 1024);

        assert_eq!(config.sender_sub_id.as_deref(), Some("DESK-7"));
        assert_eq!(config.heartbeat_interval_secs(), 10);
        assert_eq!(config.transport_opts.get("tls").map(String::as_str), Some("true"));
        assert_eq!(config.max_message_size, 64 * 1024);
    }

    #[test]
    fn test_config_validate_rejects_bad_values() {
        let mut config = base_config();
        config.host.clear();
        assert!(matches!(
            config.validate(),
            Err(SessionError::Configuration(_))
        ));

        let mut config = base_config();
        config.port = 0;
        assert!(config.validate().is_err());

        let config = base_config().with_heartbeat_interval(Duration::from_millis(100));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_runs_strategy() {
        let config = base_config().with_logon_strategy(Arc::new(UsernamePassword));
        assert!(matches!(
            config.validate(),
            Err(SessionError::Logon(LogonError::MissingCredential { .. }))
        ));

        let config = base_config()
            .with_logon_strategy(Arc::new(UsernamePassword))
            .with_logon_field("username", "alice")
            .with_logon_field("password", "hunter2");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_debug_redacts_credentials() {
        let config = base_config().with_logon_field("password", "hunter2");
        let rendered = format!("{config:?}");
        assert!(rendered.contains("password"));
        assert!(!rendered.contains("hunter2"));
    }
}
