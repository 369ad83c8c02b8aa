/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Process-wide session registry and the public session verbs.
//!
//! The registry maps a short symbolic key to a running session's mailbox,
//! so any thread of the embedding application can send into a session or
//! stop it without holding a direct handle. It is the only shared mutable
//! state in the library; the lock is never held across an await.

use crate::config::{SessionConfig, SessionKey};
use crate::handler::SessionHandler;
use crate::session::{Command, SessionTask};
use fixwire_core::error::SessionError;
use fixwire_core::message::OutboundMessage;
use fixwire_transport::Connector;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Mailbox depth per session.
const MAILBOX_CAPACITY: usize = 64;

lazy_static! {
    static ref REGISTRY: SessionRegistry = SessionRegistry::default();
}

/// Handle to a running session.
struct SessionHandle {
    commands: mpsc::Sender<Command>,
}

/// Concurrency-safe key-to-session map.
#[derive(Default)]
struct SessionRegistry {
    sessions: RwLock<HashMap<SessionKey, SessionHandle>>,
}

impl SessionRegistry {
    /// Inserts a handle, failing if the key is occupied.
    fn insert(&self, key: SessionKey, handle: SessionHandle) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&key) {
            return Err(SessionError::AlreadyStarted {
                key: key.to_string(),
            });
        }
        sessions.insert(key, handle);
        Ok(())
    }

    fn sender(&self, key: &SessionKey) -> Option<mpsc::Sender<Command>> {
        self.sessions
            .read()
            .get(key)
            .map(|handle| handle.commands.clone())
    }

    fn remove(&self, key: &SessionKey) -> bool {
        self.sessions.write().remove(key).is_some()
    }

    fn keys(&self) -> Vec<SessionKey> {
        self.sessions.read().keys().cloned().collect()
    }
}

/// Removes a session's registry entry. Called by the session task on stop
/// and on task exit; removing an absent key is a no-op.
pub(crate) fn deregister(key: &SessionKey) {
    if REGISTRY.remove(key) {
        debug!(session = %key, "deregistered");
    }
}

/// Starts a session over plain TCP.
///
/// Validates the configuration, registers the session under
/// `config.session_key` and spawns its task with counters at 1. The task
/// connects immediately and keeps reconnecting every five seconds until
/// stopped. Must be called from within a Tokio runtime.
///
/// # Errors
/// - `SessionError::Configuration` / `SessionError::Logon` when validation
///   fails
/// - `SessionError::AlreadyStarted` when the key is occupied
pub fn start_session(
    config: SessionConfig,
    handler: Arc<dyn SessionHandler>,
) -> Result<(), SessionError> {
    config.validate()?;
    let key = config.session_key.clone();
    let (commands, mailbox) = mpsc::channel(MAILBOX_CAPACITY);
    REGISTRY.insert(key, SessionHandle { commands })?;
    SessionTask::spawn_tcp(config, handler, mailbox);
    Ok(())
}

/// Starts a session over a caller-supplied transport (TLS, proxies, test
/// doubles).
///
/// # Errors
/// Same as [`start_session`].
pub fn start_session_with_connector(
    config: SessionConfig,
    handler: Arc<dyn SessionHandler>,
    connector: Arc<dyn Connector>,
) -> Result<(), SessionError> {
    config.validate()?;
    let key = config.session_key.clone();
    let (commands, mailbox) = mpsc::channel(MAILBOX_CAPACITY);
    REGISTRY.insert(key, SessionHandle { commands })?;
    SessionTask::spawn(config, handler, connector, mailbox);
    Ok(())
}

/// Sends a user-authored message through a running session.
///
/// The session numbers the frame, prepends standard headers and writes it.
///
/// # Returns
/// The exact bytes written, with SOH rendered as `|` for logging.
///
/// # Errors
/// - `SessionError::SessionNotFound` when no session holds the key
/// - `SessionError::NotLoggedOn` when the session is not in `LoggedOn`
/// - `SessionError::Transport` when the write fails
pub async fn send_message(
    key: &SessionKey,
    message: OutboundMessage,
) -> Result<String, SessionError> {
    let sender = REGISTRY
        .sender(key)
        .ok_or_else(|| SessionError::SessionNotFound {
            key: key.to_string(),
        })?;

    let (ack, response) = oneshot::channel();
    sender
        .send(Command::Send { message, ack })
        .await
        .map_err(|_| SessionError::Terminated)?;
    response.await.map_err(|_| SessionError::Terminated)?
}

/// Stops a session: best-effort Logout, transport close, deregistration.
///
/// # Errors
/// Returns `SessionError::SessionNotFound` when no session holds the key.
pub async fn stop_session(key: &SessionKey) -> Result<(), SessionError> {
    let sender = REGISTRY
        .sender(key)
        .ok_or_else(|| SessionError::SessionNotFound {
            key: key.to_string(),
        })?;

    let (ack, done) = oneshot::channel();
    sender
        .send(Command::Stop { ack })
        .await
        .map_err(|_| SessionError::Terminated)?;
    // The task may already be gone; deregistration happened either way.
    let _ = done.await;
    Ok(())
}

/// Returns the keys of every running session.
#[must_use]
pub fn active_sessions() -> Vec<SessionKey> {
    REGISTRY.keys()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> (SessionHandle, mpsc::Receiver<Command>) {
        let (commands, mailbox) = mpsc::channel(4);
        (SessionHandle { commands }, mailbox)
    }

    #[test]
    fn test_insert_unique() {
        let registry = SessionRegistry::default();
        let key = SessionKey::new("unique").unwrap();

        let (first, _mailbox_a) = handle();
        assert!(registry.insert(key.clone(), first).is_ok());

        let (second, _mailbox_b) = handle();
        assert!(matches!(
            registry.insert(key.clone(), second),
            Err(SessionError::AlreadyStarted { .. })
        ));

        assert!(registry.remove(&key));
        let (third, _mailbox_c) = handle();
        assert!(registry.insert(key, third).is_ok());
    }

    #[test]
    fn test_lookup_and_keys() {
        let registry = SessionRegistry::default();
        let key = SessionKey::new("lookup").unwrap();
        assert!(registry.sender(&key).is_none());

        let (entry, _mailbox) = handle();
        registry.insert(key.clone(), entry).unwrap();
        assert!(registry.sender(&key).is_some());
        assert_eq!(registry.keys(), vec![key.clone()]);

        registry.remove(&key);
        assert!(registry.keys().is_empty());
        assert!(!registry.remove(&key));
    }

    #[tokio::test]
    async fn test_send_message_unknown_key() {
        let key = SessionKey::new("missing").unwrap();
        let message = OutboundMessage::new(fixwire_core::MsgType::NewOrderSingle);
        assert!(matches!(
            send_message(&key, message).await,
            Err(SessionError::SessionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_stop_session_unknown_key() {
        let key = SessionKey::new("missing-too").unwrap();
        assert!(matches!(
            stop_session(&key).await,
            Err(SessionError::SessionNotFound { .. })
        ));
    }
}
