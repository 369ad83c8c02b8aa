/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Session event handler interface.
//!
//! The session keeps protocol mechanics to itself and hands everything that
//! needs a business decision to a [`SessionHandler`]: application payloads,
//! sequence gaps, peer rejects, and connection lifecycle. Callbacks run
//! under a failure barrier, so a panicking handler is logged and the
//! session survives. Return values are ignored.
//!
//! Handlers hold whatever state they need across calls; the session does
//! not thread per-session user state through upcalls.

use crate::config::{SessionConfig, SessionKey};
use async_trait::async_trait;
use fixwire_core::message::InboundMessage;
use std::sync::Arc;
use tracing::debug;

/// Why a session left the `LoggedOn` phase.
#[derive(Debug, Clone)]
pub enum DisconnectReason {
    /// The peer sent Logout (35=5); carries its Text (58) if present.
    Logout(Option<String>),
    /// The transport dropped or errored.
    ConnectionLost(String),
    /// The application called `stop_session`.
    Stopped,
}

/// Callbacks a session invokes on its owner.
///
/// None of these may block the session for unbounded time; the session
/// awaits each callback before processing the next inbound frame, which is
/// what keeps dispatch in wire arrival order.
#[async_trait]
pub trait SessionHandler: Send + Sync {
    /// Called when the Logon handshake completes.
    async fn on_logon(&self, session_key: SessionKey, config: Arc<SessionConfig>);

    /// Called for every in-sequence application message.
    async fn on_app_message(
        &self,
        session_key: SessionKey,
        message: InboundMessage,
        config: Arc<SessionConfig>,
    );

    /// Called for session-level events the library does not resolve on its
    /// own: ResendRequest (35=2), Reject (35=3), and every sequence
    /// anomaly. Gap recovery policy lives here.
    async fn on_session_message(
        &self,
        session_key: SessionKey,
        message: InboundMessage,
        config: Arc<SessionConfig>,
    );

    /// Called whenever the session leaves `LoggedOn`.
    async fn on_logout(
        &self,
        session_key: SessionKey,
        reason: DisconnectReason,
        config: Arc<SessionConfig>,
    );
}

/// Handler that logs each event at debug level and otherwise does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHandler;

#[async_trait]
impl SessionHandler for NullHandler {
    async fn on_logon(&self, session_key: SessionKey, _config: Arc<SessionConfig>) {
        debug!(session = %session_key, "logged on");
    }

    async fn on_app_message(
        &self,
        session_key: SessionKey,
        message: InboundMessage,
        _config: Arc<SessionConfig>,
    ) {
        debug!(session = %session_key, msg_type = %message.msg_type(), "application message");
    }

    async fn on_session_message(
        &self,
        session_key: SessionKey,
        message: InboundMessage,
        _config: Arc<SessionConfig>,
    ) {
        debug!(session = %session_key, msg_type = %message.msg_type(), "session message");
    }

    async fn on_logout(
        &self,
        session_key: SessionKey,
        reason: DisconnectReason,
        _config: Arc<SessionConfig>,
    ) {
        debug!(session = %session_key, ?reason, "logged out");
    }
}
