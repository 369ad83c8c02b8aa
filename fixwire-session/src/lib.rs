/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! # fixwire-session
//!
//! FIX 4.4 session layer for the fixwire engine.
//!
//! This crate provides:
//! - **Session task**: one Tokio task per session owning transport,
//!   sequencing, heartbeats and dispatch
//! - **Logon strategies**: pluggable Logon body assembly
//! - **Handler interface**: the four upcalls business code implements
//! - **Registry**: process-wide key-to-session map behind
//!   [`start_session`], [`send_message`] and [`stop_session`]

pub mod config;
pub mod handler;
pub mod heartbeat;
pub mod logon;
pub mod registry;
pub mod sequence;
mod session;
pub mod state;

pub use config::{SessionConfig, SessionKey};
pub use handler::{DisconnectReason, NullHandler, SessionHandler};
pub use heartbeat::HeartbeatClock;
pub use logon::{LogonStrategy, OnBehalfOf, Standard, UsernamePassword};
pub use registry::{
    active_sessions, send_message, start_session, start_session_with_connector, stop_session,
};
pub use sequence::{SequenceCheck, SequenceManager};
pub use state::Phase;
