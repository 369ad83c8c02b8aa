/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! # fixwire-core
//!
//! Core types for the fixwire FIX 4.4 session engine.
//!
//! This crate provides:
//! - **Error types**: Unified error hierarchy for decode, encode, logon and
//!   session operations
//! - **Field access**: Zero-copy field references with typed accessors
//! - **Messages**: Parsed inbound frames and the outbound message builder
//! - **Types**: Sequence numbers, component identifiers, FIX UTC timestamps

pub mod error;
pub mod field;
pub mod message;
pub mod types;

pub use error::{DecodeError, EncodeError, FixError, LogonError, Result, SessionError};
pub use field::FieldRef;
pub use message::{InboundMessage, MsgType, OutboundMessage};
pub use types::{CompId, FixTimestamp, SeqNum};
