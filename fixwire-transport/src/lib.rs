/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! # fixwire-transport
//!
//! Stream framing and transport abstraction for the fixwire FIX 4.4 engine.
//!
//! This crate provides:
//! - **Framing**: [`FrameSplitter`], a `tokio_util` codec that splits the
//!   inbound byte stream into complete frames by declared BodyLength, with
//!   resync over garbage
//! - **Connecting**: the [`Connector`] seam behind which TCP/TLS lives, and
//!   the built-in [`TcpConnector`]

pub mod connector;
pub mod framing;

pub use connector::{BoxedStream, Connector, FixStream, TcpConnector};
pub use framing::{FrameSplitter, FramingError};
