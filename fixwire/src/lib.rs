/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! # fixwire
//!
//! A client-side FIX 4.4 session engine for Rust.
//!
//! fixwire manages long-lived authenticated sessions against FIX brokers:
//! framing and checksums, sequence numbers, heartbeats, the logon/logout
//! handshake and the administrative responses the protocol mandates.
//! Business decisions stay with the application: payloads, gap recovery and
//! reject handling arrive through a [`SessionHandler`](prelude::SessionHandler)
//! you implement.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fixwire::prelude::*;
//! use std::sync::Arc;
//!
//! let config = SessionConfig::new(
//!     SessionKey::new("broker-a").unwrap(),
//!     "fix.example.com",
//!     9876,
//!     CompId::new("MYFIRM").unwrap(),
//!     CompId::new("BROKER").unwrap(),
//! );
//! start_session(config, Arc::new(MyHandler))?;
//!
//! let mut order = OutboundMessage::new(MsgType::NewOrderSingle);
//! order.set_field(55, "BTC-USD");
//! let written = send_message(&SessionKey::new("broker-a").unwrap(), order).await?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Messages, fields, timestamps and error types
//! - [`codec`]: Tag=value frame encoding and parsing
//! - [`transport`]: Stream framing and the connector seam
//! - [`session`]: The session task, strategies, handler and registry

pub mod core {
    //! Messages, fields, timestamps and error types.
    pub use fixwire_core::*;
}

pub mod codec {
    //! Tag=value frame encoding and parsing.
    pub use fixwire_codec::*;
}

pub mod transport {
    //! Stream framing and the connector seam.
    pub use fixwire_transport::*;
}

pub mod session {
    //! The session task, strategies, handler and registry.
    pub use fixwire_session::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use fixwire_core::{
        CompId, DecodeError, EncodeError, FieldRef, FixError, FixTimestamp, InboundMessage,
        LogonError, MsgType, OutboundMessage, Result, SeqNum, SessionError,
    };

    // Codec
    pub use fixwire_codec::{checksum, display_frame, FrameEncoder, FrameParser};

    // Transport
    pub use fixwire_transport::{BoxedStream, Connector, FrameSplitter, TcpConnector};

    // Session
    pub use fixwire_session::{
        active_sessions, send_message, start_session, start_session_with_connector, stop_session,
        DisconnectReason, LogonStrategy, NullHandler, OnBehalfOf, Phase, SessionConfig,
        SessionHandler, SessionKey, Standard, UsernamePassword,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let _seq = SeqNum::new(1);
        let _ts = FixTimestamp::now();
        let _key = SessionKey::new("smoke").unwrap();
        assert!(MsgType::Logon.is_admin());
    }

    #[test]
    fn test_layers_compose() {
        let mut enc = FrameEncoder::new("FIX.4.4");
        enc.field(35, "0").unwrap();
        enc.field(34, "1").unwrap();
        let frame = enc.finish();
        let msg = FrameParser::new().parse(frame).unwrap();
        assert_eq!(msg.msg_type(), &MsgType::Heartbeat);
    }
}
