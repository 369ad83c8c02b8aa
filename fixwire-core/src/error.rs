/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Error types for the fixwire FIX session engine.
//!
//! This module provides a unified error hierarchy using `thiserror` for typed,
//! domain-specific errors across all fixwire operations.

use thiserror::Error;

/// Result type alias using [`FixError`] as the error type.
pub type Result<T> = std::result::Result<T, FixError>;

/// Top-level error type for all fixwire operations.
#[derive(Debug, Error)]
pub enum FixError {
    /// Error while parsing an inbound frame.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error while building an outbound frame.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Error while assembling a Logon body.
    #[error("logon error: {0}")]
    Logon(#[from] LogonError),

    /// Error in session layer operations.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// I/O error from the underlying transport.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while parsing an inbound FIX frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Frame buffer is truncated before its trailer.
    #[error("incomplete frame, need more data")]
    Incomplete,

    /// A tag group has no `=` separator before its SOH.
    #[error("malformed field at byte {offset}: missing '='")]
    MalformedField {
        /// Byte offset of the offending group within the frame.
        offset: usize,
    },

    /// A field the session layer requires is absent.
    #[error("missing required field: tag {tag}")]
    MissingRequiredField {
        /// The tag number of the missing field.
        tag: u32,
    },

    /// MsgSeqNum (tag 34) is not a non-negative integer.
    #[error("invalid sequence number: {value:?}")]
    InvalidSeqNum {
        /// The raw value that failed to parse.
        value: String,
    },

    /// Checksum mismatch between the computed and declared values.
    #[error("checksum mismatch: computed {computed}, declared {declared}")]
    ChecksumMismatch {
        /// Checksum computed over the received bytes.
        computed: u8,
        /// Checksum declared in the frame trailer.
        declared: u8,
    },

    /// A field value failed to parse as the requested type.
    #[error("invalid field value for tag {tag}: {reason}")]
    InvalidFieldValue {
        /// The tag number of the field.
        tag: u32,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// A timestamp string does not match the FIX UTC grammar.
    #[error("invalid timestamp: {value:?}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
    },

    /// Invalid UTF-8 in a field value.
    #[error("invalid utf-8 in field: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Errors that occur while building an outbound FIX frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A value contains a byte that cannot appear on the wire.
    #[error("invalid field value for tag {tag}: {reason}")]
    InvalidFieldValue {
        /// The tag number of the field.
        tag: u32,
        /// Description of the disallowed content.
        reason: String,
    },
}

/// Errors raised by a logon strategy while assembling the Logon body.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogonError {
    /// A credential the strategy requires is absent from the configuration.
    #[error("missing credential: {name}")]
    MissingCredential {
        /// Name of the missing `logon_fields` entry.
        name: &'static str,
    },

    /// The strategy rejected a configured parameter.
    #[error("invalid logon parameter {name}: {reason}")]
    InvalidParameter {
        /// Name of the offending `logon_fields` entry.
        name: &'static str,
        /// Description of the problem.
        reason: String,
    },
}

/// Errors in FIX session layer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A session is already registered under the key.
    #[error("session already started: {key}")]
    AlreadyStarted {
        /// The occupied session key.
        key: String,
    },

    /// No session is registered under the key.
    #[error("session not found: {key}")]
    SessionNotFound {
        /// The unknown session key.
        key: String,
    },

    /// The session is not in the `LoggedOn` phase.
    #[error("session not logged on")]
    NotLoggedOn,

    /// The session configuration failed validation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The transport connection failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The session task is gone and its mailbox is closed.
    #[error("session terminated")]
    Terminated,

    /// Logon body assembly failed.
    #[error("logon error: {0}")]
    Logon(#[from] LogonError),

    /// Outbound frame encoding failed.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
}
