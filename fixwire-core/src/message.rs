/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Message types for the FIX session layer.
//!
//! This module provides:
//! - [`MsgType`]: Enumeration of FIX message types the session dispatches on
//! - [`InboundMessage`]: Owned, parsed form of a received wire frame
//! - [`OutboundMessage`]: Builder for user-authored messages

use crate::field::FieldRef;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::ops::Range;

/// FIX message types.
///
/// The administrative types drive the session state machine; the named
/// application types cover the messages this library's users trade and
/// stream market data with. Anything else is `Custom(String)` and is routed
/// to the application handler untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MsgType {
    /// Heartbeat (0) - Session level.
    #[default]
    Heartbeat,
    /// Test Request (1) - Session level.
    TestRequest,
    /// Resend Request (2) - Session level.
    ResendRequest,
    /// Reject (3) - Session level.
    Reject,
    /// Sequence Reset (4) - Session level.
    SequenceReset,
    /// Logout (5) - Session level.
    Logout,
    /// Logon (A) - Session level.
    Logon,
    /// Execution Report (8).
    ExecutionReport,
    /// Order Cancel Reject (9).
    OrderCancelReject,
    /// News (B).
    News,
    /// New Order Single (D).
    NewOrderSingle,
    /// Order Cancel Request (F).
    OrderCancelRequest,
    /// Order Status Request (H).
    OrderStatusRequest,
    /// Quote Request (R).
    QuoteRequest,
    /// Quote (S).
    Quote,
    /// Market Data Request (V).
    MarketDataRequest,
    /// Market Data Snapshot/Full Refresh (W).
    MarketDataSnapshot,
    /// Market Data Incremental Refresh (X).
    MarketDataIncremental,
    /// Market Data Request Reject (Y).
    MarketDataRequestReject,
    /// Business Message Reject (j).
    BusinessMessageReject,
    /// Request For Positions (AN).
    RequestForPositions,
    /// Position Report (AP).
    PositionReport,
    /// Any other message type.
    Custom(String),
}

impl std::str::FromStr for MsgType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "0" => Self::Heartbeat,
            "1" => Self::TestRequest,
            "2" => Self::ResendRequest,
            "3" => Self::Reject,
            "4" => Self::SequenceReset,
            "5" => Self::Logout,
            "A" => Self::Logon,
            "8" => Self::ExecutionReport,
            "9" => Self::OrderCancelReject,
            "B" => Self::News,
            "D" => Self::NewOrderSingle,
            "F" => Self::OrderCancelRequest,
            "H" => Self::OrderStatusRequest,
            "R" => Self::QuoteRequest,
            "S" => Self::Quote,
            "V" => Self::MarketDataRequest,
            "W" => Self::MarketDataSnapshot,
            "X" => Self::MarketDataIncremental,
            "Y" => Self::MarketDataRequestReject,
            "j" => Self::BusinessMessageReject,
            "AN" => Self::RequestForPositions,
            "AP" => Self::PositionReport,
            other => Self::Custom(other.to_string()),
        })
    }
}

impl MsgType {
    /// Returns the wire representation of this message type (tag 35 value).
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Heartbeat => "0",
            Self::TestRequest => "1",
            Self::ResendRequest => "2",
            Self::Reject => "3",
            Self::SequenceReset => "4",
            Self::Logout => "5",
            Self::Logon => "A",
            Self::ExecutionReport => "8",
            Self::OrderCancelReject => "9",
            Self::News => "B",
            Self::NewOrderSingle => "D",
            Self::OrderCancelRequest => "F",
            Self::OrderStatusRequest => "H",
            Self::QuoteRequest => "R",
            Self::Quote => "S",
            Self::MarketDataRequest => "V",
            Self::MarketDataSnapshot => "W",
            Self::MarketDataIncremental => "X",
            Self::MarketDataRequestReject => "Y",
            Self::BusinessMessageReject => "j",
            Self::RequestForPositions => "AN",
            Self::PositionReport => "AP",
            Self::Custom(s) => s.as_str(),
        }
    }

    /// Returns true if this is an administrative (session-level) message.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Self::Heartbeat
                | Self::TestRequest
                | Self::ResendRequest
                | Self::Reject
                | Self::SequenceReset
                | Self::Logout
                | Self::Logon
        )
    }

    /// Returns true if this is an application message.
    #[must_use]
    pub fn is_app(&self) -> bool {
        !self.is_admin()
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Owned, parsed form of a received wire frame.
///
/// Holds the exact received bytes plus offsets for every `(tag, value)`
/// pair in wire order, headers and trailer included. Field order is
/// preserved because repeating-group semantics are positional.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// The exact received frame.
    raw: Bytes,
    /// The parsed message type (tag 35).
    msg_type: MsgType,
    /// The message sequence number (tag 34).
    seq_num: u64,
    /// True iff tag 43 equals `Y`.
    poss_dup: bool,
    /// Field offsets in wire order: (tag, value range into `raw`).
    fields: Vec<(u32, Range<usize>)>,
    /// True if the frame parsed without a structural or field error.
    valid: bool,
    /// True if the frame carried a trailer and a terminating SOH.
    complete: bool,
}

impl InboundMessage {
    /// Assembles a parsed message. Used by the frame parser.
    #[must_use]
    pub fn new(
        raw: Bytes,
        msg_type: MsgType,
        seq_num: u64,
        poss_dup: bool,
        fields: Vec<(u32, Range<usize>)>,
        valid: bool,
        complete: bool,
    ) -> Self {
        Self {
            raw,
            msg_type,
            seq_num,
            poss_dup,
            fields,
            valid,
            complete,
        }
    }

    /// Returns the message type.
    #[inline]
    #[must_use]
    pub fn msg_type(&self) -> &MsgType {
        &self.msg_type
    }

    /// Returns the message sequence number (tag 34).
    #[inline]
    #[must_use]
    pub const fn seq_num(&self) -> u64 {
        self.seq_num
    }

    /// Returns true iff the frame carried `43=Y`.
    ///
    /// Advisory only. The session never counts a duplicate sequence number
    /// as progress regardless of this flag.
    #[inline]
    #[must_use]
    pub const fn poss_dup(&self) -> bool {
        self.poss_dup
    }

    /// Returns true if the frame parsed without a structural or field
    /// error. Not a checksum verdict; checksum enforcement is a parser
    /// option.
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns true if the frame carried a full trailer.
    #[inline]
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    /// Returns the exact received frame bytes.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Returns an iterator over all fields in wire order.
    pub fn fields(&self) -> impl Iterator<Item = FieldRef<'_>> {
        self.fields
            .iter()
            .map(|(tag, range)| FieldRef::new(*tag, &self.raw[range.clone()]))
    }

    /// Returns the number of fields in the message.
    #[inline]
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns the first field with the given tag.
    #[must_use]
    pub fn field(&self, tag: u32) -> Option<FieldRef<'_>> {
        self.fields().find(|f| f.tag == tag)
    }

    /// Returns the first value for the tag as a string.
    #[must_use]
    pub fn field_str(&self, tag: u32) -> Option<&str> {
        self.field(tag).and_then(|f| f.as_str().ok())
    }

    /// Returns every value carried under the tag, in wire order.
    pub fn field_values(&self, tag: u32) -> impl Iterator<Item = FieldRef<'_>> {
        self.fields().filter(move |f| f.tag == tag)
    }
}

/// A user-authored message awaiting transmission.
///
/// The builder records the message type (tag 35) and an ordered sequence of
/// body fields; the session prepends standard headers and the trailer at
/// send time. Repeated writes to the same tag extend an ordered list that
/// flattens back into contiguous repeated entries on the wire, which
/// reproduces FIX repeating-group semantics without schema awareness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    msg_type: MsgType,
    fields: Vec<OutboundField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OutboundField {
    tag: u32,
    values: SmallVec<[String; 1]>,
}

impl OutboundMessage {
    /// Creates a new message with the given type and no body fields.
    #[must_use]
    pub fn new(msg_type: MsgType) -> Self {
        Self {
            msg_type,
            fields: Vec::new(),
        }
    }

    /// Returns the message type.
    #[inline]
    #[must_use]
    pub fn msg_type(&self) -> &MsgType {
        &self.msg_type
    }

    /// Sets a body field.
    ///
    /// The first write for a tag records a single value at the current
    /// insertion position. Later writes for the same tag append to that
    /// tag's ordered value list.
    pub fn set_field(&mut self, tag: u32, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self.fields.iter_mut().find(|f| f.tag == tag) {
            Some(field) => field.values.push(value),
            None => self.fields.push(OutboundField {
                tag,
                values: SmallVec::from_elem(value, 1),
            }),
        }
        self
    }

    /// Sets several body fields at once, in iteration order.
    pub fn set_fields<I, V>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = (u32, V)>,
        V: Into<String>,
    {
        for (tag, value) in fields {
            self.set_field(tag, value);
        }
        self
    }

    /// Returns the first value recorded for the tag.
    #[must_use]
    pub fn get_field(&self, tag: u32) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.tag == tag)
            .and_then(|f| f.values.first())
            .map(String::as_str)
    }

    /// Returns every value recorded for the tag, in write order.
    #[must_use]
    pub fn get_field_values(&self, tag: u32) -> &[String] {
        self.fields
            .iter()
            .find(|f| f.tag == tag)
            .map_or(&[], |f| f.values.as_slice())
    }

    /// Returns true if at least one value is recorded for the tag.
    #[must_use]
    pub fn has_field(&self, tag: u32) -> bool {
        self.fields.iter().any(|f| f.tag == tag)
    }

    /// Removes every value recorded for the tag.
    ///
    /// # Returns
    /// True if the tag was present.
    pub fn remove_field(&mut self, tag: u32) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.tag != tag);
        self.fields.len() != before
    }

    /// Returns the number of distinct tags recorded.
    #[inline]
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no body fields are recorded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Flattens the body into wire-order `(tag, value)` pairs.
    ///
    /// Repeated values for one tag come out contiguously at the tag's
    /// first-insertion position, preserving write order.
    pub fn wire_fields(&self) -> impl Iterator<Item = (u32, &str)> {
        self.fields
            .iter()
            .flat_map(|f| f.values.iter().map(move |v| (f.tag, v.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msg_type_round_trip() {
        for s in ["0", "1", "2", "3", "4", "5", "A", "8", "W", "AN"] {
            let mt: MsgType = s.parse().unwrap();
            assert_eq!(mt.as_str(), s);
        }
    }

    #[test]
    fn test_msg_type_is_admin() {
        assert!(MsgType::Heartbeat.is_admin());
        assert!(MsgType::Logon.is_admin());
        assert!(MsgType::SequenceReset.is_admin());
        assert!(!MsgType::ExecutionReport.is_admin());
        assert!(MsgType::MarketDataSnapshot.is_app());
    }

    #[test]
    fn test_msg_type_custom() {
        let custom: MsgType = "UXX".parse().unwrap();
        assert!(matches!(custom, MsgType::Custom(_)));
        assert_eq!(custom.as_str(), "UXX");
    }

    #[test]
    fn test_inbound_field_access() {
        // 8=FIX.4.4|35=W|55=BTC-USD|
        let raw = Bytes::from_static(b"8=FIX.4.4\x0135=W\x0155=BTC-USD\x01");
        let fields = vec![(8, 2..9), (35, 13..14), (55, 18..25)];
        let msg = InboundMessage::new(
            raw,
            MsgType::MarketDataSnapshot,
            7,
            false,
            fields,
            true,
            true,
        );

        assert_eq!(msg.field_str(8), Some("FIX.4.4"));
        assert_eq!(msg.field_str(55), Some("BTC-USD"));
        assert_eq!(msg.field_str(999), None);
        assert_eq!(msg.field_count(), 3);
        assert_eq!(msg.seq_num(), 7);
        assert!(!msg.poss_dup());
    }

    #[test]
    fn test_outbound_repeated_tag_law() {
        let mut msg = OutboundMessage::new(MsgType::MarketDataRequest);
        msg.set_field(267, "0");
        msg.set_field(267, "1");
        msg.set_field(267, "2");

        assert_eq!(msg.get_field(267), Some("0"));
        assert_eq!(msg.get_field_values(267), &["0", "1", "2"]);
    }

    #[test]
    fn test_outbound_wire_order_with_repeats() {
        let mut msg = OutboundMessage::new(MsgType::MarketDataRequest);
        msg.set_field(262, "req-1");
        msg.set_field(267, "0");
        msg.set_field(146, "1");
        msg.set_field(267, "1");

        let flat: Vec<(u32, &str)> = msg.wire_fields().collect();
        assert_eq!(
            flat,
            vec![(262, "req-1"), (267, "0"), (267, "1"), (146, "1")]
        );
    }

    #[test]
    fn test_outbound_remove_and_query() {
        let mut msg = OutboundMessage::new(MsgType::NewOrderSingle);
        msg.set_fields([(55, "BTC-USD"), (54, "1")]);

        assert!(msg.has_field(55));
        assert!(msg.remove_field(55));
        assert!(!msg.has_field(55));
        assert!(!msg.remove_field(55));
        assert_eq!(msg.field_count(), 1);
    }
}
