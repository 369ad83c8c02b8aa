/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! FIX frame parser.
//!
//! Consumes one complete wire frame and produces an [`InboundMessage`] with
//! every `(tag, value)` pair in wire order, the session-critical header
//! values extracted, and the exact received bytes retained for forensic
//! logging.

use crate::checksum::{checksum, read_checksum};
use crate::encoder::SOH;
use bytes::Bytes;
use fixwire_core::error::DecodeError;
use fixwire_core::message::{InboundMessage, MsgType};
use memchr::memchr;
use std::ops::Range;

/// FIX frame parser.
///
/// By default the declared checksum is carried through without
/// verification. Strict mode rejects frames whose trailer does not match
/// the received bytes, for callers that drop corrupt frames at the session
/// boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameParser {
    strict_checksum: bool,
}

impl FrameParser {
    /// Creates a parser with checksum verification disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether a checksum mismatch rejects the frame.
    #[must_use]
    pub const fn with_strict_checksum(mut self, strict: bool) -> Self {
        self.strict_checksum = strict;
        self
    }

    /// Parses one complete frame.
    ///
    /// # Errors
    /// - `MalformedField` for a group without `=` or with a non-numeric tag
    /// - `Incomplete` for a frame not terminated by SOH
    /// - `MissingRequiredField` when tag 35 or tag 34 is absent
    /// - `InvalidSeqNum` when tag 34 is not a non-negative integer
    /// - `ChecksumMismatch` in strict mode only
    pub fn parse(&self, raw: Bytes) -> Result<InboundMessage, DecodeError> {
        let mut fields: Vec<(u32, Range<usize>)> = Vec::with_capacity(16);
        // Start offset of the "10=" group, once seen.
        let mut trailer_at: Option<usize> = None;

        let mut offset = 0;
        while offset < raw.len() {
            let rest = &raw[offset..];
            let soh = memchr(SOH, rest).ok_or(DecodeError::Incomplete)?;
            let group = &rest[..soh];
            let eq = memchr(b'=', group).ok_or(DecodeError::MalformedField { offset })?;
            let tag =
                parse_tag(&group[..eq]).ok_or(DecodeError::MalformedField { offset })?;

            if tag == 10 {
                trailer_at = Some(offset);
            }
            fields.push((tag, offset + eq + 1..offset + soh));
            offset += soh + 1;
        }

        let msg_type = match self.required_str(&raw, &fields, 35)?.parse::<MsgType>() {
            Ok(mt) => mt,
            Err(never) => match never {},
        };

        let seq_str = self.required_str(&raw, &fields, 34)?;
        let seq_num: u64 = seq_str.parse().map_err(|_| DecodeError::InvalidSeqNum {
            value: seq_str.to_string(),
        })?;

        let poss_dup = field_value(&raw, &fields, 43) == Some(b"Y");

        let complete = trailer_at.is_some();
        if self.strict_checksum {
            let at = trailer_at.ok_or(DecodeError::Incomplete)?;
            let declared = field_value(&raw, &fields, 10)
                .and_then(read_checksum)
                .ok_or_else(|| DecodeError::InvalidFieldValue {
                    tag: 10,
                    reason: "checksum must be three ASCII digits".to_string(),
                })?;
            let computed = checksum(&raw[..at]);
            if computed != declared {
                return Err(DecodeError::ChecksumMismatch { computed, declared });
            }
        }

        Ok(InboundMessage::new(
            raw, msg_type, seq_num, poss_dup, fields, true, complete,
        ))
    }

    fn required_str<'a>(
        &self,
        raw: &'a [u8],
        fields: &[(u32, Range<usize>)],
        tag: u32,
    ) -> Result<&'a str, DecodeError> {
        let bytes = field_value(raw, fields, tag)
            .ok_or(DecodeError::MissingRequiredField { tag })?;
        Ok(std::str::from_utf8(bytes)?)
    }
}

fn field_value<'a>(raw: &'a [u8], fields: &[(u32, Range<usize>)], tag: u32) -> Option<&'a [u8]> {
    fields
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, range)| &raw[range.clone()])
}

/// Parses a tag number from ASCII digits.
fn parse_tag(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 7 {
        return None;
    }
    bytes.iter().try_fold(0u32, |acc, &b| {
        b.is_ascii_digit()
            .then(|| acc * 10 + u32::from(b - b'0'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soh(s: &str) -> Bytes {
        Bytes::from(s.replace('|', "\x01").into_bytes())
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag(b"8"), Some(8));
        assert_eq!(parse_tag(b"10201"), Some(10201));
        assert_eq!(parse_tag(b""), None);
        assert_eq!(parse_tag(b"12a"), None);
        assert_eq!(parse_tag(b"99999999"), None);
    }

    #[test]
    fn test_parse_basic_frame() {
        // Checksum here is deliberately wrong; default parse carries it through.
        let raw = soh(
            "8=FIX.4.4|9=100|35=D|34=42|49=SENDER|56=TARGET|52=20250104-14:30:45|55=BTC-USD|10=123|",
        );
        let msg = FrameParser::new().parse(raw).unwrap();

        assert_eq!(msg.msg_type(), &MsgType::NewOrderSingle);
        assert_eq!(msg.seq_num(), 42);
        assert!(!msg.poss_dup());
        assert!(msg.is_valid());
        assert!(msg.is_complete());
        assert_eq!(msg.field_str(55), Some("BTC-USD"));
        assert_eq!(msg.field_str(49), Some("SENDER"));
    }

    #[test]
    fn test_parse_missing_seq_num() {
        let raw = soh("8=FIX.4.4|35=D|10=123|");
        assert_eq!(
            FrameParser::new().parse(raw).unwrap_err(),
            DecodeError::MissingRequiredField { tag: 34 }
        );
    }

    #[test]
    fn test_parse_missing_msg_type() {
        let raw = soh("8=FIX.4.4|34=5|10=123|");
        assert_eq!(
            FrameParser::new().parse(raw).unwrap_err(),
            DecodeError::MissingRequiredField { tag: 35 }
        );
    }

    #[test]
    fn test_parse_invalid_seq_num() {
        let raw = soh("8=FIX.4.4|35=D|34=abc|10=123|");
        assert!(matches!(
            FrameParser::new().parse(raw).unwrap_err(),
            DecodeError::InvalidSeqNum { .. }
        ));

        let raw = soh("8=FIX.4.4|35=D|34=-1|10=123|");
        assert!(matches!(
            FrameParser::new().parse(raw).unwrap_err(),
            DecodeError::InvalidSeqNum { .. }
        ));
    }

    #[test]
    fn test_parse_malformed_field() {
        let raw = soh("8=FIX.4.4|35D|34=1|10=123|");
        assert!(matches!(
            FrameParser::new().parse(raw).unwrap_err(),
            DecodeError::MalformedField { .. }
        ));
    }

    #[test]
    fn test_parse_truncated_frame() {
        let raw = Bytes::from_static(b"8=FIX.4.4\x0135=D\x0134=1");
        assert_eq!(
            FrameParser::new().parse(raw).unwrap_err(),
            DecodeError::Incomplete
        );
    }

    #[test]
    fn test_parse_poss_dup() {
        let raw = soh("8=FIX.4.4|35=D|34=9|43=Y|10=123|");
        assert!(FrameParser::new().parse(raw).unwrap().poss_dup());

        let raw = soh("8=FIX.4.4|35=D|34=9|43=N|10=123|");
        assert!(!FrameParser::new().parse(raw).unwrap().poss_dup());
    }

    #[test]
    fn test_parse_preserves_wire_order_with_repeats() {
        let raw = soh("8=FIX.4.4|35=X|34=3|268=2|269=0|270=100.1|269=1|270=100.2|10=000|");
        let msg = FrameParser::new().parse(raw).unwrap();

        let tags: Vec<u32> = msg.fields().map(|f| f.tag).collect();
        assert_eq!(tags, vec![8, 35, 34, 268, 269, 270, 269, 270, 10]);

        let sides: Vec<&str> = msg
            .field_values(269)
            .map(|f| f.as_str().unwrap())
            .collect();
        assert_eq!(sides, vec!["0", "1"]);
    }

    #[test]
    fn test_parse_strict_checksum() {
        let body = "35=0|34=1|";
        let head = format!("8=FIX.4.4|9={}|{}", body.len(), body);
        let sum = checksum(&head.replace('|', "\x01").into_bytes());
        let good = soh(&format!("{head}10={:03}|", sum));
        let bad = soh(&format!("{head}10={:03}|", sum.wrapping_add(1)));

        let strict = FrameParser::new().with_strict_checksum(true);
        assert!(strict.parse(good).is_ok());
        assert!(matches!(
            strict.parse(bad).unwrap_err(),
            DecodeError::ChecksumMismatch { .. }
        ));
    }

    #[test]
    fn test_parse_retains_raw_bytes() {
        let raw = soh("8=FIX.4.4|35=0|34=1|10=000|");
        let msg = FrameParser::new().parse(raw.clone()).unwrap();
        assert_eq!(msg.raw(), &raw[..]);
    }
}
