/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! FIX frame encoder.
//!
//! Builds complete wire frames from an ordered field list. BeginString
//! (tag 8), BodyLength (tag 9) and CheckSum (tag 10) are computed here;
//! everything between them is appended by the caller in wire order.

use crate::checksum::{checksum, render_checksum};
use bytes::{BufMut, Bytes, BytesMut};
use fixwire_core::error::EncodeError;

/// SOH delimiter used between FIX fields on the wire.
pub const SOH: u8 = 0x01;

/// FIX frame encoder.
///
/// Body fields accumulate in append order; [`FrameEncoder::finish`] wraps
/// them with the header pair and the checksum trailer. Values may not
/// contain SOH or `=`, the two bytes that would corrupt framing.
#[derive(Debug)]
pub struct FrameEncoder {
    /// The BeginString value (e.g. "FIX.4.4").
    begin_string: String,
    /// Accumulated body bytes (everything after `9=...<SOH>`, before `10=`).
    body: BytesMut,
}

impl FrameEncoder {
    /// Creates an encoder for the given protocol version string.
    #[must_use]
    pub fn new(begin_string: impl Into<String>) -> Self {
        Self {
            begin_string: begin_string.into(),
            body: BytesMut::with_capacity(256),
        }
    }

    /// Appends a field with a string value.
    ///
    /// # Errors
    /// Returns `EncodeError::InvalidFieldValue` if the value contains SOH
    /// or `=`.
    pub fn field(&mut self, tag: u32, value: &str) -> Result<(), EncodeError> {
        if let Some(bad) = value.bytes().find(|&b| b == SOH || b == b'=') {
            return Err(EncodeError::InvalidFieldValue {
                tag,
                reason: format!("value contains disallowed byte 0x{bad:02x}"),
            });
        }
        self.raw_field(tag, value.as_bytes());
        Ok(())
    }

    /// Appends a field with an unsigned integer value.
    pub fn uint_field(&mut self, tag: u32, value: u64) {
        let mut buf = itoa::Buffer::new();
        self.raw_field(tag, buf.format(value).as_bytes());
    }

    /// Appends a field with a boolean value (`Y`/`N`).
    pub fn bool_field(&mut self, tag: u32, value: bool) {
        self.raw_field(tag, if value { b"Y" } else { b"N" });
    }

    fn raw_field(&mut self, tag: u32, value: &[u8]) {
        let mut tag_buf = itoa::Buffer::new();
        self.body.put_slice(tag_buf.format(tag).as_bytes());
        self.body.put_u8(b'=');
        self.body.put_slice(value);
        self.body.put_u8(SOH);
    }

    /// Returns the current body length in bytes.
    #[inline]
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Finalizes the frame.
    ///
    /// Emits `8=<BeginString>`, then `9=<BodyLength>` computed over the
    /// rendered body, then the body, then `10=<CheckSum>` computed over
    /// every preceding byte of the frame.
    #[must_use]
    pub fn finish(self) -> Bytes {
        let mut len_buf = itoa::Buffer::new();
        let len_str = len_buf.format(self.body.len());

        let mut frame =
            BytesMut::with_capacity(2 + self.begin_string.len() + 3 + len_str.len() + self.body.len() + 9);
        frame.put_slice(b"8=");
        frame.put_slice(self.begin_string.as_bytes());
        frame.put_u8(SOH);
        frame.put_slice(b"9=");
        frame.put_slice(len_str.as_bytes());
        frame.put_u8(SOH);
        frame.put_slice(&self.body);

        let sum = checksum(&frame);
        frame.put_slice(b"10=");
        frame.put_slice(&render_checksum(sum));
        frame.put_u8(SOH);

        frame.freeze()
    }
}

/// Renders a wire frame for logging, with SOH shown as `|`.
///
/// The substitution exists only for human-readable output; it never
/// appears on the wire.
#[must_use]
pub fn display_frame(frame: &[u8]) -> String {
    frame
        .iter()
        .map(|&b| if b == SOH { '|' } else { b as char })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::read_checksum;

    #[test]
    fn test_encoder_basic() {
        let mut enc = FrameEncoder::new("FIX.4.4");
        enc.field(35, "0").unwrap();

        let frame = enc.finish();
        let rendered = display_frame(&frame);
        assert!(rendered.starts_with("8=FIX.4.4|9=5|35=0|10="));
        assert!(rendered.ends_with('|'));
    }

    #[test]
    fn test_encoder_body_length_counts_internal_sohs() {
        let mut enc = FrameEncoder::new("FIX.4.4");
        enc.field(35, "A").unwrap();
        enc.uint_field(34, 1);
        // body is "35=A|34=1|", ten bytes
        assert_eq!(enc.body_len(), 10);

        let frame = enc.finish();
        assert!(display_frame(&frame).contains("9=10|"));
    }

    #[test]
    fn test_encoder_checksum_matches_sum() {
        let mut enc = FrameEncoder::new("FIX.4.4");
        enc.field(35, "A").unwrap();
        enc.uint_field(34, 1);
        enc.field(49, "S").unwrap();
        enc.field(56, "T").unwrap();
        let frame = enc.finish();

        // Checksum field is the trailing "10=nnn|".
        let trailer = &frame[frame.len() - 7..];
        assert_eq!(&trailer[..3], b"10=");
        let declared = read_checksum(&trailer[3..6]).unwrap();
        assert_eq!(declared, checksum(&frame[..frame.len() - 7]));
    }

    #[test]
    fn test_encoder_spec_checksum_literal() {
        // Body "35=A|34=1|49=S|56=T|" is 20 bytes, so the full prefix is
        // 8=FIX.4.4|9=20|35=A|34=1|49=S|56=T|
        let mut enc = FrameEncoder::new("FIX.4.4");
        enc.field(35, "A").unwrap();
        enc.uint_field(34, 1);
        enc.field(49, "S").unwrap();
        enc.field(56, "T").unwrap();
        let frame = enc.finish();

        let expected = checksum(b"8=FIX.4.4\x019=20\x0135=A\x0134=1\x0149=S\x0156=T\x01");
        let declared = read_checksum(&frame[frame.len() - 4..frame.len() - 1]).unwrap();
        assert_eq!(declared, expected);
    }

    #[test]
    fn test_encoder_rejects_delimiter_bytes() {
        let mut enc = FrameEncoder::new("FIX.4.4");
        assert!(matches!(
            enc.field(58, "a=b"),
            Err(EncodeError::InvalidFieldValue { tag: 58, .. })
        ));
        assert!(enc.field(58, "a\x01b").is_err());
        assert!(enc.field(58, "plain text").is_ok());
    }

    #[test]
    fn test_encoder_bool_field() {
        let mut enc = FrameEncoder::new("FIX.4.4");
        enc.field(35, "A").unwrap();
        enc.bool_field(141, true);
        enc.bool_field(123, false);
        let rendered = display_frame(&enc.finish());
        assert!(rendered.contains("141=Y|"));
        assert!(rendered.contains("123=N|"));
    }

    #[test]
    fn test_display_frame() {
        assert_eq!(display_frame(b"8=FIX.4.4\x0135=0\x01"), "8=FIX.4.4|35=0|");
    }
}
