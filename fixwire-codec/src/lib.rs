/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! # fixwire-codec
//!
//! Tag=value wire codec for the fixwire FIX 4.4 engine.
//!
//! This crate provides:
//! - **Encoding**: [`FrameEncoder`] builds complete frames with BodyLength
//!   and CheckSum computed over the rendered bytes
//! - **Parsing**: [`FrameParser`] turns one complete frame into an
//!   [`fixwire_core::InboundMessage`]
//! - **Checksum**: sum-mod-256 arithmetic and the three-digit rendering

pub mod checksum;
pub mod decoder;
pub mod encoder;

pub use checksum::{checksum, read_checksum, render_checksum};
pub use decoder::FrameParser;
pub use encoder::{display_frame, FrameEncoder, SOH};

#[cfg(test)]
mod tests {
    use super::*;
    use fixwire_core::MsgType;

    #[test]
    fn test_build_parse_round_trip() {
        let mut enc = FrameEncoder::new("FIX.4.4");
        enc.field(35, "V").unwrap();
        enc.field(49, "SENDER").unwrap();
        enc.field(56, "TARGET").unwrap();
        enc.uint_field(34, 12);
        enc.field(262, "req-1").unwrap();
        enc.uint_field(267, 2);
        enc.field(269, "0").unwrap();
        enc.field(269, "1").unwrap();

        let frame = enc.finish();
        let msg = FrameParser::new()
            .with_strict_checksum(true)
            .parse(frame.clone())
            .unwrap();

        assert_eq!(msg.msg_type(), &MsgType::MarketDataRequest);
        assert_eq!(msg.seq_num(), 12);
        assert_eq!(msg.raw(), &frame[..]);

        // Field order survives the trip, including the repeated tag.
        let tags: Vec<u32> = msg.fields().map(|f| f.tag).collect();
        assert_eq!(tags, vec![8, 9, 35, 49, 56, 34, 262, 267, 269, 269, 10]);
    }
}
