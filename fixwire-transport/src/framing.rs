/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Tokio codec for FIX frame splitting.
//!
//! [`FrameSplitter`] turns a byte stream into complete frames by reading the
//! declared BodyLength (tag 9), which is stricter than scanning for the next
//! `8=FIX` prefix: values containing that substring cannot break framing.
//! Bytes that do not belong to a well-formed frame are discarded with a
//! resync scan for the next frame start, so line noise drops instead of
//! killing the stream.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use fixwire_codec::SOH;
use memchr::{memchr, memmem};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

/// Errors that can occur while splitting the inbound stream.
#[derive(Debug, Error)]
pub enum FramingError {
    /// A frame's declared length exceeds the configured maximum.
    #[error("frame too large: {size} bytes exceeds maximum {max_size}")]
    FrameTooLarge {
        /// Declared total frame size.
        size: usize,
        /// Maximum allowed size.
        max_size: usize,
    },

    /// I/O error from the underlying stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Prefix every FIX 4.x frame starts with.
const FRAME_PREFIX: &[u8] = b"8=FIX";

/// Smallest buffer worth inspecting; a minimal frame is larger.
const MIN_FRAME_LEN: usize = 20;

/// Longest plausible BeginString group, `8=FIXT.1.1` plus slack.
const MAX_BEGIN_STRING: usize = 16;

/// Fixed trailer size: `10=nnn<SOH>`.
const TRAILER_LEN: usize = 7;

enum FrameStatus {
    /// A complete frame of the given total length is buffered.
    Complete(usize),
    /// More bytes are needed.
    Partial,
    /// The declared length exceeds the maximum.
    TooLarge(usize),
    /// The bytes at the buffer head are not a well-formed frame start.
    Desync,
}

/// Splits a byte stream into complete FIX frames.
#[derive(Debug, Clone)]
pub struct FrameSplitter {
    /// Maximum total frame size in bytes.
    max_frame_size: usize,
}

impl FrameSplitter {
    /// Creates a splitter with the default 1 MiB frame cap.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_frame_size: 1024 * 1024,
        }
    }

    /// Sets the maximum total frame size.
    #[must_use]
    pub const fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    fn frame_status(&self, src: &[u8]) -> FrameStatus {
        // Caller guarantees src starts with "8=".
        let Some(first_soh) = memchr(SOH, src) else {
            return if src.len() > MAX_BEGIN_STRING {
                FrameStatus::Desync
            } else {
                FrameStatus::Partial
            };
        };

        let rest = &src[first_soh + 1..];
        if rest.len() < 3 {
            return FrameStatus::Partial;
        }
        if !rest.starts_with(b"9=") {
            return FrameStatus::Desync;
        }
        let Some(len_soh) = memchr(SOH, rest) else {
            // Nine digits of body length is already absurd.
            return if rest.len() > 12 {
                FrameStatus::Desync
            } else {
                FrameStatus::Partial
            };
        };

        let digits = &rest[2..len_soh];
        if digits.is_empty() || digits.len() > 9 || !digits.iter().all(u8::is_ascii_digit) {
            return FrameStatus::Desync;
        }
        let body_len = digits
            .iter()
            .fold(0usize, |acc, &b| acc * 10 + usize::from(b - b'0'));

        let header_len = first_soh + 1 + len_soh + 1;
        let total = header_len + body_len + TRAILER_LEN;
        if total > self.max_frame_size {
            return FrameStatus::TooLarge(total);
        }
        if src.len() < total {
            return FrameStatus::Partial;
        }

        // The declared length must land exactly on the trailer.
        if &src[total - TRAILER_LEN..total - 4] != b"10=" || src[total - 1] != SOH {
            return FrameStatus::Desync;
        }

        FrameStatus::Complete(total)
    }
}

impl Default for FrameSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameSplitter {
    type Item = BytesMut;
    type Error = FramingError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if src.is_empty() {
                return Ok(None);
            }

            // Resync to the next frame start, discarding anything before it.
            if !src.starts_with(b"8=") {
                match memmem::find(src, FRAME_PREFIX) {
                    Some(at) => {
                        debug!(skipped = at, "discarding bytes before frame start");
                        src.advance(at);
                    }
                    None => {
                        // Keep a tail that could be a split prefix.
                        let keep = FRAME_PREFIX.len() - 1;
                        if src.len() > keep {
                            let skipped = src.len() - keep;
                            debug!(skipped, "discarding unframed bytes");
                            src.advance(skipped);
                        }
                        return Ok(None);
                    }
                }
            }

            if src.len() < MIN_FRAME_LEN {
                return Ok(None);
            }

            match self.frame_status(src) {
                FrameStatus::Complete(total) => return Ok(Some(src.split_to(total))),
                FrameStatus::Partial => return Ok(None),
                FrameStatus::TooLarge(size) => {
                    return Err(FramingError::FrameTooLarge {
                        size,
                        max_size: self.max_frame_size,
                    })
                }
                FrameStatus::Desync => {
                    debug!("frame start did not validate, rescanning");
                    src.advance(2);
                }
            }
        }
    }
}

impl Encoder<Bytes> for FrameSplitter {
    type Error = FramingError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(&item);
        Ok(())
    }
}
