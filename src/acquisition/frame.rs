//! Report frame reassembly and target decoding shared by both radar modules.
//!
//! Both modules stream 30-byte frames: a model-specific header, three 8-byte
//! target slots starting at offset 4, and the tail `55 CC`. Each slot holds
//! x, y, speed as little-endian sign-magnitude words followed by the
//! unsigned distance resolution.

use crate::config::defaults::{FRAME_LEN, RX_BUFFER_KEEP, RX_BUFFER_LIMIT};

/// Frame tail common to both modules.
pub const FRAME_TAIL: [u8; 2] = [0x55, 0xCC];

/// Number of target slots in one report frame.
pub const TARGET_SLOTS: usize = 3;

const SLOT_OFFSET: usize = 4;
const SLOT_LEN: usize = 8;

pub type Frame = [u8; FRAME_LEN];

/// One target slot as reported by the radar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawTarget {
    /// Lateral offset (mm)
    pub x: i32,
    /// Distance (mm)
    pub y: i32,
    /// Radial speed (cm/s)
    pub speed: i32,
    pub resolution: u16,
}

/// Decode a little-endian sign-magnitude word: bit 15 set means positive.
pub fn decode_sign_magnitude(lo: u8, hi: u8) -> i32 {
    let raw = u16::from_le_bytes([lo, hi]);
    let magnitude = i32::from(raw & 0x7FFF);
    if raw & 0x8000 != 0 {
        magnitude
    } else {
        -magnitude
    }
}

/// Decode target slot `index` (0-based) of a complete frame.
pub fn decode_target(frame: &Frame, index: usize) -> Option<RawTarget> {
    if index >= TARGET_SLOTS {
        return None;
    }
    let b = SLOT_OFFSET + index * SLOT_LEN;
    Some(RawTarget {
        x: decode_sign_magnitude(frame[b], frame[b + 1]),
        y: decode_sign_magnitude(frame[b + 2], frame[b + 3]),
        speed: decode_sign_magnitude(frame[b + 4], frame[b + 5]),
        resolution: u16::from_le_bytes([frame[b + 6], frame[b + 7]]),
    })
}

/// Position of the first occurrence of `needle` in `haystack`.
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

// ============================================================================
// Frame Buffer
// ============================================================================

/// Accumulates raw UART bytes and extracts complete report frames.
#[derive(Debug)]
pub struct FrameBuffer {
    header: &'static [u8],
    buf: Vec<u8>,
    corrupt_frames: u64,
}

impl FrameBuffer {
    pub fn new(header: &'static [u8]) -> Self {
        Self {
            header,
            buf: Vec::with_capacity(RX_BUFFER_LIMIT + 64),
            corrupt_frames: 0,
        }
    }

    /// Append received bytes; on overflow only the newest bytes survive.
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        if self.buf.len() > RX_BUFFER_LIMIT {
            let drop = self.buf.len() - RX_BUFFER_KEEP;
            self.buf.drain(..drop);
        }
    }

    /// Extract every complete frame and return the newest one.
    ///
    /// A header whose frame has a bad tail is skipped and scanning resumes
    /// right after that header. Incomplete trailing data is kept.
    pub fn take_latest(&mut self) -> Option<Frame> {
        let mut latest = None;
        loop {
            let Some(start) = find(&self.buf, self.header) else {
                // Keep a possible partial header at the end
                let keep = self.header.len().saturating_sub(1).min(self.buf.len());
                let cut = self.buf.len() - keep;
                self.buf.drain(..cut);
                break;
            };
            self.buf.drain(..start);
            if self.buf.len() < FRAME_LEN {
                break;
            }
            if self.buf[FRAME_LEN - 2..FRAME_LEN] == FRAME_TAIL {
                let mut frame = [0u8; FRAME_LEN];
                frame.copy_from_slice(&self.buf[..FRAME_LEN]);
                latest = Some(frame);
                self.buf.drain(..FRAME_LEN);
            } else {
                self.corrupt_frames += 1;
                self.buf.drain(..self.header.len());
            }
        }
        latest
    }

    /// Drop everything buffered so far.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Frames discarded because of a bad tail.
    pub const fn corrupt_frames(&self) -> u64 {
        self.corrupt_frames
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Encode a value as a little-endian sign-magnitude word.
#[cfg(test)]
pub(crate) fn encode_sign_magnitude(value: i32) -> [u8; 2] {
    let magnitude = u16::try_from(value.unsigned_abs()).map_or(0x7FFF, |m| m.min(0x7FFF));
    let raw = if value >= 0 { magnitude | 0x8000 } else { magnitude };
    raw.to_le_bytes()
}

/// Build a frame whose first slot reports `(x, y, speed)` and whose other
/// slots are empty.
#[cfg(test)]
pub(crate) fn build_frame(header: &[u8], x: i32, y: i32, speed: i32) -> Frame {
    let mut frame = [0u8; FRAME_LEN];
    frame[..header.len()].copy_from_slice(header);
    let b = SLOT_OFFSET;
    frame[b..b + 2].copy_from_slice(&encode_sign_magnitude(x));
    frame[b + 2..b + 4].copy_from_slice(&encode_sign_magnitude(y));
    frame[b + 4..b + 6].copy_from_slice(&encode_sign_magnitude(speed));
    frame[b + 6..b + 8].copy_from_slice(&320u16.to_le_bytes());
    frame[FRAME_LEN - 2..].copy_from_slice(&FRAME_TAIL);
    frame
}
