//! Ai-Thinker RD-03D 24 GHz radar.
//!
//! Frames start with `AA FF`. The module takes a single-target command on
//! connect and does not acknowledge it; the receive buffer is flushed after
//! a short settle time instead.

use std::time::Duration;

use super::frame::RawTarget;
use super::serial::{RadarProtocol, SetupCommand};

pub const HEADER: &[u8] = &[0xAA, 0xFF];

pub const SINGLE_TARGET_CMD: &[u8] = &[
    0xFD, 0xFC, 0xFB, 0xFA, 0x02, 0x00, 0x80, 0x00, 0x04, 0x03, 0x02, 0x01,
];

pub const MULTI_TARGET_CMD: &[u8] = &[
    0xFD, 0xFC, 0xFB, 0xFA, 0x02, 0x00, 0x90, 0x00, 0x04, 0x03, 0x02, 0x01,
];

/// A slot holds a target when it reports a non-zero position.
fn is_present(t: &RawTarget) -> bool {
    t.x != 0 || t.y != 0
}

pub static RD03D: RadarProtocol = RadarProtocol {
    name: "RD-03D",
    header: HEADER,
    setup: &[SetupCommand {
        name: "Single Target",
        bytes: SINGLE_TARGET_CMD,
        ack_prefix: None,
    }],
    settle: Duration::from_millis(200),
    is_present,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::frame::{build_frame, decode_target};

    #[test]
    fn empty_slot_is_absent() {
        let frame = build_frame(HEADER, 0, 0, 25);
        let t = decode_target(&frame, 0).unwrap();
        assert!(!(RD03D.is_present)(&t));
    }

    #[test]
    fn positioned_slot_is_present() {
        let frame = build_frame(HEADER, -40, 0, 0);
        let t = decode_target(&frame, 0).unwrap();
        assert!((RD03D.is_present)(&t));
    }

    #[test]
    fn mode_commands_differ_only_in_mode_byte() {
        let diff: Vec<usize> = SINGLE_TARGET_CMD
            .iter()
            .zip(MULTI_TARGET_CMD)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(diff, vec![6]);
    }
}
