//! HLK-LD2450 24 GHz radar.
//!
//! Frames start with `AA FF 03 00`. Configuration is a three-step
//! enable / single-target / end sequence and every step must be
//! acknowledged before the next one is sent.

use std::time::Duration;

use super::frame::RawTarget;
use super::serial::{RadarProtocol, SetupCommand};

pub const HEADER: &[u8] = &[0xAA, 0xFF, 0x03, 0x00];

pub const CMD_ENABLE_CONFIG: &[u8] = &[
    0xFD, 0xFC, 0xFB, 0xFA, 0x04, 0x00, 0xFF, 0x00, 0x01, 0x00, 0x04, 0x03, 0x02, 0x01,
];
pub const ACK_ENABLE_CONFIG: &[u8] = &[0xFD, 0xFC, 0xFB, 0xFA, 0x08, 0x00, 0xFF, 0x01, 0x00, 0x00];

pub const CMD_SINGLE_TARGET: &[u8] = &[
    0xFD, 0xFC, 0xFB, 0xFA, 0x02, 0x00, 0x80, 0x00, 0x04, 0x03, 0x02, 0x01,
];
pub const ACK_SINGLE_TARGET: &[u8] = &[0xFD, 0xFC, 0xFB, 0xFA, 0x04, 0x00, 0x80, 0x01, 0x00, 0x00];

pub const CMD_END_CONFIG: &[u8] = &[
    0xFD, 0xFC, 0xFB, 0xFA, 0x02, 0x00, 0xFE, 0x00, 0x04, 0x03, 0x02, 0x01,
];
pub const ACK_END_CONFIG: &[u8] = &[0xFD, 0xFC, 0xFB, 0xFA, 0x04, 0x00, 0xFE, 0x01, 0x00, 0x00];

/// Unused slots are all zero; anything else is a target.
fn is_present(t: &RawTarget) -> bool {
    t.x != 0 || t.y != 0 || t.speed != 0
}

pub static LD2450: RadarProtocol = RadarProtocol {
    name: "LD2450",
    header: HEADER,
    setup: &[
        SetupCommand {
            name: "Enable Config",
            bytes: CMD_ENABLE_CONFIG,
            ack_prefix: Some(ACK_ENABLE_CONFIG),
        },
        SetupCommand {
            name: "Set Single Target",
            bytes: CMD_SINGLE_TARGET,
            ack_prefix: Some(ACK_SINGLE_TARGET),
        },
        SetupCommand {
            name: "End Config",
            bytes: CMD_END_CONFIG,
            ack_prefix: Some(ACK_END_CONFIG),
        },
    ],
    settle: Duration::from_millis(50),
    is_present,
};
