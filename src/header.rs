//! 3E frame outer headers.
//!
//! Every request starts with the 3E subheader, the access route (network
//! number, PC number, the fixed module I/O number `0x03FF` and station
//! number `0x00`) and a length field covering everything from the monitoring
//! timer through the end of the payload. Responses carry the mirrored
//! subheader followed by the same route, a length field and the end code.
//!
//! The binary form packs these little-endian; the ASCII form renders each
//! field as uppercase hexadecimal text, with the length counting characters
//! instead of bytes.

use std::fmt::Write as _;

/// Wire encoding selected for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolFormat {
    /// Little-endian packed binary frames.
    #[default]
    Binary,
    /// Uppercase hexadecimal text frames.
    Ascii,
}

/// Request subheader for 3E frames.
pub(crate) const SUBHEADER_REQUEST: [u8; 2] = [0x50, 0x00];
/// Response subheader for 3E frames.
pub(crate) const SUBHEADER_RESPONSE: [u8; 2] = [0xD0, 0x00];
/// Fixed module I/O number addressing the control CPU.
pub(crate) const MODULE_IO: u16 = 0x03FF;
/// Fixed station number.
pub(crate) const STATION_NO: u8 = 0x00;

/// Length of the binary response prefix up to the length field.
pub(crate) const BIN_RESPONSE_PREFIX: usize = 7;
/// Length of the ASCII response prefix up to the length field, in chars.
pub(crate) const ASCII_RESPONSE_PREFIX: usize = 14;

/// Immutable per-request snapshot of the session configuration.
///
/// A frame is encoded against one context from start to finish, so
/// configuration changes never land mid-frame.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameContext {
    pub format: ProtocolFormat,
    pub network_no: u8,
    pub pc_no: u8,
    /// Monitoring timer in 250 ms ticks.
    pub timer_ticks: u16,
}

/// Wraps a binary request body (command word onward) into a full 3E frame.
///
/// The length field counts the monitoring timer plus the body.
pub(crate) fn wrap_request_binary(ctx: &FrameContext, body: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(11 + body.len());
    frame.extend_from_slice(&SUBHEADER_REQUEST);
    frame.push(ctx.network_no);
    frame.push(ctx.pc_no);
    frame.extend_from_slice(&MODULE_IO.to_le_bytes());
    frame.push(STATION_NO);
    frame.extend_from_slice(&((body.len() + 2) as u16).to_le_bytes());
    frame.extend_from_slice(&ctx.timer_ticks.to_le_bytes());
    frame.extend_from_slice(body);
    frame
}

/// Wraps an ASCII request body (command chars onward) into a full 3E frame.
///
/// The length field counts the monitoring timer characters plus the body
/// characters.
pub(crate) fn wrap_request_ascii(ctx: &FrameContext, body: &str) -> Vec<u8> {
    let mut frame = String::with_capacity(22 + body.len());
    frame.push_str("5000");
    let _ = write!(frame, "{:02X}{:02X}", ctx.network_no, ctx.pc_no);
    frame.push_str("03FF");
    frame.push_str("00");
    let _ = write!(frame, "{:04X}", body.len() + 4);
    let _ = write!(frame, "{:04X}", ctx.timer_ticks);
    frame.push_str(body);
    frame.into_bytes()
}

/// Returns the expected binary response prefix for this session.
pub(crate) fn response_prefix_binary(ctx: &FrameContext) -> [u8; BIN_RESPONSE_PREFIX] {
    [
        SUBHEADER_RESPONSE[0],
        SUBHEADER_RESPONSE[1],
        ctx.network_no,
        ctx.pc_no,
        (MODULE_IO & 0xFF) as u8,
        (MODULE_IO >> 8) as u8,
        STATION_NO,
    ]
}

/// Returns the expected ASCII response prefix for this session.
pub(crate) fn response_prefix_ascii(ctx: &FrameContext) -> String {
    format!("D000{:02X}{:02X}03FF00", ctx.network_no, ctx.pc_no)
}
