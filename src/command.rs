//! Request frame assembly for the four MC command verbs.
//!
//! Each command owns its validated inputs and renders a complete 3E frame in
//! either wire format through [`FrameContext`]. Construction performs all
//! range checks, so a command that exists can always be framed and nothing is
//! written to the socket for an oversized request.
//!
//! | Verb | Command | Subcommand |
//! |------|---------|------------|
//! | Batch read (word) | `0x0401` | `0x0000` |
//! | Random read | `0x0403` | `0x0000` |
//! | Batch write | `0x1401` | `0x0000` word / `0x0001` bit |
//! | Random write | `0x1402` | `0x0000` word / `0x0001` bit |

use std::fmt::Write as _;

use crate::codec;
use crate::device::DeviceCode;
use crate::error::{McError, Result};
use crate::header::{wrap_request_ascii, wrap_request_binary, FrameContext, ProtocolFormat};
use crate::value::{Scalar, Value};

pub(crate) const CMD_BATCH_READ: u16 = 0x0401;
pub(crate) const CMD_RANDOM_READ: u16 = 0x0403;
pub(crate) const CMD_BATCH_WRITE: u16 = 0x1401;
pub(crate) const CMD_RANDOM_WRITE: u16 = 0x1402;
pub(crate) const SUB_WORD: u16 = 0x0000;
pub(crate) const SUB_BIT: u16 = 0x0001;

/// Maximum number of points a random-access frame can carry per class.
pub(crate) const MAX_RANDOM_POINTS: usize = 255;

fn push_command_binary(body: &mut Vec<u8>, command: u16, subcommand: u16) {
    body.extend_from_slice(&command.to_le_bytes());
    body.extend_from_slice(&subcommand.to_le_bytes());
}

fn push_command_ascii(body: &mut String, command: u16, subcommand: u16) {
    let _ = write!(body, "{:04X}{:04X}", command, subcommand);
}

/// A word-granular random write point: one address, two bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WordPoint {
    pub device: DeviceCode,
    pub address: u32,
    pub bytes: [u8; 2],
}

/// A dword-granular random write point: one address, four bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DwordPoint {
    pub device: DeviceCode,
    pub address: u32,
    pub bytes: [u8; 4],
}

/// Classifies a scalar into word/dword slots starting at `address` and
/// returns how many device words it consumed.
fn classify_scalar(
    device: DeviceCode,
    address: u32,
    scalar: &Scalar,
    words: &mut Vec<WordPoint>,
    dwords: &mut Vec<DwordPoint>,
) -> Result<u32> {
    let bytes = codec::encode_scalar(scalar)?;
    match scalar.encoded_len() {
        2 => {
            words.push(WordPoint {
                device,
                address,
                bytes: [bytes[0], bytes[1]],
            });
            Ok(1)
        }
        4 => {
            dwords.push(DwordPoint {
                device,
                address,
                bytes: [bytes[0], bytes[1], bytes[2], bytes[3]],
            });
            Ok(2)
        }
        _ => {
            // Eight bytes become two consecutive dword slots.
            dwords.push(DwordPoint {
                device,
                address,
                bytes: [bytes[0], bytes[1], bytes[2], bytes[3]],
            });
            dwords.push(DwordPoint {
                device,
                address: address + 2,
                bytes: [bytes[4], bytes[5], bytes[6], bytes[7]],
            });
            Ok(4)
        }
    }
}

/// Classifies a non-bit value into the word/dword point lists of a random
/// write frame.
///
/// String-like values fill whole dword slots first and leave at most one
/// trailing word slot.
pub(crate) fn classify_value(
    device: DeviceCode,
    address: u32,
    value: &Value,
    words: &mut Vec<WordPoint>,
    dwords: &mut Vec<DwordPoint>,
) -> Result<()> {
    match value {
        Value::Scalar(scalar) => {
            classify_scalar(device, address, scalar, words, dwords)?;
            Ok(())
        }
        Value::Seq(scalars) => {
            let mut addr = address;
            for scalar in scalars {
                addr += classify_scalar(device, addr, scalar, words, dwords)?;
            }
            Ok(())
        }
        Value::Text(_) | Value::Chars(_) | Value::Bytes(_) => {
            let bytes = codec::encode_value_words(value)?;
            let mut addr = address;
            let mut chunks = bytes.chunks_exact(4);
            for chunk in &mut chunks {
                dwords.push(DwordPoint {
                    device,
                    address: addr,
                    bytes: [chunk[0], chunk[1], chunk[2], chunk[3]],
                });
                addr += 2;
            }
            let tail = chunks.remainder();
            if !tail.is_empty() {
                let mut pair = [0u8; 2];
                pair[..tail.len()].copy_from_slice(tail);
                words.push(WordPoint {
                    device,
                    address: addr,
                    bytes: pair,
                });
            }
            Ok(())
        }
        Value::Bit(_) | Value::Bits(_) => Err(McError::invalid_data_format(
            "bit values use the bit command family",
        )),
    }
}

/// Batch read of a contiguous word range (command `0x0401`).
#[derive(Debug, Clone)]
pub(crate) struct BatchReadCommand {
    device: DeviceCode,
    address: u32,
    words: u16,
}

impl BatchReadCommand {
    pub(crate) fn new(device: DeviceCode, address: u32, words: u16) -> Result<Self> {
        if words == 0 {
            return Err(McError::invalid_data_format(
                "read request must cover at least one word",
            ));
        }
        Ok(Self {
            device,
            address,
            words,
        })
    }

    /// Number of payload words the response must carry.
    pub(crate) fn expected_words(&self) -> u16 {
        self.words
    }

    pub(crate) fn to_frame(&self, ctx: &FrameContext) -> Vec<u8> {
        match ctx.format {
            ProtocolFormat::Binary => {
                let mut body = Vec::with_capacity(10);
                push_command_binary(&mut body, CMD_BATCH_READ, SUB_WORD);
                body.extend_from_slice(&codec::encode_address_binary(self.device, self.address));
                body.extend_from_slice(&self.words.to_le_bytes());
                wrap_request_binary(ctx, &body)
            }
            ProtocolFormat::Ascii => {
                let mut body = String::with_capacity(20);
                push_command_ascii(&mut body, CMD_BATCH_READ, SUB_WORD);
                body.push_str(&codec::encode_address_ascii(self.device, self.address));
                let _ = write!(body, "{:04X}", self.words);
                wrap_request_ascii(ctx, &body)
            }
        }
    }
}

/// Batch write of a contiguous word range (command `0x1401`, word
/// subcommand).
#[derive(Debug, Clone)]
pub(crate) struct BatchWriteWordCommand {
    device: DeviceCode,
    address: u32,
    bytes: Vec<u8>,
}

impl BatchWriteWordCommand {
    pub(crate) fn new(device: DeviceCode, address: u32, bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(McError::invalid_data_format(
                "write request carries no data",
            ));
        }
        if bytes.len() / 2 > u16::MAX as usize {
            return Err(McError::invalid_data_format(
                "write request exceeds the frame point-count field",
            ));
        }
        Ok(Self {
            device,
            address,
            bytes,
        })
    }

    pub(crate) fn to_frame(&self, ctx: &FrameContext) -> Vec<u8> {
        let points = (self.bytes.len() / 2) as u16;
        match ctx.format {
            ProtocolFormat::Binary => {
                let mut body = Vec::with_capacity(10 + self.bytes.len());
                push_command_binary(&mut body, CMD_BATCH_WRITE, SUB_WORD);
                body.extend_from_slice(&codec::encode_address_binary(self.device, self.address));
                body.extend_from_slice(&points.to_le_bytes());
                body.extend_from_slice(&self.bytes);
                wrap_request_binary(ctx, &body)
            }
            ProtocolFormat::Ascii => {
                let mut body = String::with_capacity(20 + self.bytes.len() * 2);
                push_command_ascii(&mut body, CMD_BATCH_WRITE, SUB_WORD);
                body.push_str(&codec::encode_address_ascii(self.device, self.address));
                let _ = write!(body, "{:04X}", points);
                body.push_str(&codec::ascii_words(&self.bytes));
                wrap_request_ascii(ctx, &body)
            }
        }
    }
}

/// Batch write of consecutive bits (command `0x1401`, bit subcommand).
#[derive(Debug, Clone)]
pub(crate) struct BatchWriteBitCommand {
    device: DeviceCode,
    address: u32,
    bits: Vec<bool>,
}

impl BatchWriteBitCommand {
    pub(crate) fn new(device: DeviceCode, address: u32, bits: Vec<bool>) -> Result<Self> {
        if bits.is_empty() {
            return Err(McError::invalid_data_format(
                "write request carries no data",
            ));
        }
        if bits.len() > u16::MAX as usize {
            return Err(McError::invalid_data_format(
                "write request exceeds the frame point-count field",
            ));
        }
        Ok(Self {
            device,
            address,
            bits,
        })
    }

    pub(crate) fn to_frame(&self, ctx: &FrameContext) -> Vec<u8> {
        let count = self.bits.len() as u16;
        match ctx.format {
            ProtocolFormat::Binary => {
                let mut body = Vec::with_capacity(10 + self.bits.len() / 2 + 1);
                push_command_binary(&mut body, CMD_BATCH_WRITE, SUB_BIT);
                body.extend_from_slice(&codec::encode_address_binary(self.device, self.address));
                body.extend_from_slice(&count.to_le_bytes());
                body.extend_from_slice(&codec::pack_bits(&self.bits));
                wrap_request_binary(ctx, &body)
            }
            ProtocolFormat::Ascii => {
                let mut body = String::with_capacity(20 + self.bits.len());
                push_command_ascii(&mut body, CMD_BATCH_WRITE, SUB_BIT);
                body.push_str(&codec::encode_address_ascii(self.device, self.address));
                let _ = write!(body, "{:04X}", count);
                body.push_str(&codec::ascii_bits(&self.bits));
                wrap_request_ascii(ctx, &body)
            }
        }
    }
}

/// Random read of scattered word and dword points (command `0x0403`).
#[derive(Debug, Clone)]
pub(crate) struct RandomReadCommand {
    word_points: Vec<(DeviceCode, u32)>,
    dword_points: Vec<(DeviceCode, u32)>,
}

impl RandomReadCommand {
    pub(crate) fn new(
        word_points: Vec<(DeviceCode, u32)>,
        dword_points: Vec<(DeviceCode, u32)>,
    ) -> Result<Self> {
        if word_points.len() > MAX_RANDOM_POINTS {
            return Err(McError::size_overflow("word", word_points.len()));
        }
        if dword_points.len() > MAX_RANDOM_POINTS {
            return Err(McError::size_overflow("dword", dword_points.len()));
        }
        if word_points.is_empty() && dword_points.is_empty() {
            return Err(McError::invalid_data_format(
                "random read carries no points",
            ));
        }
        Ok(Self {
            word_points,
            dword_points,
        })
    }

    pub(crate) fn word_count(&self) -> usize {
        self.word_points.len()
    }

    /// Number of payload words the response must carry.
    pub(crate) fn expected_words(&self) -> u16 {
        (self.word_points.len() + 2 * self.dword_points.len()) as u16
    }

    pub(crate) fn to_frame(&self, ctx: &FrameContext) -> Vec<u8> {
        match ctx.format {
            ProtocolFormat::Binary => {
                let mut body =
                    Vec::with_capacity(6 + 4 * (self.word_points.len() + self.dword_points.len()));
                push_command_binary(&mut body, CMD_RANDOM_READ, SUB_WORD);
                body.push(self.word_points.len() as u8);
                body.push(self.dword_points.len() as u8);
                for (device, address) in self.word_points.iter().chain(&self.dword_points) {
                    body.extend_from_slice(&codec::encode_address_binary(*device, *address));
                }
                wrap_request_binary(ctx, &body)
            }
            ProtocolFormat::Ascii => {
                let mut body = String::with_capacity(
                    12 + 8 * (self.word_points.len() + self.dword_points.len()),
                );
                push_command_ascii(&mut body, CMD_RANDOM_READ, SUB_WORD);
                let _ = write!(
                    body,
                    "{:02X}{:02X}",
                    self.word_points.len(),
                    self.dword_points.len()
                );
                for (device, address) in self.word_points.iter().chain(&self.dword_points) {
                    body.push_str(&codec::encode_address_ascii(*device, *address));
                }
                wrap_request_ascii(ctx, &body)
            }
        }
    }
}

/// Random write of scattered word and dword points (command `0x1402`, word
/// subcommand).
#[derive(Debug, Clone)]
pub(crate) struct RandomWriteCommand {
    word_points: Vec<WordPoint>,
    dword_points: Vec<DwordPoint>,
}

impl RandomWriteCommand {
    pub(crate) fn new(word_points: Vec<WordPoint>, dword_points: Vec<DwordPoint>) -> Result<Self> {
        if word_points.len() > MAX_RANDOM_POINTS {
            return Err(McError::size_overflow("word", word_points.len()));
        }
        if dword_points.len() > MAX_RANDOM_POINTS {
            return Err(McError::size_overflow("dword", dword_points.len()));
        }
        if word_points.is_empty() && dword_points.is_empty() {
            return Err(McError::invalid_data_format(
                "random write carries no points",
            ));
        }
        Ok(Self {
            word_points,
            dword_points,
        })
    }

    pub(crate) fn to_frame(&self, ctx: &FrameContext) -> Vec<u8> {
        match ctx.format {
            ProtocolFormat::Binary => {
                let mut body = Vec::with_capacity(
                    6 + 6 * self.word_points.len() + 8 * self.dword_points.len(),
                );
                push_command_binary(&mut body, CMD_RANDOM_WRITE, SUB_WORD);
                body.push(self.word_points.len() as u8);
                body.push(self.dword_points.len() as u8);
                for point in &self.word_points {
                    body.extend_from_slice(&codec::encode_address_binary(
                        point.device,
                        point.address,
                    ));
                    body.extend_from_slice(&point.bytes);
                }
                for point in &self.dword_points {
                    body.extend_from_slice(&codec::encode_address_binary(
                        point.device,
                        point.address,
                    ));
                    body.extend_from_slice(&point.bytes);
                }
                wrap_request_binary(ctx, &body)
            }
            ProtocolFormat::Ascii => {
                let mut body = String::with_capacity(
                    12 + 12 * self.word_points.len() + 16 * self.dword_points.len(),
                );
                push_command_ascii(&mut body, CMD_RANDOM_WRITE, SUB_WORD);
                let _ = write!(
                    body,
                    "{:02X}{:02X}",
                    self.word_points.len(),
                    self.dword_points.len()
                );
                for point in &self.word_points {
                    body.push_str(&codec::encode_address_ascii(point.device, point.address));
                    body.push_str(&codec::ascii_words(&point.bytes));
                }
                for point in &self.dword_points {
                    body.push_str(&codec::encode_address_ascii(point.device, point.address));
                    body.push_str(&codec::ascii_dword(point.bytes));
                }
                wrap_request_ascii(ctx, &body)
            }
        }
    }
}

/// Random write of scattered bits (command `0x1402`, bit subcommand).
///
/// The binary form repeats the device tag after the address word because
/// this verb requires an explicit per-point device byte.
#[derive(Debug, Clone)]
pub(crate) struct RandomWriteBitCommand {
    points: Vec<(DeviceCode, u32, bool)>,
}

impl RandomWriteBitCommand {
    pub(crate) fn new(points: Vec<(DeviceCode, u32, bool)>) -> Result<Self> {
        if points.len() > MAX_RANDOM_POINTS {
            return Err(McError::size_overflow("bit", points.len()));
        }
        if points.is_empty() {
            return Err(McError::invalid_data_format(
                "random write carries no points",
            ));
        }
        Ok(Self { points })
    }

    pub(crate) fn to_frame(&self, ctx: &FrameContext) -> Vec<u8> {
        match ctx.format {
            ProtocolFormat::Binary => {
                let mut body = Vec::with_capacity(5 + 6 * self.points.len());
                push_command_binary(&mut body, CMD_RANDOM_WRITE, SUB_BIT);
                body.push(self.points.len() as u8);
                for (device, address, value) in &self.points {
                    body.extend_from_slice(&codec::encode_address_binary(*device, *address));
                    body.push(device.code());
                    body.push(u8::from(*value));
                }
                wrap_request_binary(ctx, &body)
            }
            ProtocolFormat::Ascii => {
                let mut body = String::with_capacity(10 + 9 * self.points.len());
                push_command_ascii(&mut body, CMD_RANDOM_WRITE, SUB_BIT);
                let _ = write!(body, "{:02X}", self.points.len());
                for (device, address, value) in &self.points {
                    body.push_str(&codec::encode_address_ascii(*device, *address));
                    body.push(if *value { '1' } else { '0' });
                }
                wrap_request_ascii(ctx, &body)
            }
        }
    }
}
