//! Pure codec functions shared by the frame assembler and parser.
//!
//! Everything in this module is side-effect free: addresses and values go in,
//! wire bytes or ASCII text come out. The binary form is little-endian packed
//! bytes; the ASCII form is uppercase hexadecimal text with the protocol's
//! word/dword byte-swap conventions applied.
//!
//! # ASCII byte order
//!
//! The ASCII wire form represents a little-endian byte buffer word by word:
//! each two-byte word is emitted high byte first, and each four-byte dword is
//! emitted fully reversed. The response parser undoes the word swap after hex
//! decoding. The two swap patterns are intentionally distinct; do not merge
//! them.

use crate::device::DeviceCode;
use crate::error::{McError, Result};
use crate::value::{Scalar, Value};

use std::fmt::Write as _;

/// Encodes a device address into the four-byte binary form: the three low
/// bytes of the little-endian offset followed by the device tag.
pub(crate) fn encode_address_binary(device: DeviceCode, address: u32) -> [u8; 4] {
    let le = address.to_le_bytes();
    [le[0], le[1], le[2], device.code()]
}

/// Encodes a device address into the eight-character ASCII form: the
/// mnemonic padded with `*` to two columns, then six digits.
///
/// Hex-addressed devices render hexadecimal digits, all others decimal. If
/// the rendered offset exceeds six digits only the last six are kept.
pub(crate) fn encode_address_ascii(device: DeviceCode, address: u32) -> String {
    let mut out = String::with_capacity(8);
    out.push_str(device.mnemonic());
    if device.mnemonic().len() == 1 {
        out.push('*');
    }
    let digits = if device.is_hex_addressed() {
        format!("{:06X}", address)
    } else {
        format!("{:06}", address)
    };
    out.push_str(&digits[digits.len() - 6..]);
    out
}

/// Encodes a scalar into its word-granular little-endian byte form.
///
/// Single-byte values pad to a full word; `char` must be ASCII.
pub(crate) fn encode_scalar(scalar: &Scalar) -> Result<Vec<u8>> {
    match scalar {
        Scalar::U8(v) => Ok(vec![*v, 0x00]),
        Scalar::Char(c) => {
            if c.is_ascii() {
                Ok(vec![*c as u8, 0x00])
            } else {
                Err(McError::invalid_data_format(format!(
                    "char {:?} is not ASCII",
                    c
                )))
            }
        }
        Scalar::I16(v) => Ok(v.to_le_bytes().to_vec()),
        Scalar::U16(v) => Ok(v.to_le_bytes().to_vec()),
        Scalar::I32(v) => Ok(v.to_le_bytes().to_vec()),
        Scalar::U32(v) => Ok(v.to_le_bytes().to_vec()),
        Scalar::I64(v) => Ok(v.to_le_bytes().to_vec()),
        Scalar::U64(v) => Ok(v.to_le_bytes().to_vec()),
        Scalar::F32(v) => Ok(v.to_le_bytes().to_vec()),
        Scalar::F64(v) => Ok(v.to_le_bytes().to_vec()),
    }
}

/// Converts string-like payloads to bytes, zero-padding to an even length.
pub(crate) fn encode_text_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    if out.len() % 2 == 1 {
        out.push(0x00);
    }
    out
}

/// Encodes a non-bit value into the contiguous word-granular byte sequence
/// used by the batch write command.
pub(crate) fn encode_value_words(value: &Value) -> Result<Vec<u8>> {
    match value {
        Value::Scalar(scalar) => encode_scalar(scalar),
        Value::Seq(scalars) => {
            let mut out = Vec::new();
            for scalar in scalars {
                out.extend_from_slice(&encode_scalar(scalar)?);
            }
            Ok(out)
        }
        Value::Text(text) => {
            if !text.is_ascii() {
                return Err(McError::invalid_data_format("string is not ASCII"));
            }
            Ok(encode_text_bytes(text.as_bytes()))
        }
        Value::Chars(chars) => {
            let mut bytes = Vec::with_capacity(chars.len());
            for c in chars {
                if !c.is_ascii() {
                    return Err(McError::invalid_data_format(format!(
                        "char {:?} is not ASCII",
                        c
                    )));
                }
                bytes.push(*c as u8);
            }
            Ok(encode_text_bytes(&bytes))
        }
        Value::Bytes(bytes) => Ok(encode_text_bytes(bytes)),
        Value::Bit(_) | Value::Bits(_) => Err(McError::invalid_data_format(
            "bit values use the bit command family",
        )),
    }
}

/// Renders an even-length little-endian byte buffer as ASCII text, one word
/// at a time, high byte first.
pub(crate) fn ascii_words(bytes: &[u8]) -> String {
    debug_assert!(bytes.len() % 2 == 0);
    let mut out = String::with_capacity(bytes.len() * 2);
    for pair in bytes.chunks_exact(2) {
        let _ = write!(out, "{:02X}{:02X}", pair[1], pair[0]);
    }
    out
}

/// Renders a little-endian dword as ASCII text, fully byte-reversed.
pub(crate) fn ascii_dword(bytes: [u8; 4]) -> String {
    format!(
        "{:02X}{:02X}{:02X}{:02X}",
        bytes[3], bytes[2], bytes[1], bytes[0]
    )
}

/// Swaps each adjacent byte pair; the inverse of the ASCII word rendering
/// once the text has been hex-decoded. An odd trailing byte passes through.
pub(crate) fn swap_word_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.chunks_exact(2);
    for pair in &mut iter {
        out.push(pair[1]);
        out.push(pair[0]);
    }
    out.extend_from_slice(iter.remainder());
    out
}

/// Decodes ASCII hex text into bytes.
pub(crate) fn hex_to_bytes(text: &str) -> Result<Vec<u8>> {
    hex::decode(text)
        .map_err(|_| McError::protocol_mismatch("payload is not valid hexadecimal text"))
}

/// Packs bits two per byte: bit `2i` in the high nibble (`0x10`), bit `2i+1`
/// in the low nibble (`0x01`). An odd tail occupies the high nibble of a
/// final byte, so `count` bits pack into `count/2 + count%2` bytes.
pub(crate) fn pack_bits(bits: &[bool]) -> Vec<u8> {
    let mut out = vec![0u8; bits.len() / 2 + bits.len() % 2];
    for (i, bit) in bits.iter().enumerate() {
        if *bit {
            out[i / 2] |= if i % 2 == 0 { 0x10 } else { 0x01 };
        }
    }
    out
}

/// Renders bits as ASCII, one `'1'`/`'0'` character per bit.
pub(crate) fn ascii_bits(bits: &[bool]) -> String {
    bits.iter().map(|b| if *b { '1' } else { '0' }).collect()
}
