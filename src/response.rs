//! Response frame parsing and validation.
//!
//! A 3E response carries the mirrored subheader and access route, a length
//! field covering everything after it, the two-byte end code and the
//! payload. Validation runs in order: prefix, length, end code. The binary
//! payload is returned as received (little-endian); the ASCII payload is hex
//! decoded and then un-swapped word by word.

use crate::codec;
use crate::error::{McError, Result};
use crate::header::{
    response_prefix_ascii, response_prefix_binary, FrameContext, ProtocolFormat,
    ASCII_RESPONSE_PREFIX, BIN_RESPONSE_PREFIX,
};

/// A validated response: end code zero, payload extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct McResponse {
    /// Payload bytes in little-endian order.
    pub payload: Vec<u8>,
}

/// Parses and validates a response buffer in the session's wire format.
///
/// `expected_words` is the payload word count the request implies; pass
/// `None` for write responses, which are validated for prefix and end code
/// only.
pub(crate) fn parse_response(
    ctx: &FrameContext,
    buf: &[u8],
    expected_words: Option<u16>,
) -> Result<McResponse> {
    match ctx.format {
        ProtocolFormat::Binary => parse_binary(ctx, buf, expected_words),
        ProtocolFormat::Ascii => parse_ascii(ctx, buf, expected_words),
    }
}

fn parse_binary(ctx: &FrameContext, buf: &[u8], expected_words: Option<u16>) -> Result<McResponse> {
    let prefix = response_prefix_binary(ctx);
    if buf.len() < BIN_RESPONSE_PREFIX + 4 {
        return Err(McError::protocol_mismatch(format!(
            "response of {} bytes is shorter than the 3E header",
            buf.len()
        )));
    }
    if buf[..BIN_RESPONSE_PREFIX] != prefix {
        return Err(McError::protocol_mismatch(format!(
            "expected response prefix {:02X?}, got {:02X?}",
            prefix,
            &buf[..BIN_RESPONSE_PREFIX]
        )));
    }

    let declared = u16::from_le_bytes([buf[7], buf[8]]) as usize;
    let actual = buf.len() - BIN_RESPONSE_PREFIX - 2;
    if declared != actual {
        return Err(McError::length_mismatch(declared, actual));
    }
    if let Some(words) = expected_words {
        let expected = words as usize * 2 + 2;
        if declared != expected {
            return Err(McError::length_mismatch(declared, expected));
        }
    }

    let end_code = u16::from_le_bytes([buf[9], buf[10]]);
    if end_code != 0 {
        return Err(McError::device_error(end_code, buf[11..].to_vec()));
    }

    Ok(McResponse {
        payload: buf[11..].to_vec(),
    })
}

fn parse_ascii(ctx: &FrameContext, buf: &[u8], expected_words: Option<u16>) -> Result<McResponse> {
    let text = std::str::from_utf8(buf)
        .map_err(|_| McError::protocol_mismatch("response is not ASCII text"))?;
    if !text.is_ascii() {
        return Err(McError::protocol_mismatch("response is not ASCII text"));
    }
    let prefix = response_prefix_ascii(ctx);
    if text.len() < ASCII_RESPONSE_PREFIX + 8 {
        return Err(McError::protocol_mismatch(format!(
            "response of {} chars is shorter than the 3E header",
            text.len()
        )));
    }
    if text[..ASCII_RESPONSE_PREFIX] != prefix {
        return Err(McError::protocol_mismatch(format!(
            "expected response prefix \"{}\", got \"{}\"",
            prefix,
            &text[..ASCII_RESPONSE_PREFIX]
        )));
    }

    let declared = usize::from_str_radix(&text[14..18], 16)
        .map_err(|_| McError::protocol_mismatch("length field is not hexadecimal"))?;
    let actual = text.len() - ASCII_RESPONSE_PREFIX - 4;
    if declared != actual {
        return Err(McError::length_mismatch(declared, actual));
    }
    if let Some(words) = expected_words {
        let expected = words as usize * 4 + 4;
        if declared != expected {
            return Err(McError::length_mismatch(declared, expected));
        }
    }

    let end_code = u16::from_str_radix(&text[18..22], 16)
        .map_err(|_| McError::protocol_mismatch("end code is not hexadecimal"))?;
    let payload_text = &text[22..];
    if end_code != 0 {
        return Err(McError::device_error(end_code, payload_text.as_bytes().to_vec()));
    }

    let decoded = codec::hex_to_bytes(payload_text)?;
    Ok(McResponse {
        payload: codec::swap_word_bytes(&decoded),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(format: ProtocolFormat) -> FrameContext {
        FrameContext {
            format,
            network_no: 0x00,
            pc_no: 0xFF,
            timer_ticks: 16,
        }
    }

    #[test]
    fn test_parse_binary_success() {
        // Two words 0x0001, 0x0002.
        let buf = [
            0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x06, 0x00, 0x00, 0x00, 0x01, 0x00, 0x02,
            0x00,
        ];
        let resp = parse_response(&ctx(ProtocolFormat::Binary), &buf, Some(2)).unwrap();
        assert_eq!(resp.payload, [0x01, 0x00, 0x02, 0x00]);
    }

    #[test]
    fn test_parse_binary_write_ack() {
        let buf = [0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x02, 0x00, 0x00, 0x00];
        let resp = parse_response(&ctx(ProtocolFormat::Binary), &buf, None).unwrap();
        assert!(resp.payload.is_empty());
    }

    #[test]
    fn test_parse_binary_bad_prefix() {
        let buf = [0x50, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x02, 0x00, 0x00, 0x00];
        let err = parse_response(&ctx(ProtocolFormat::Binary), &buf, None).unwrap_err();
        assert!(matches!(err, McError::ProtocolMismatch { .. }));
    }

    #[test]
    fn test_parse_binary_length_field_disagrees_with_buffer() {
        let buf = [0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x04, 0x00, 0x00, 0x00];
        let err = parse_response(&ctx(ProtocolFormat::Binary), &buf, None).unwrap_err();
        assert!(matches!(
            err,
            McError::LengthMismatch {
                declared: 4,
                expected: 2
            }
        ));
    }

    #[test]
    fn test_parse_binary_length_disagrees_with_request() {
        // Buffer is self-consistent but carries one word where two were asked.
        let buf = [
            0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01, 0x00,
        ];
        let err = parse_response(&ctx(ProtocolFormat::Binary), &buf, Some(2)).unwrap_err();
        assert!(matches!(
            err,
            McError::LengthMismatch {
                declared: 4,
                expected: 6
            }
        ));
    }

    #[test]
    fn test_parse_binary_device_error_with_trailing() {
        let buf = [
            0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x04, 0x00, 0x59, 0xC0, 0xAB, 0xCD,
        ];
        let err = parse_response(&ctx(ProtocolFormat::Binary), &buf, None).unwrap_err();
        match err {
            McError::DeviceError { end_code, trailing } => {
                assert_eq!(end_code, 0xC059);
                assert_eq!(trailing, [0xAB, 0xCD]);
            }
            other => panic!("expected DeviceError, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_ascii_success_unswaps_words() {
        // Two words 0x0001, 0x0002 -> payload text "00010002".
        let text = format!("D00000FF03FF00{:04X}{:04X}00010002", 12, 0);
        let resp =
            parse_response(&ctx(ProtocolFormat::Ascii), text.as_bytes(), Some(2)).unwrap();
        assert_eq!(resp.payload, [0x01, 0x00, 0x02, 0x00]);
    }

    #[test]
    fn test_parse_ascii_write_ack() {
        let text = "D00000FF03FF0000040000";
        let resp = parse_response(&ctx(ProtocolFormat::Ascii), text.as_bytes(), None).unwrap();
        assert!(resp.payload.is_empty());
    }

    #[test]
    fn test_parse_ascii_bad_prefix() {
        let text = "500000FF03FF0000040000";
        let err = parse_response(&ctx(ProtocolFormat::Ascii), text.as_bytes(), None).unwrap_err();
        assert!(matches!(err, McError::ProtocolMismatch { .. }));
    }

    #[test]
    fn test_parse_ascii_device_error() {
        let text = "D00000FF03FF000004C059";
        let err = parse_response(&ctx(ProtocolFormat::Ascii), text.as_bytes(), None).unwrap_err();
        match err {
            McError::DeviceError { end_code, .. } => assert_eq!(end_code, 0xC059),
            other => panic!("expected DeviceError, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_ascii_length_mismatch() {
        let text = "D00000FF03FF0000080000";
        let err = parse_response(&ctx(ProtocolFormat::Ascii), text.as_bytes(), None).unwrap_err();
        assert!(matches!(err, McError::LengthMismatch { .. }));
    }
}
