//! Error types for MC protocol communication.
//!
//! This module defines the [`McError`] enum and the [`Result`] type alias
//! used throughout the library for error handling.
//!
//! # Error Categories
//!
//! Errors are categorized into several types:
//!
//! - **Device Errors** - Non-zero end codes returned by the PLC
//! - **Communication Errors** - Timeouts and I/O errors
//! - **Session Errors** - Operations in the wrong connection state
//! - **Encoding Errors** - Values or frames the codec cannot produce
//! - **Protocol Errors** - Malformed or mismatched responses
//!
//! # Example
//!
//! ```no_run
//! use melsec_mc::{McClient, ClientConfig, DeviceCode, SendItem, McError};
//!
//! let mut client = McClient::with_config(ClientConfig::new("192.168.10.100", 6000));
//! client.connect()?;
//!
//! match client.read(&SendItem::read(DeviceCode::D, 100, 10)) {
//!     Ok(item) => println!("Data: {:?}", item.to_u16s()),
//!     Err(McError::Timeout) => println!("Communication timeout"),
//!     Err(McError::DeviceError { end_code, .. }) => {
//!         println!("PLC rejected the request: end code 0x{:04X}", end_code);
//!     }
//!     Err(e) => println!("Error: {}", e),
//! }
//! # Ok::<(), McError>(())
//! ```

use std::io;
use thiserror::Error;

/// Returns a human-readable description for MC protocol end codes.
///
/// This function maps the two-byte completion code returned in a 3E response
/// to its description according to the MELSEC communication documentation.
/// Codes not in the table are reported as unknown.
///
/// # Example
///
/// ```
/// use melsec_mc::mc_end_code_description;
///
/// let desc = mc_end_code_description(0xC059);
/// assert_eq!(desc, "Command or subcommand is not recognized by the target module");
/// ```
pub fn mc_end_code_description(end_code: u16) -> &'static str {
    match end_code {
        0x0000 => "Normal completion",

        // Request content errors (0xC0xx)
        0xC050 => "ASCII data received cannot be converted to binary",
        0xC051 => "Number of bit device points is out of the allowed range",
        0xC052 => "Number of word device points is out of the allowed range",
        0xC053 => "Number of random-access bit points is out of the allowed range",
        0xC054 => "Number of random-access word points is out of the allowed range",
        0xC056 => "Read or write request exceeds the maximum address",
        0xC058 => "Request data length does not match the character area",
        0xC059 => "Command or subcommand is not recognized by the target module",
        0xC05B => "The CPU module cannot access the specified device",
        0xC05C => "Request content error (bit request issued against a word device)",
        0xC05D => "Monitor registration has not been performed",
        0xC05F => "The request cannot be executed for the target CPU module",
        0xC060 => "Request content error (incorrect device specification)",
        0xC061 => "Request data length does not match the number of points",

        // Target module / network errors
        0xC070 => "The device memory extension cannot be specified for the target station",
        0xC0B5 => "The CPU module cannot handle the data specified",
        0xC200 => "Remote password error",
        0xC201 => "The communication path is locked by the remote password",

        _ => "Unknown end code",
    }
}

/// Result type alias for MC protocol operations.
pub type Result<T> = std::result::Result<T, McError>;

/// Errors that can occur during MC protocol communication.
#[derive(Debug, Error)]
pub enum McError {
    /// Connect was called while the session is already open.
    #[error("session is already open")]
    AlreadyOpen,

    /// Connect was given an unparseable IPv4 dotted-quad address.
    #[error("invalid PLC IPv4 address \"{addr}\"")]
    InvalidIp {
        /// The address string that failed to parse.
        addr: String,
    },

    /// A read or write operation was attempted while disconnected.
    #[error("session is not open")]
    NotOpen,

    /// A read was given a write item, or a write was given a read item.
    #[error("wrong message kind: {reason}")]
    WrongMessageFormat {
        /// Description of the mismatch.
        reason: String,
    },

    /// A value could not be encoded into the PLC data format.
    #[error("value cannot be encoded for the PLC: {reason}")]
    InvalidDataFormat {
        /// Description of the encoding failure.
        reason: String,
    },

    /// A random-access frame would carry more points than the protocol allows.
    #[error("message size overflow: {count} {kind} points exceed the limit of 255")]
    MessageSizeOverflow {
        /// Point kind that overflowed (`"bit"`, `"word"` or `"dword"`).
        kind: &'static str,
        /// Number of points that were requested.
        count: usize,
    },

    /// The response header does not match the expected 3E prefix.
    #[error("response header mismatch: {reason}")]
    ProtocolMismatch {
        /// Description of the mismatching region.
        reason: String,
    },

    /// The response length field disagrees with the received buffer or the
    /// expected payload size.
    #[error("response length mismatch: length field says {declared}, expected {expected}")]
    LengthMismatch {
        /// Value carried in the response length field.
        declared: usize,
        /// Length the parser expected.
        expected: usize,
    },

    /// The PLC completed the request with a non-zero end code.
    #[error("device error (end code 0x{end_code:04X}): {}", mc_end_code_description(*.end_code))]
    DeviceError {
        /// The two-byte completion code from the response.
        end_code: u16,
        /// Any bytes that followed the end code in the response.
        trailing: Vec<u8>,
    },

    /// No response arrived within the configured timeout.
    #[error("communication timeout")]
    Timeout,

    /// I/O error on the underlying socket.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl McError {
    /// Creates a new `InvalidIp` error.
    pub fn invalid_ip(addr: impl Into<String>) -> Self {
        Self::InvalidIp { addr: addr.into() }
    }

    /// Creates a new `WrongMessageFormat` error.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::McError;
    ///
    /// let err = McError::wrong_message_format("read() requires a read item");
    /// ```
    pub fn wrong_message_format(reason: impl Into<String>) -> Self {
        Self::WrongMessageFormat {
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidDataFormat` error.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::McError;
    ///
    /// let err = McError::invalid_data_format("char value is not ASCII");
    /// ```
    pub fn invalid_data_format(reason: impl Into<String>) -> Self {
        Self::InvalidDataFormat {
            reason: reason.into(),
        }
    }

    /// Creates a new `MessageSizeOverflow` error.
    pub fn size_overflow(kind: &'static str, count: usize) -> Self {
        Self::MessageSizeOverflow { kind, count }
    }

    /// Creates a new `ProtocolMismatch` error.
    pub fn protocol_mismatch(reason: impl Into<String>) -> Self {
        Self::ProtocolMismatch {
            reason: reason.into(),
        }
    }

    /// Creates a new `LengthMismatch` error.
    pub fn length_mismatch(declared: usize, expected: usize) -> Self {
        Self::LengthMismatch { declared, expected }
    }

    /// Creates a new `DeviceError` from an end code and trailing bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::McError;
    ///
    /// let err = McError::device_error(0xC059, Vec::new());
    /// ```
    pub fn device_error(end_code: u16, trailing: Vec<u8>) -> Self {
        Self::DeviceError { end_code, trailing }
    }

    /// Returns the end-code description if this is a `DeviceError`.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::McError;
    ///
    /// let err = McError::device_error(0xC056, Vec::new());
    /// assert_eq!(
    ///     err.description(),
    ///     Some("Read or write request exceeds the maximum address")
    /// );
    ///
    /// let timeout = McError::Timeout;
    /// assert_eq!(timeout.description(), None);
    /// ```
    pub fn description(&self) -> Option<&'static str> {
        match self {
            Self::DeviceError { end_code, .. } => Some(mc_end_code_description(*end_code)),
            _ => None,
        }
    }
}
