//! Soft-device definitions for the MC protocol.
//!
//! This module defines the [`DeviceCode`] enum which represents the memory
//! areas ("soft devices") addressable in Mitsubishi PLCs through 3E frames.
//! Each device has a fixed one-byte binary tag and a one- or two-letter
//! mnemonic used in ASCII frames.
//!
//! # Addressing notation
//!
//! Devices in the tag range `0x9C..=0xA3` (X, Y, B, SB, DX, DY) render their
//! addresses in hexadecimal in ASCII frames; all other devices use decimal.
//! Binary frames always carry the raw 24-bit offset.
//!
//! # Example
//!
//! ```
//! use melsec_mc::DeviceCode;
//!
//! assert_eq!(DeviceCode::D.code(), 0xA8);
//! assert_eq!(DeviceCode::D.mnemonic(), "D");
//! assert!(!DeviceCode::D.is_hex_addressed());
//! assert!(DeviceCode::X.is_hex_addressed());
//!
//! // Parse a textual device address
//! let (device, offset) = DeviceCode::parse_address("X1F").unwrap();
//! assert_eq!(device, DeviceCode::X);
//! assert_eq!(offset, 0x1F);
//! ```

use crate::error::{McError, Result};

/// Soft devices addressable through MC 3E frames.
///
/// Each variant maps to the one-byte device tag carried in binary frames and
/// to the mnemonic prefix carried in ASCII frames. The enum covers the
/// bit devices (relays, inputs/outputs, timer and counter contacts/coils) and
/// the word devices (data/file/link registers, timer and counter current
/// values, index registers).
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCode {
    /// Internal relay.
    M,
    /// Special relay.
    SM,
    /// Latch relay.
    L,
    /// Annunciator.
    F,
    /// Edge relay.
    V,
    /// Input.
    X,
    /// Output.
    Y,
    /// Link relay.
    B,
    /// Link special relay.
    SB,
    /// Direct access input.
    DX,
    /// Direct access output.
    DY,
    /// Data register.
    D,
    /// Special register.
    SD,
    /// File register (block switching).
    R,
    /// File register (serial number access).
    ZR,
    /// Link register.
    W,
    /// Link special register.
    SW,
    /// Timer coil.
    TC,
    /// Timer contact.
    TS,
    /// Timer current value.
    TN,
    /// Counter coil.
    CC,
    /// Counter contact.
    CS,
    /// Counter current value.
    CN,
    /// Index register.
    Z,
}

/// Mnemonics ordered longest-first so that prefix identification never
/// mistakes `SM10` for `M10` or `ZR0` for `Z0`.
const PREFIX_ORDER: &[DeviceCode] = &[
    DeviceCode::SM,
    DeviceCode::SB,
    DeviceCode::SD,
    DeviceCode::SW,
    DeviceCode::DX,
    DeviceCode::DY,
    DeviceCode::ZR,
    DeviceCode::TC,
    DeviceCode::TS,
    DeviceCode::TN,
    DeviceCode::CC,
    DeviceCode::CS,
    DeviceCode::CN,
    DeviceCode::M,
    DeviceCode::L,
    DeviceCode::F,
    DeviceCode::V,
    DeviceCode::X,
    DeviceCode::Y,
    DeviceCode::B,
    DeviceCode::D,
    DeviceCode::R,
    DeviceCode::W,
    DeviceCode::Z,
];

impl DeviceCode {
    /// Returns the one-byte binary device tag used in 3E frames.
    pub fn code(self) -> u8 {
        match self {
            DeviceCode::M => 0x90,
            DeviceCode::SM => 0x91,
            DeviceCode::L => 0x92,
            DeviceCode::F => 0x93,
            DeviceCode::V => 0x94,
            DeviceCode::X => 0x9C,
            DeviceCode::Y => 0x9D,
            DeviceCode::B => 0xA0,
            DeviceCode::SB => 0xA1,
            DeviceCode::DX => 0xA2,
            DeviceCode::DY => 0xA3,
            DeviceCode::D => 0xA8,
            DeviceCode::SD => 0xA9,
            DeviceCode::R => 0xAF,
            DeviceCode::ZR => 0xB0,
            DeviceCode::W => 0xB4,
            DeviceCode::SW => 0xB5,
            DeviceCode::TC => 0xC0,
            DeviceCode::TS => 0xC1,
            DeviceCode::TN => 0xC2,
            DeviceCode::CC => 0xC3,
            DeviceCode::CS => 0xC4,
            DeviceCode::CN => 0xC5,
            DeviceCode::Z => 0xCC,
        }
    }

    /// Returns the mnemonic prefix used in ASCII frames and textual
    /// addresses.
    pub fn mnemonic(self) -> &'static str {
        match self {
            DeviceCode::M => "M",
            DeviceCode::SM => "SM",
            DeviceCode::L => "L",
            DeviceCode::F => "F",
            DeviceCode::V => "V",
            DeviceCode::X => "X",
            DeviceCode::Y => "Y",
            DeviceCode::B => "B",
            DeviceCode::SB => "SB",
            DeviceCode::DX => "DX",
            DeviceCode::DY => "DY",
            DeviceCode::D => "D",
            DeviceCode::SD => "SD",
            DeviceCode::R => "R",
            DeviceCode::ZR => "ZR",
            DeviceCode::W => "W",
            DeviceCode::SW => "SW",
            DeviceCode::TC => "TC",
            DeviceCode::TS => "TS",
            DeviceCode::TN => "TN",
            DeviceCode::CC => "CC",
            DeviceCode::CS => "CS",
            DeviceCode::CN => "CN",
            DeviceCode::Z => "Z",
        }
    }

    /// Returns whether this device renders its address in hexadecimal in
    /// ASCII frames.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::DeviceCode;
    ///
    /// assert!(DeviceCode::X.is_hex_addressed());
    /// assert!(DeviceCode::DY.is_hex_addressed());
    /// assert!(!DeviceCode::M.is_hex_addressed());
    /// assert!(!DeviceCode::W.is_hex_addressed());
    /// ```
    pub fn is_hex_addressed(self) -> bool {
        (0x9C..=0xA3).contains(&self.code())
    }

    /// Splits a textual device address like `"D100"` or `"X1F"` into its
    /// device code and numeric offset.
    ///
    /// The mnemonic is matched longest-first; the remaining digits are parsed
    /// in the device's native base (hexadecimal for hex-addressed devices,
    /// decimal otherwise).
    ///
    /// # Errors
    ///
    /// Returns `InvalidDataFormat` if no known mnemonic prefixes the string
    /// or the numeric part fails to parse.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::DeviceCode;
    ///
    /// assert_eq!(DeviceCode::parse_address("D100").unwrap(), (DeviceCode::D, 100));
    /// assert_eq!(DeviceCode::parse_address("SM42").unwrap(), (DeviceCode::SM, 42));
    /// assert_eq!(DeviceCode::parse_address("X1F").unwrap(), (DeviceCode::X, 0x1F));
    /// assert!(DeviceCode::parse_address("Q7").is_err());
    /// ```
    pub fn parse_address(text: &str) -> Result<(DeviceCode, u32)> {
        let upper = text.trim().to_uppercase();
        for device in PREFIX_ORDER {
            let mnemonic = device.mnemonic();
            if let Some(rest) = upper.strip_prefix(mnemonic) {
                let radix = if device.is_hex_addressed() { 16 } else { 10 };
                let offset = u32::from_str_radix(rest, radix).map_err(|_| {
                    McError::invalid_data_format(format!(
                        "invalid offset \"{}\" for device {}",
                        rest, mnemonic
                    ))
                })?;
                return Ok((*device, offset));
            }
        }
        Err(McError::invalid_data_format(format!(
            "unknown device mnemonic in \"{}\"",
            text
        )))
    }
}

impl std::fmt::Display for DeviceCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[(DeviceCode, u8, &str)] = &[
        (DeviceCode::M, 0x90, "M"),
        (DeviceCode::SM, 0x91, "SM"),
        (DeviceCode::L, 0x92, "L"),
        (DeviceCode::F, 0x93, "F"),
        (DeviceCode::V, 0x94, "V"),
        (DeviceCode::X, 0x9C, "X"),
        (DeviceCode::Y, 0x9D, "Y"),
        (DeviceCode::B, 0xA0, "B"),
        (DeviceCode::SB, 0xA1, "SB"),
        (DeviceCode::DX, 0xA2, "DX"),
        (DeviceCode::DY, 0xA3, "DY"),
        (DeviceCode::D, 0xA8, "D"),
        (DeviceCode::SD, 0xA9, "SD"),
        (DeviceCode::R, 0xAF, "R"),
        (DeviceCode::ZR, 0xB0, "ZR"),
        (DeviceCode::W, 0xB4, "W"),
        (DeviceCode::SW, 0xB5, "SW"),
        (DeviceCode::TC, 0xC0, "TC"),
        (DeviceCode::TS, 0xC1, "TS"),
        (DeviceCode::TN, 0xC2, "TN"),
        (DeviceCode::CC, 0xC3, "CC"),
        (DeviceCode::CS, 0xC4, "CS"),
        (DeviceCode::CN, 0xC5, "CN"),
        (DeviceCode::Z, 0xCC, "Z"),
    ];

    #[test]
    fn test_codes_and_mnemonics() {
        for (device, code, mnemonic) in ALL {
            assert_eq!(device.code(), *code, "tag for {}", mnemonic);
            assert_eq!(device.mnemonic(), *mnemonic);
            assert_eq!(device.to_string(), *mnemonic);
        }
    }

    #[test]
    fn test_hex_addressed_devices() {
        let hex: Vec<&str> = ALL
            .iter()
            .filter(|(d, _, _)| d.is_hex_addressed())
            .map(|(_, _, m)| *m)
            .collect();
        assert_eq!(hex, ["X", "Y", "B", "SB", "DX", "DY"]);
    }

    #[test]
    fn test_parse_address_decimal() {
        assert_eq!(
            DeviceCode::parse_address("D100").unwrap(),
            (DeviceCode::D, 100)
        );
        assert_eq!(
            DeviceCode::parse_address("m12345").unwrap(),
            (DeviceCode::M, 12345)
        );
    }

    #[test]
    fn test_parse_address_hex() {
        assert_eq!(
            DeviceCode::parse_address("X1F").unwrap(),
            (DeviceCode::X, 0x1F)
        );
        assert_eq!(
            DeviceCode::parse_address("SB0A").unwrap(),
            (DeviceCode::SB, 0x0A)
        );
    }

    #[test]
    fn test_parse_address_longest_prefix_wins() {
        assert_eq!(
            DeviceCode::parse_address("SM10").unwrap(),
            (DeviceCode::SM, 10)
        );
        assert_eq!(
            DeviceCode::parse_address("ZR7").unwrap(),
            (DeviceCode::ZR, 7)
        );
        assert_eq!(
            DeviceCode::parse_address("TN3").unwrap(),
            (DeviceCode::TN, 3)
        );
    }

    #[test]
    fn test_parse_address_invalid() {
        assert!(DeviceCode::parse_address("Q7").is_err());
        assert!(DeviceCode::parse_address("D").is_err());
        assert!(DeviceCode::parse_address("DZZ").is_err());
    }
}
