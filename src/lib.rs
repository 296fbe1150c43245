//! # MELSEC MC Protocol Library
//!
//! A Rust library for communicating with Mitsubishi PLCs using the MELSEC
//! Communication (MC) protocol, 3E frame family, over TCP.
//!
//! The client keeps one persistent connection per session and exchanges
//! exactly one request and one response at a time. A background watchdog
//! silently re-establishes a broken connection within about a second.
//!
//! ## Features
//!
//! - **Two wire formats** — binary (little-endian packed) and ASCII
//!   (uppercase hex text) 3E frames, selectable per session
//! - **Typed values** — booleans, integers of every width, floats, chars,
//!   strings and byte sequences, with word/dword packing handled for you
//! - **Batch and random access** — contiguous reads/writes plus scattered
//!   multi-point reads/writes in a single request
//! - **Self-healing session** — reader thread plus reconnect watchdog
//! - **No panics** — all errors returned as `Result<T, McError>`
//!
//! ## Quick Start
//!
//! ```no_run
//! use melsec_mc::{McClient, ClientConfig, DeviceCode, SendItem};
//!
//! fn main() -> melsec_mc::Result<()> {
//!     let mut client = McClient::with_config(ClientConfig::new("192.168.10.100", 6000));
//!     client.connect()?;
//!
//!     // Read two words starting at D100
//!     let item = client.read(&SendItem::read(DeviceCode::D, 100, 2))?;
//!     println!("D100..D101 = {:?}", item.to_i16s());
//!
//!     // Write a 32-bit value to D200
//!     client.write(&SendItem::write(DeviceCode::D, 200, 0x0102_0304_i32))?;
//!
//!     // Set the M10 relay
//!     client.write(&SendItem::write(DeviceCode::M, 10, true))?;
//!
//!     // Scattered access in one request each way
//!     client.write_many(&[
//!         SendItem::write(DeviceCode::M, 10, true),
//!         SendItem::write(DeviceCode::D, 20, 7_i16),
//!     ])?;
//!     let items = client.read_many(&[
//!         SendItem::read(DeviceCode::D, 0, 1),
//!         SendItem::read(DeviceCode::D, 10, 2),
//!     ])?;
//!     println!("D0 = {:?}, D10 = {:?}", items[0].to_u16s(), items[1].to_u32s());
//!
//!     client.disconnect()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Soft Devices
//!
//! The library addresses the common Q/L-series soft devices:
//!
//! | Devices | Kind | ASCII notation |
//! |---------|------|----------------|
//! | M, SM, L, F, V | relays | decimal |
//! | X, Y, B, SB, DX, DY | inputs/outputs, link relays | hexadecimal |
//! | D, SD, R, ZR, W, SW | data/file/link registers | decimal |
//! | TC, TS, TN, CC, CS, CN | timer/counter contacts, coils, values | decimal |
//! | Z | index register | decimal |
//!
//! See [`DeviceCode`] for the full list with binary tags.
//!
//! ## Values
//!
//! A write carries a [`Value`]: a single bit, a bit sequence, a scalar
//! ([`Scalar`]), a scalar sequence, a string, a char sequence or raw bytes.
//! Plain Rust types convert directly:
//!
//! ```
//! use melsec_mc::{DeviceCode, SendItem};
//!
//! let _ = SendItem::write(DeviceCode::D, 0, 1234_u16);
//! let _ = SendItem::write(DeviceCode::D, 2, -7.5_f32);
//! let _ = SendItem::write(DeviceCode::D, 10, "LOT-42");
//! let _ = SendItem::write(DeviceCode::M, 0, vec![true, false, true]);
//! ```
//!
//! Reads come back as a [`ReceiveItem`] whose accessors reinterpret the raw
//! little-endian payload (`to_i16s`, `to_u32s`, `to_f64s`, `to_bools`,
//! `to_text`, …).
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, McError>`](McError). PLC-side failures
//! carry the protocol end code and a description:
//!
//! ```no_run
//! use melsec_mc::{McClient, DeviceCode, SendItem, McError};
//!
//! let mut client = McClient::new();
//! client.connect()?;
//! match client.read(&SendItem::read(DeviceCode::D, 0, 1)) {
//!     Ok(item) => println!("D0 = {:?}", item.to_u16s()),
//!     Err(McError::DeviceError { end_code, .. }) => {
//!         eprintln!("PLC error 0x{:04X}", end_code);
//!     }
//!     Err(e) => eprintln!("{}", e),
//! }
//! # Ok::<(), McError>(())
//! ```
//!
//! ## Configuration
//!
//! ```
//! use melsec_mc::{ClientConfig, ProtocolFormat};
//! use std::time::Duration;
//!
//! let config = ClientConfig::new("192.168.10.100", 6000)
//!     .with_format(ProtocolFormat::Ascii)     // default: Binary
//!     .with_network_no(0x00)
//!     .with_pc_no(0xFF)
//!     .with_timeout(Duration::from_secs(2));  // default: 4 s
//! ```
//!
//! ## Concurrency Model
//!
//! Operations are synchronous and serialized: a single communication lock
//! pairs each request with its response, so at most one request is in
//! flight per session. `is_connected` is a lock-free load and never blocks
//! behind a request.

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod client;
mod codec;
mod command;
mod device;
mod error;
mod header;
mod response;
mod session;
mod value;

// Public re-exports
pub use client::{ClientConfig, McClient, DEFAULT_IP, DEFAULT_PORT, DEFAULT_TIMEOUT};
pub use device::DeviceCode;
pub use error::{mc_end_code_description, McError, Result};
pub use header::ProtocolFormat;
pub use value::{ReceiveItem, Scalar, SendItem, Value};
