//! Example: Writing data to PLC devices
//!
//! Run with: cargo run --example simple_write
//!
//! This example demonstrates:
//! - Writing words, dwords, floats and strings
//! - Writing single bits and bit sequences
//! - Scattered multi-point writes in a single request

use melsec_mc::{ClientConfig, DeviceCode, McClient, SendItem};

fn main() -> melsec_mc::Result<()> {
    // =========================================================================
    // Connect to PLC
    // =========================================================================

    let mut client = McClient::with_config(ClientConfig::new("192.168.10.100", 6000));
    client.connect()?;

    // =========================================================================
    // Writing Words
    // =========================================================================

    println!("=== Writing Words ===\n");

    // Single word
    client.write(&SendItem::write(DeviceCode::D, 100, 1234_u16))?;
    println!("D100 <- 1234");

    // A sequence of words lands at consecutive addresses
    client.write(&SendItem::write(DeviceCode::D, 110, vec![1_i16, -2, 3]))?;
    println!("D110-D112 <- [1, -2, 3]");

    // 32-bit and floating point values span two words each
    client.write(&SendItem::write(DeviceCode::D, 220, -123_456_i32))?;
    client.write(&SendItem::write(DeviceCode::D, 200, 21.5_f32))?;
    println!("D220 <- -123456 (i32), D200 <- 21.5 (f32)");

    // Strings pack two ASCII chars per word
    client.write(&SendItem::write(DeviceCode::D, 230, "PRODUCT-001"))?;
    println!("D230 <- \"PRODUCT-001\"");

    // =========================================================================
    // Writing Bits
    // =========================================================================

    println!("\n=== Writing Bits ===\n");

    // Single relay
    client.write(&SendItem::write(DeviceCode::M, 10, true))?;
    println!("M10 <- ON");

    // Consecutive relays in one request
    client.write(&SendItem::write(DeviceCode::M, 20, vec![true, false, true]))?;
    println!("M20-M22 <- [ON, OFF, ON]");

    // =========================================================================
    // Multiple Write (Single Request)
    // =========================================================================

    println!("\n=== Multiple Write ===\n");

    // Scattered points; bits and words are split into separate frames on
    // the wire but handed over together
    client.write_many(&[
        SendItem::write(DeviceCode::M, 10, true),
        SendItem::write(DeviceCode::D, 20, 7_i16),
        SendItem::write(DeviceCode::D, 40, 0x0102_0304_u32),
    ])?;
    println!("M10 <- ON, D20 <- 7, D40 <- 0x01020304");

    client.disconnect()?;
    println!("\nWrite example completed!");
    Ok(())
}
