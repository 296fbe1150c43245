//! Example: Reading data from PLC devices
//!
//! Run with: cargo run --example simple_read
//!
//! This example demonstrates:
//! - Reading words from different soft devices
//! - Type conversions (i16, u32, f32, strings, bits)
//! - Scattered multi-point reads in a single request

use melsec_mc::{ClientConfig, DeviceCode, McClient, SendItem};

fn main() -> melsec_mc::Result<()> {
    // =========================================================================
    // Connect to PLC
    // =========================================================================

    let mut client = McClient::with_config(ClientConfig::new("192.168.10.100", 6000));
    client.connect()?;

    // =========================================================================
    // Reading Words (16-bit values)
    // =========================================================================

    println!("=== Reading Words ===\n");

    // Read a single word from the data register area
    let item = client.read(&SendItem::read(DeviceCode::D, 0, 1))?;
    println!("D0 = {} (0x{:04X})", item.to_u16s()[0], item.to_u16s()[0]);

    // Read five consecutive words
    let item = client.read(&SendItem::read(DeviceCode::D, 100, 5))?;
    println!("D100-D104: {:?}", item.to_u16s());

    // Signed interpretation of the same bytes
    println!("As i16: {:?}", item.to_i16s());

    // =========================================================================
    // Reading Bits
    // =========================================================================

    println!("\n=== Reading Bits ===\n");

    // Relays are read as words and unpacked to bits, 16 per word
    let item = client.read(&SendItem::read(DeviceCode::M, 0, 1))?;
    let bits = item.to_bools();
    println!("M0-M15: {:?}", &bits[..16]);
    for (i, bit) in bits.iter().enumerate() {
        if *bit {
            println!("  M{} is ON", i);
        }
    }

    // =========================================================================
    // Type Conversions
    // =========================================================================

    println!("\n=== Type Conversions ===\n");

    // f32 (REAL) - 2 words
    let temperature = client.read(&SendItem::read(DeviceCode::D, 200, 2))?;
    println!("Temperature (f32 from D200-201): {:.2}", temperature.to_f32s()[0]);

    // f64 (LREAL) - 4 words
    let precise = client.read(&SendItem::read(DeviceCode::D, 210, 4))?;
    println!("Precision value (f64 from D210-213): {:.10}", precise.to_f64s()[0]);

    // i32 (DINT) - 2 words
    let counter = client.read(&SendItem::read(DeviceCode::D, 220, 2))?;
    println!("Counter (i32 from D220-221): {}", counter.to_i32s()[0]);

    // ASCII string - 2 chars per word
    let product = client.read(&SendItem::read(DeviceCode::D, 230, 6))?;
    println!("Product code (string from D230, 6 words): \"{}\"", product.to_text());

    // =========================================================================
    // Multiple Read (Single Request)
    // =========================================================================

    println!("\n=== Multiple Read ===\n");

    // Read scattered addresses in one request (more efficient)
    let items = client.read_many(&[
        SendItem::read(DeviceCode::D, 0, 1),
        SendItem::read(DeviceCode::D, 100, 2),
        SendItem::read(DeviceCode::W, 0x10, 1),
    ])?;

    println!("D0 = {}", items[0].to_u16s()[0]);
    println!("D100 (dword) = {}", items[1].to_u32s()[0]);
    println!("W10 = 0x{:04X}", items[2].to_u16s()[0]);

    client.disconnect()?;
    println!("\nRead example completed!");
    Ok(())
}
