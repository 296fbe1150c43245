//! MC client for communicating with Mitsubishi PLCs.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::command::{
    classify_value, BatchReadCommand, BatchWriteBitCommand, BatchWriteWordCommand,
    RandomReadCommand, RandomWriteBitCommand, RandomWriteCommand,
};
use crate::codec;
use crate::error::{McError, Result};
use crate::header::{FrameContext, ProtocolFormat};
use crate::response::parse_response;
use crate::session::Session;
use crate::value::{ReceiveItem, SendItem, Value};

/// Default PLC IP address.
pub const DEFAULT_IP: &str = "192.168.10.100";
/// Default MC server TCP port.
pub const DEFAULT_PORT: u16 = 6000;
/// Default timeout for clients built through [`ClientConfig::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(4000);

/// Configuration for creating an MC client.
///
/// The PLC address is kept as a string and parsed when connecting, so an
/// invalid dotted-quad surfaces as [`McError::InvalidIp`] from
/// [`McClient::connect`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// PLC IPv4 address as a dotted quad.
    pub ip: String,
    /// PLC TCP port.
    pub port: u16,
    /// Wire format for this session.
    pub format: ProtocolFormat,
    /// Network number in the access route.
    pub network_no: u8,
    /// PC number in the access route.
    pub pc_no: u8,
    /// Response deadline; also the monitoring timer, rounded down to 250 ms
    /// ticks.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration for the given PLC endpoint.
    ///
    /// Uses binary frames, network `0x00`, PC `0xFF` and a 4 s timeout.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::ClientConfig;
    ///
    /// let config = ClientConfig::new("192.168.10.100", 6000);
    /// assert_eq!(config.pc_no, 0xFF);
    /// ```
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
            format: ProtocolFormat::Binary,
            network_no: 0x00,
            pc_no: 0xFF,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom PLC port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the wire format.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::{ClientConfig, ProtocolFormat};
    ///
    /// let config = ClientConfig::new("192.168.10.100", 6000)
    ///     .with_format(ProtocolFormat::Ascii);
    /// assert_eq!(config.format, ProtocolFormat::Ascii);
    /// ```
    pub fn with_format(mut self, format: ProtocolFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the network number.
    pub fn with_network_no(mut self, network_no: u8) -> Self {
        self.network_no = network_no;
        self
    }

    /// Sets the PC number.
    pub fn with_pc_no(mut self, pc_no: u8) -> Self {
        self.pc_no = pc_no;
        self
    }

    /// Sets the response timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    /// The parameterless configuration: factory defaults with a 1 s timeout.
    fn default() -> Self {
        Self::new(DEFAULT_IP, DEFAULT_PORT).with_timeout(Duration::from_millis(1000))
    }
}

/// MC protocol client.
///
/// One client owns one TCP session. Read and write operations are
/// synchronous: they return once the response has been parsed. A broken
/// connection is re-established in the background within about a second; the
/// request that hit the break still fails and may be retried by the caller.
///
/// # Example
///
/// ```no_run
/// use melsec_mc::{McClient, ClientConfig, DeviceCode, SendItem};
///
/// let mut client = McClient::with_config(ClientConfig::new("192.168.10.100", 6000));
/// client.connect()?;
///
/// // Read two words from D100.
/// let item = client.read(&SendItem::read(DeviceCode::D, 100, 2))?;
/// println!("D100..D101 = {:?}", item.to_i16s());
///
/// // Write a 32-bit value to D200 and a bit to M10.
/// client.write(&SendItem::write(DeviceCode::D, 200, 0x0102_0304_i32))?;
/// client.write(&SendItem::write(DeviceCode::M, 10, true))?;
///
/// client.disconnect()?;
/// # Ok::<(), melsec_mc::McError>(())
/// ```
pub struct McClient {
    config: ClientConfig,
    session: Option<Session>,
}

impl McClient {
    /// Creates a client with the default configuration (1 s timeout).
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with the given configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the configuration for in-place mutation.
    ///
    /// Changes take effect on the next request; a request in flight keeps
    /// the snapshot it was encoded with.
    pub fn config_mut(&mut self) -> &mut ClientConfig {
        &mut self.config
    }

    /// Connects to the configured PLC endpoint.
    ///
    /// # Errors
    ///
    /// - [`McError::AlreadyOpen`] if the session is already open
    /// - [`McError::InvalidIp`] if the configured address does not parse
    /// - [`McError::Io`] if the TCP connection fails
    pub fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(McError::AlreadyOpen);
        }
        let ip: Ipv4Addr = self
            .config
            .ip
            .parse()
            .map_err(|_| McError::invalid_ip(&self.config.ip))?;
        let addr = SocketAddr::from((ip, self.config.port));
        self.session = Some(Session::open(addr)?);
        Ok(())
    }

    /// Updates the endpoint and connects.
    pub fn connect_to(&mut self, ip: impl Into<String>, port: u16) -> Result<()> {
        self.config.ip = ip.into();
        self.config.port = port;
        self.connect()
    }

    /// Closes the session and stops the worker threads. A no-op when already
    /// disconnected.
    pub fn disconnect(&mut self) -> Result<()> {
        if let Some(session) = self.session.take() {
            session.close();
        }
        Ok(())
    }

    /// Disconnects and reconnects.
    pub fn refresh(&mut self) -> Result<()> {
        self.disconnect()?;
        self.connect()
    }

    /// Returns whether the session is currently connected.
    ///
    /// Lock-free; never contends with a request in flight.
    pub fn is_connected(&self) -> bool {
        self.session
            .as_ref()
            .map(Session::is_connected)
            .unwrap_or(false)
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(McError::NotOpen)
    }

    /// Snapshots the configuration for one frame.
    fn context(&self) -> FrameContext {
        FrameContext {
            format: self.config.format,
            network_no: self.config.network_no,
            pc_no: self.config.pc_no,
            timer_ticks: (self.config.timeout.as_millis() / 250) as u16,
        }
    }

    /// Reads one contiguous word range.
    ///
    /// # Errors
    ///
    /// [`McError::WrongMessageFormat`] if `item` is a write request;
    /// otherwise the errors of the codec, session and parser.
    pub fn read(&self, item: &SendItem) -> Result<ReceiveItem> {
        let SendItem::Read {
            device,
            address,
            words,
        } = item
        else {
            return Err(McError::wrong_message_format("read() requires a read item"));
        };
        let ctx = self.context();
        let command = BatchReadCommand::new(*device, *address, *words)?;
        let session = self.session()?;
        let buf = session.transact(&command.to_frame(&ctx), self.config.timeout)?;
        let response = parse_response(&ctx, &buf, Some(command.expected_words()))?;
        Ok(ReceiveItem::new(*device, *address, response.payload))
    }

    /// Reads many scattered ranges in a single random-read request.
    ///
    /// A one-word item occupies a word slot; longer items use dword slots
    /// (two words each) plus a trailing word slot for an odd word. Results
    /// come back in input order.
    pub fn read_many(&self, items: &[SendItem]) -> Result<Vec<ReceiveItem>> {
        enum Slot {
            Word,
            Dword,
        }

        let mut word_points = Vec::new();
        let mut dword_points = Vec::new();
        let mut plans: Vec<Vec<Slot>> = Vec::with_capacity(items.len());

        for item in items {
            let SendItem::Read {
                device,
                address,
                words,
            } = item
            else {
                return Err(McError::wrong_message_format(
                    "read_many() requires read items",
                ));
            };
            if *words == 0 {
                return Err(McError::invalid_data_format(
                    "read request must cover at least one word",
                ));
            }
            let mut slots = Vec::new();
            if *words == 1 {
                word_points.push((*device, *address));
                slots.push(Slot::Word);
            } else {
                let dwords = u32::from(*words / 2);
                for i in 0..dwords {
                    dword_points.push((*device, *address + 2 * i));
                    slots.push(Slot::Dword);
                }
                if *words % 2 == 1 {
                    word_points.push((*device, *address + 2 * dwords));
                    slots.push(Slot::Word);
                }
            }
            plans.push(slots);
        }

        let ctx = self.context();
        let command = RandomReadCommand::new(word_points, dword_points)?;
        let session = self.session()?;
        let buf = session.transact(&command.to_frame(&ctx), self.config.timeout)?;
        let response = parse_response(&ctx, &buf, Some(command.expected_words()))?;

        // The payload carries all word values first, then all dword values.
        let word_region = command.word_count() * 2;
        let mut word_chunks = response.payload[..word_region].chunks_exact(2);
        let mut dword_chunks = response.payload[word_region..].chunks_exact(4);

        let mut results = Vec::with_capacity(items.len());
        for (item, slots) in items.iter().zip(&plans) {
            let mut bytes = Vec::new();
            for slot in slots {
                let chunk = match slot {
                    Slot::Word => word_chunks.next(),
                    Slot::Dword => dword_chunks.next(),
                };
                let chunk = chunk.ok_or_else(|| {
                    McError::protocol_mismatch("response payload shorter than the request plan")
                })?;
                bytes.extend_from_slice(chunk);
            }
            results.push(ReceiveItem::new(item.device(), item.address(), bytes));
        }
        Ok(results)
    }

    /// Writes one item with a batch (contiguous) write command.
    ///
    /// Bit values use the bit subcommand with bit-packed payloads; all other
    /// values pack into words.
    ///
    /// # Errors
    ///
    /// [`McError::WrongMessageFormat`] if `item` is a read request;
    /// otherwise the errors of the codec, session and parser.
    pub fn write(&self, item: &SendItem) -> Result<()> {
        let SendItem::Write {
            device,
            address,
            value,
        } = item
        else {
            return Err(McError::wrong_message_format(
                "write() requires a write item",
            ));
        };
        let ctx = self.context();
        let frame = match value {
            Value::Bit(bit) => {
                BatchWriteBitCommand::new(*device, *address, vec![*bit])?.to_frame(&ctx)
            }
            Value::Bits(bits) => {
                BatchWriteBitCommand::new(*device, *address, bits.clone())?.to_frame(&ctx)
            }
            other => {
                let bytes = codec::encode_value_words(other)?;
                BatchWriteWordCommand::new(*device, *address, bytes)?.to_frame(&ctx)
            }
        };
        let session = self.session()?;
        let buf = session.transact(&frame, self.config.timeout)?;
        parse_response(&ctx, &buf, None)?;
        Ok(())
    }

    /// Writes many scattered items with random-write commands.
    ///
    /// Bits and word-granular values cannot share a random-write frame, so
    /// up to two frames are sent: one for all bit points, one for all word
    /// and dword points. Both frames are assembled and validated before the
    /// first byte goes out.
    pub fn write_many(&self, items: &[SendItem]) -> Result<()> {
        let mut bit_points = Vec::new();
        let mut word_points = Vec::new();
        let mut dword_points = Vec::new();

        for item in items {
            let SendItem::Write {
                device,
                address,
                value,
            } = item
            else {
                return Err(McError::wrong_message_format(
                    "write_many() requires write items",
                ));
            };
            match value {
                Value::Bit(bit) => bit_points.push((*device, *address, *bit)),
                Value::Bits(bits) => {
                    for (i, bit) in bits.iter().enumerate() {
                        bit_points.push((*device, *address + i as u32, *bit));
                    }
                }
                other => {
                    classify_value(*device, *address, other, &mut word_points, &mut dword_points)?
                }
            }
        }

        let bit_command = if bit_points.is_empty() {
            None
        } else {
            Some(RandomWriteBitCommand::new(bit_points)?)
        };
        let word_command = if word_points.is_empty() && dword_points.is_empty() {
            None
        } else {
            Some(RandomWriteCommand::new(word_points, dword_points)?)
        };

        let ctx = self.context();
        let session = self.session()?;
        if let Some(command) = bit_command {
            let buf = session.transact(&command.to_frame(&ctx), self.config.timeout)?;
            parse_response(&ctx, &buf, None)?;
        }
        if let Some(command) = word_command {
            let buf = session.transact(&command.to_frame(&ctx), self.config.timeout)?;
            parse_response(&ctx, &buf, None)?;
        }
        Ok(())
    }
}

impl Default for McClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for McClient {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
    }
}

impl std::fmt::Debug for McClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McClient")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}
