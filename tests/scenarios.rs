//! End-to-end scenarios against an in-process mock PLC.
//!
//! Each test scripts the exact request bytes the client must emit and the
//! canned response the mock returns, then drives the public API over a real
//! TCP connection.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use melsec_mc::{ClientConfig, DeviceCode, McClient, McError, ProtocolFormat, SendItem};

/// One scripted request/response pair.
struct Exchange {
    expect: Vec<u8>,
    reply: Vec<u8>,
}

impl Exchange {
    fn new(expect: &[u8], reply: &[u8]) -> Self {
        Self {
            expect: expect.to_vec(),
            reply: reply.to_vec(),
        }
    }
}

/// Spawns a mock PLC that serves the given exchanges per accepted
/// connection, dropping the connection between sessions.
fn spawn_plc(sessions: Vec<Vec<Exchange>>) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        for exchanges in sessions {
            let (mut conn, _) = listener.accept().unwrap();
            for exchange in exchanges {
                let mut buf = vec![0u8; exchange.expect.len()];
                conn.read_exact(&mut buf).unwrap();
                assert_eq!(
                    buf, exchange.expect,
                    "request bytes differ from the scripted frame"
                );
                conn.write_all(&exchange.reply).unwrap();
            }
            // Connection drops here when `conn` goes out of scope.
        }
    });
    (addr, handle)
}

fn connect(addr: SocketAddr) -> McClient {
    let mut client = McClient::with_config(
        ClientConfig::new("127.0.0.1", addr.port()).with_timeout(Duration::from_millis(4000)),
    );
    client.connect().unwrap();
    client
}

#[test]
fn batch_read_two_words() {
    let request = [
        0x50, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x0C, 0x00, 0x10, 0x00, 0x01, 0x04, 0x00, 0x00,
        0x64, 0x00, 0x00, 0xA8, 0x02, 0x00,
    ];
    let response = [
        0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x06, 0x00, 0x00, 0x00, 0x01, 0x00, 0x02, 0x00,
    ];
    let (addr, plc) = spawn_plc(vec![vec![Exchange::new(&request, &response)]]);

    let mut client = connect(addr);
    let item = client.read(&SendItem::read(DeviceCode::D, 100, 2)).unwrap();
    assert_eq!(item.to_i16s(), vec![1, 2]);
    assert_eq!(item.device(), DeviceCode::D);
    assert_eq!(item.address(), 100);

    client.disconnect().unwrap();
    plc.join().unwrap();
}

#[test]
fn batch_write_i32() {
    let request = [
        0x50, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x10, 0x00, 0x10, 0x00, 0x01, 0x14, 0x00, 0x00,
        0xC8, 0x00, 0x00, 0xA8, 0x02, 0x00, 0x04, 0x03, 0x02, 0x01,
    ];
    let response = [0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x02, 0x00, 0x00, 0x00];
    let (addr, plc) = spawn_plc(vec![vec![Exchange::new(&request, &response)]]);

    let mut client = connect(addr);
    client
        .write(&SendItem::write(DeviceCode::D, 200, 0x0102_0304_i32))
        .unwrap();

    client.disconnect().unwrap();
    plc.join().unwrap();
}

#[test]
fn random_write_splits_bits_from_words() {
    // Bits and words cannot share a random-write frame: M10=true goes out in
    // a bit frame, D20=7 in a word frame.
    let bit_request = [
        0x50, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x0D, 0x00, 0x10, 0x00, 0x02, 0x14, 0x01, 0x00,
        0x01, 0x0A, 0x00, 0x00, 0x90, 0x90, 0x01,
    ];
    let word_request = [
        0x50, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x0E, 0x00, 0x10, 0x00, 0x02, 0x14, 0x00, 0x00,
        0x01, 0x00, 0x14, 0x00, 0x00, 0xA8, 0x07, 0x00,
    ];
    let ack = [0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x02, 0x00, 0x00, 0x00];
    let (addr, plc) = spawn_plc(vec![vec![
        Exchange::new(&bit_request, &ack),
        Exchange::new(&word_request, &ack),
    ]]);

    let mut client = connect(addr);
    client
        .write_many(&[
            SendItem::write(DeviceCode::M, 10, true),
            SendItem::write(DeviceCode::D, 20, 7_i16),
        ])
        .unwrap();

    client.disconnect().unwrap();
    plc.join().unwrap();
}

#[test]
fn random_read_partitions_words_and_dwords() {
    // (D0, 1 word) takes a word slot, (D10, 2 words) takes a dword slot.
    let request = [
        0x50, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x10, 0x00, 0x10, 0x00, 0x03, 0x04, 0x00, 0x00,
        0x01, 0x01, 0x00, 0x00, 0x00, 0xA8, 0x0A, 0x00, 0x00, 0xA8,
    ];
    // Payload: word region [05 00], dword region [01 00 02 00].
    let response = [
        0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x08, 0x00, 0x00, 0x00, 0x05, 0x00, 0x01, 0x00,
        0x02, 0x00,
    ];
    let (addr, plc) = spawn_plc(vec![vec![Exchange::new(&request, &response)]]);

    let mut client = connect(addr);
    let items = client
        .read_many(&[
            SendItem::read(DeviceCode::D, 0, 1),
            SendItem::read(DeviceCode::D, 10, 2),
        ])
        .unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].to_u16s(), vec![5]);
    assert_eq!(items[1].to_u16s(), vec![1, 2]);

    client.disconnect().unwrap();
    plc.join().unwrap();
}

#[test]
fn ascii_batch_read_round_trip() {
    let request = b"500000FF03FF000018001004010000D*0001000002";
    let response = b"D00000FF03FF00000C000000010002";
    let (addr, plc) = spawn_plc(vec![vec![Exchange::new(request, response)]]);

    let mut client = McClient::with_config(
        ClientConfig::new("127.0.0.1", addr.port())
            .with_format(ProtocolFormat::Ascii)
            .with_timeout(Duration::from_millis(4000)),
    );
    client.connect().unwrap();

    let item = client.read(&SendItem::read(DeviceCode::D, 100, 2)).unwrap();
    assert_eq!(item.to_i16s(), vec![1, 2]);

    client.disconnect().unwrap();
    plc.join().unwrap();
}

#[test]
fn device_error_carries_end_code() {
    let request = [
        0x50, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x0C, 0x00, 0x10, 0x00, 0x01, 0x04, 0x00, 0x00,
        0x00, 0x00, 0x00, 0xA8, 0x01, 0x00,
    ];
    let response = [0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x02, 0x00, 0x59, 0xC0];
    let (addr, plc) = spawn_plc(vec![vec![Exchange::new(&request, &response)]]);

    let mut client = connect(addr);
    let err = client
        .read(&SendItem::read(DeviceCode::D, 0, 1))
        .unwrap_err();
    match err {
        McError::DeviceError { end_code, .. } => assert_eq!(end_code, 0xC059),
        other => panic!("expected DeviceError, got {:?}", other),
    }

    client.disconnect().unwrap();
    plc.join().unwrap();
}

#[test]
fn timeout_leaves_session_connected() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let plc = thread::spawn(move || {
        let (mut conn, _) = listener.accept().unwrap();
        let mut buf = [0u8; 64];
        let _ = conn.read(&mut buf);
        // Never reply; hold the socket open past the client timeout.
        thread::sleep(Duration::from_millis(400));
    });

    let mut client = McClient::with_config(
        ClientConfig::new("127.0.0.1", addr.port()).with_timeout(Duration::from_millis(100)),
    );
    client.connect().unwrap();

    let err = client
        .read(&SendItem::read(DeviceCode::D, 0, 1))
        .unwrap_err();
    assert!(matches!(err, McError::Timeout));
    assert!(client.is_connected());

    client.disconnect().unwrap();
    plc.join().unwrap();
}

#[test]
fn watchdog_reconnects_after_broken_pipe() {
    let read_request = [
        0x50, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x0C, 0x00, 0x10, 0x00, 0x01, 0x04, 0x00, 0x00,
        0x64, 0x00, 0x00, 0xA8, 0x01, 0x00,
    ];
    let read_response = [
        0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x04, 0x00, 0x00, 0x00, 0x2A, 0x00,
    ];
    // First session: one successful read, then the mock drops the socket.
    // Second session: the same read succeeds again after the reconnect.
    let (addr, plc) = spawn_plc(vec![
        vec![Exchange::new(&read_request, &read_response)],
        vec![Exchange::new(&read_request, &read_response)],
    ]);

    let mut client = connect(addr);
    let item = client.read(&SendItem::read(DeviceCode::D, 100, 1)).unwrap();
    assert_eq!(item.to_u16s(), vec![42]);

    // Wait for the reader to notice the peer closed the connection.
    let start = Instant::now();
    while client.is_connected() && start.elapsed() < Duration::from_secs(2) {
        thread::sleep(Duration::from_millis(10));
    }
    assert!(!client.is_connected(), "broken pipe was not observed");

    // The watchdog runs once per second; it must restore the session soon.
    let start = Instant::now();
    while !client.is_connected() && start.elapsed() < Duration::from_secs(3) {
        thread::sleep(Duration::from_millis(25));
    }
    assert!(client.is_connected(), "watchdog did not reconnect");

    let item = client.read(&SendItem::read(DeviceCode::D, 100, 1)).unwrap();
    assert_eq!(item.to_u16s(), vec![42]);

    client.disconnect().unwrap();
    plc.join().unwrap();
}

#[test]
fn oversized_random_write_sends_nothing() {
    // The mock asserts that not a single byte arrives.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let plc = thread::spawn(move || {
        let (mut conn, _) = listener.accept().unwrap();
        conn.set_read_timeout(Some(Duration::from_millis(300))).unwrap();
        let mut buf = [0u8; 64];
        match conn.read(&mut buf) {
            Ok(0) => {}
            Ok(n) => panic!("oversized request leaked {} bytes to the socket", n),
            Err(_) => {}
        }
    });

    let mut client = connect(addr);
    let items: Vec<SendItem> = (0..300)
        .map(|i| SendItem::write(DeviceCode::D, i, 1_i16))
        .collect();
    let err = client.write_many(&items).unwrap_err();
    assert!(matches!(
        err,
        McError::MessageSizeOverflow {
            kind: "word",
            count: 300
        }
    ));

    client.disconnect().unwrap();
    plc.join().unwrap();
}

#[test]
fn refresh_rebuilds_the_session() {
    let ping = [
        0x50, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x0C, 0x00, 0x10, 0x00, 0x01, 0x04, 0x00, 0x00,
        0x00, 0x00, 0x00, 0xA8, 0x01, 0x00,
    ];
    let pong = [
        0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x04, 0x00, 0x00, 0x00, 0x07, 0x00,
    ];
    let (addr, plc) = spawn_plc(vec![
        vec![Exchange::new(&ping, &pong)],
        vec![Exchange::new(&ping, &pong)],
    ]);

    let mut client = connect(addr);
    assert_eq!(
        client
            .read(&SendItem::read(DeviceCode::D, 0, 1))
            .unwrap()
            .to_u16s(),
        vec![7]
    );

    client.refresh().unwrap();
    assert!(client.is_connected());
    assert_eq!(
        client
            .read(&SendItem::read(DeviceCode::D, 0, 1))
            .unwrap()
            .to_u16s(),
        vec![7]
    );

    client.disconnect().unwrap();
    plc.join().unwrap();
}
