//! TCP session management.
//!
//! The session owns the socket and two worker threads:
//!
//! - the *reader* blocks on the socket in 256-byte chunks, assembling one
//!   inbound buffer per short read and delivering it to the request in
//!   flight;
//! - the *watchdog* wakes once per second and silently re-establishes the
//!   connection whenever it finds the session down. Its failures are logged,
//!   never raised.
//!
//! Requests are serialized by the communication mutex, which guards the pair
//! (write request bytes, await response buffer) so at most one request is in
//! flight. Each request opens a fresh one-slot reply channel and registers
//! it as the pending slot; the reader delivers a completed buffer to that
//! slot, or discards the buffer on arrival when no request is waiting (a
//! late response for a request that already timed out). The reply channel is
//! polled in 10 ms slices up to the caller's deadline; expiry raises
//! [`McError::Timeout`] and leaves the session connected.
//!
//! The protocol carries no correlation field, so one hazardous interleaving
//! remains: a stale response that arrives after the *next* request has
//! already registered its slot is handed to that request. See the crate
//! design notes; callers that hit a timeout and cannot tolerate this should
//! refresh the session before the next request.
//!
//! Shutdown is cooperative: both workers observe a shutdown flag, and the
//! reader's blocking read is unblocked by shutting the socket down before the
//! join.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{McError, Result};

/// Size of the reader's per-call receive buffer. A response that fills the
/// buffer exactly keeps the reader collecting until a short read.
const READ_CHUNK: usize = 256;

/// Interval between reply-channel polls while a request waits.
const QUEUE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Interval between watchdog liveness checks.
const WATCHDOG_INTERVAL: Duration = Duration::from_secs(1);

/// Locks a mutex, recovering the guard if a panicking thread poisoned it.
fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// A connected MC session.
///
/// Dropping the session without calling [`Session::close`] leaks the worker
/// threads until their next flag check; callers go through the client, which
/// closes on disconnect and on drop.
pub(crate) struct Session {
    shared: Arc<Shared>,
    /// Communication mutex serializing the pair (write request, await reply).
    comm: Mutex<()>,
    watchdog: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    addr: SocketAddr,
    stream: Mutex<Option<TcpStream>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    /// Reply slot for the request in flight, opened afresh per request.
    /// Empty when no request is waiting; the reader discards buffers that
    /// arrive while it is empty.
    pending: Mutex<Option<Sender<Vec<u8>>>>,
    connected: AtomicBool,
    shutdown: AtomicBool,
}

impl Session {
    /// Connects to the PLC and starts the reader and watchdog threads.
    pub(crate) fn open(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        let shared = Arc::new(Shared {
            addr,
            stream: Mutex::new(None),
            reader: Mutex::new(None),
            pending: Mutex::new(None),
            connected: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        });
        Shared::install(&shared, stream)?;

        let watchdog = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || watchdog_loop(shared))
        };

        Ok(Self {
            shared,
            comm: Mutex::new(()),
            watchdog: Mutex::new(Some(watchdog)),
        })
    }

    /// Lock-free connection check.
    pub(crate) fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// Sends one request frame and returns the matching response buffer.
    ///
    /// Serialized against all other requests on this session. The reply
    /// channel is registered before the frame is written and deregistered
    /// before this returns, so a reply that never came within the deadline
    /// cannot be handed to a later request.
    pub(crate) fn transact(&self, frame: &[u8], timeout: Duration) -> Result<Vec<u8>> {
        let _comm = lock_or_recover(&self.comm);

        let (tx, rx) = mpsc::channel();
        *lock_or_recover(&self.shared.pending) = Some(tx);

        {
            let mut guard = lock_or_recover(&self.shared.stream);
            let stream = match guard.as_mut() {
                Some(stream) => stream,
                None => {
                    drop(guard);
                    *lock_or_recover(&self.shared.pending) = None;
                    return Err(McError::Io(std::io::Error::new(
                        std::io::ErrorKind::NotConnected,
                        "session is down, reconnect pending",
                    )));
                }
            };
            if let Err(e) = stream.write_all(frame) {
                drop(guard);
                *lock_or_recover(&self.shared.pending) = None;
                self.shared.connected.store(false, Ordering::Release);
                return Err(McError::Io(e));
            }
        }

        let deadline = Instant::now() + timeout;
        let result = loop {
            match rx.recv_timeout(QUEUE_POLL_INTERVAL) {
                Ok(buf) => break Ok(buf),
                Err(RecvTimeoutError::Timeout) => {
                    if Instant::now() >= deadline {
                        break Err(McError::Timeout);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    break Err(McError::Io(std::io::Error::new(
                        std::io::ErrorKind::BrokenPipe,
                        "reply channel closed",
                    )));
                }
            }
        };

        // Deregister before releasing the communication mutex; a reply that
        // arrives from now on finds no slot and is discarded by the reader.
        *lock_or_recover(&self.shared.pending) = None;
        result
    }

    /// Stops both workers, closes the socket and joins the threads.
    pub(crate) fn close(&self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.teardown();
        let handle = lock_or_recover(&self.watchdog).take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        // A reconnect that raced the shutdown flag leaves a fresh socket and
        // reader behind; tear them down now that the watchdog is gone.
        self.shared.teardown();
    }
}

impl Shared {
    /// Installs a freshly connected stream and spawns its reader thread.
    fn install(this: &Arc<Self>, stream: TcpStream) -> Result<()> {
        if this.shutdown.load(Ordering::Acquire) {
            let _ = stream.shutdown(Shutdown::Both);
            return Ok(());
        }
        let reader_stream = stream.try_clone()?;
        *lock_or_recover(&this.stream) = Some(stream);
        let shared = Arc::clone(this);
        let handle = thread::spawn(move || reader_loop(shared, reader_stream));
        *lock_or_recover(&this.reader) = Some(handle);
        this.connected.store(true, Ordering::Release);
        Ok(())
    }

    /// Marks the session down, closes the socket (unblocking the reader) and
    /// joins the reader thread. Idempotent.
    fn teardown(&self) {
        let stream = lock_or_recover(&self.stream).take();
        if let Some(stream) = stream {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.connected.store(false, Ordering::Release);
        let reader = lock_or_recover(&self.reader).take();
        if let Some(handle) = reader {
            let _ = handle.join();
        }
    }

    /// Tears the broken session down and builds a fresh one.
    fn reestablish(this: &Arc<Self>) -> Result<()> {
        this.teardown();
        let stream = TcpStream::connect(this.addr)?;
        stream.set_nodelay(true)?;
        Shared::install(this, stream)
    }
}

fn reader_loop(shared: Arc<Shared>, mut stream: TcpStream) {
    loop {
        let mut frame: Vec<u8> = Vec::new();
        loop {
            let mut chunk = [0u8; READ_CHUNK];
            match stream.read(&mut chunk) {
                Ok(0) => {
                    if !shared.shutdown.load(Ordering::Acquire) {
                        debug!("reader exiting: peer closed the connection");
                        shared.connected.store(false, Ordering::Release);
                    }
                    return;
                }
                Ok(n) => {
                    frame.extend_from_slice(&chunk[..n]);
                    if n < READ_CHUNK {
                        break;
                    }
                }
                Err(e) => {
                    if !shared.shutdown.load(Ordering::Acquire) {
                        debug!(error = %e, "reader exiting on socket error");
                        shared.connected.store(false, Ordering::Release);
                    }
                    return;
                }
            }
        }
        match lock_or_recover(&shared.pending).take() {
            Some(tx) => {
                let _ = tx.send(frame);
            }
            None => debug!(
                len = frame.len(),
                "discarding late response with no request pending"
            ),
        }
    }
}

fn watchdog_loop(shared: Arc<Shared>) {
    loop {
        thread::sleep(WATCHDOG_INTERVAL);
        if shared.shutdown.load(Ordering::Acquire) {
            return;
        }
        if shared.connected.load(Ordering::Acquire) {
            continue;
        }
        match Shared::reestablish(&shared) {
            Ok(()) => debug!(addr = %shared.addr, "watchdog re-established the session"),
            Err(e) => warn!(addr = %shared.addr, error = %e, "watchdog reconnect failed"),
        }
    }
}
