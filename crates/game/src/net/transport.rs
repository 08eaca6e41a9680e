use std::collections::HashMap;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use super::codec::PacketCodec;
use super::queue::SafeQueue;

/// Datagrams are read into a fixed buffer of this size; anything that
/// fills it is treated as oversize and dropped.
pub const RECV_BUFFER_SIZE: usize = 1024;

/// The endpoint id a client-role transport uses for its single server peer.
pub const SERVER_ENDPOINT_ID: u32 = 0;

/// How long the I/O thread blocks in a socket read before rechecking the
/// running flag, which bounds `stop()` latency.
const READ_TIMEOUT: Duration = Duration::from_millis(250);

/// One inbound datagram: the stable id of the sending endpoint plus the
/// raw payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundPacket {
    pub endpoint: u32,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Server,
    Client,
}

#[derive(Debug, Default)]
struct PeerTable {
    by_addr: HashMap<SocketAddr, u32>,
    by_id: HashMap<u32, SocketAddr>,
    next_id: u32,
}

impl PeerTable {
    fn resolve_or_assign(&mut self, addr: SocketAddr) -> u32 {
        if let Some(&id) = self.by_addr.get(&addr) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.by_addr.insert(addr, id);
        self.by_id.insert(id, addr);
        log::info!("new endpoint {} assigned id {}", addr, id);
        id
    }

    fn insert(&mut self, id: u32, addr: SocketAddr) {
        self.by_addr.insert(addr, id);
        self.by_id.insert(id, addr);
    }

    fn addr_of(&self, id: u32) -> Option<SocketAddr> {
        self.by_id.get(&id).copied()
    }

    fn contains_addr(&self, addr: &SocketAddr) -> bool {
        self.by_addr.contains_key(addr)
    }

    fn pairs(&self) -> Vec<(u32, SocketAddr)> {
        let mut out: Vec<(u32, SocketAddr)> =
            self.by_id.iter().map(|(&id, &addr)| (id, addr)).collect();
        out.sort_unstable_by_key(|(id, _)| *id);
        out
    }
}

/// UDP transport multiplexing many remote endpoints onto one socket.
///
/// A server-role transport binds a port and assigns a stable 32-bit id to
/// every distinct remote address it hears from; a client-role transport
/// binds an ephemeral port and pins id [`SERVER_ENDPOINT_ID`] to the server
/// peer. Delivery is at-most-once and unordered, as UDP gives it.
///
/// `start()` spawns the owned I/O thread, which performs all socket reads
/// and pushes `(id, bytes)` pairs onto a thread-safe queue; the game thread
/// consumes them through the non-blocking `poll()`. Sends go straight out
/// on the shared socket, which is safe from any thread.
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    role: Role,
    codec: PacketCodec,
    peers: Arc<Mutex<PeerTable>>,
    inbound: Arc<SafeQueue<InboundPacket>>,
    running: Arc<AtomicBool>,
    io_thread: Option<JoinHandle<()>>,
}

impl UdpTransport {
    /// Bind a server-role transport. Endpoint ids are handed out from 1.
    pub fn server<A: ToSocketAddrs>(bind_addr: A) -> io::Result<Self> {
        let socket = UdpSocket::bind(bind_addr)?;
        let table = PeerTable {
            next_id: 1,
            ..PeerTable::default()
        };
        Self::from_socket(socket, Role::Server, table)
    }

    /// Bind a client-role transport on an ephemeral port, talking to a
    /// single server peer addressed as endpoint 0.
    pub fn client(server_addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        let mut table = PeerTable::default();
        table.insert(SERVER_ENDPOINT_ID, server_addr);
        Self::from_socket(socket, Role::Client, table)
    }

    fn from_socket(socket: UdpSocket, role: Role, table: PeerTable) -> io::Result<Self> {
        socket.set_read_timeout(Some(READ_TIMEOUT))?;
        let local_addr = socket.local_addr()?;

        Ok(Self {
            socket: Arc::new(socket),
            local_addr,
            role,
            codec: PacketCodec,
            peers: Arc::new(Mutex::new(table)),
            inbound: Arc::new(SafeQueue::new()),
            running: Arc::new(AtomicBool::new(false)),
            io_thread: None,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn codec(&self) -> &PacketCodec {
        &self.codec
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Begin asynchronous receive on the owned I/O thread. Calling `start`
    /// on a running transport is a no-op.
    pub fn start(&mut self) {
        if self.io_thread.is_some() {
            return;
        }
        self.running.store(true, Ordering::SeqCst);

        let socket = Arc::clone(&self.socket);
        let peers = Arc::clone(&self.peers);
        let inbound = Arc::clone(&self.inbound);
        let running = Arc::clone(&self.running);
        let role = self.role;

        self.io_thread = Some(std::thread::spawn(move || {
            let mut buffer = [0u8; RECV_BUFFER_SIZE];
            while running.load(Ordering::SeqCst) {
                match socket.recv_from(&mut buffer) {
                    Ok((0, _)) => continue,
                    Ok((len, addr)) => {
                        if len >= RECV_BUFFER_SIZE {
                            log::warn!("dropping oversize datagram from {}", addr);
                            continue;
                        }
                        let endpoint = {
                            let mut table = peers.lock().unwrap_or_else(|e| e.into_inner());
                            match role {
                                Role::Server => table.resolve_or_assign(addr),
                                Role::Client => {
                                    if !table.contains_addr(&addr) {
                                        log::trace!("dropping datagram from unknown peer {}", addr);
                                        continue;
                                    }
                                    SERVER_ENDPOINT_ID
                                }
                            }
                        };
                        inbound.push(InboundPacket {
                            endpoint,
                            payload: buffer[..len].to_vec(),
                        });
                    }
                    Err(e)
                        if e.kind() == io::ErrorKind::WouldBlock
                            || e.kind() == io::ErrorKind::TimedOut =>
                    {
                        continue;
                    }
                    Err(e) => {
                        if running.load(Ordering::SeqCst) {
                            log::error!("socket receive error: {}", e);
                        }
                    }
                }
            }
        }));
    }

    /// Cease receives and join the I/O thread. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.io_thread.take() {
            if handle.join().is_err() {
                log::error!("I/O thread panicked during shutdown");
            }
        }
    }

    /// Send one datagram to the named endpoint. Fails silently (with a log
    /// line) on an unknown id or a stopped transport.
    pub fn send(&self, bytes: &[u8], endpoint: u32) {
        if !self.is_running() {
            log::debug!("send on stopped transport dropped (endpoint {})", endpoint);
            return;
        }
        let addr = {
            let table = self.peers.lock().unwrap_or_else(|e| e.into_inner());
            table.addr_of(endpoint)
        };
        let Some(addr) = addr else {
            log::warn!("send to unknown endpoint id {} dropped", endpoint);
            return;
        };
        if let Err(e) = self.socket.send_to(bytes, addr) {
            log::warn!("send to {} failed: {}", addr, e);
        }
    }

    /// Pop one inbound packet if any. Non-blocking; called from the game
    /// thread.
    pub fn poll(&self) -> Option<InboundPacket> {
        self.inbound.pop()
    }

    /// Enumerate known `(id, address)` pairs. Server role only; a client
    /// transport reports none.
    pub fn clients(&self) -> Vec<(u32, SocketAddr)> {
        match self.role {
            Role::Server => self
                .peers
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pairs(),
            Role::Client => Vec::new(),
        }
    }
}

impl Drop for UdpTransport {
    fn drop(&mut self) {
        self.stop();
    }
}
