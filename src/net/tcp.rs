use super::traits::ClientTransport;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::{Error, ErrorKind, Read, Result, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Shared outbound TCP client, the handle hosts use once the link is up.
///
/// One stream at a time: connecting again replaces the previous stream.
pub struct TcpClient {
    stream: Mutex<Option<TcpStream>>,
}

impl TcpClient {
    pub fn new() -> Self {
        TcpClient {
            stream: Mutex::new(None),
        }
    }

    /// Connect with an upper bound on the handshake time.
    pub fn connect_timeout(&self, addr: SocketAddr, timeout: Duration) -> Result<()> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.connect_timeout(&SockAddr::from(addr), timeout)?;
        self.install(socket)
    }

    /// Get peer address
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.current()?.peer_addr()
    }

    /// Get local address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.current()?.local_addr()
    }

    fn install(&self, socket: Socket) -> Result<()> {
        // Links on these boards drop silently; keepalive surfaces dead peers.
        socket.set_keepalive(true)?;
        socket.set_nodelay(true)?;
        let stream: TcpStream = socket.into();
        *self.lock() = Some(stream);
        Ok(())
    }

    /// Clone of the current stream so blocking I/O happens outside the lock.
    fn current(&self) -> Result<TcpStream> {
        match self.lock().as_ref() {
            Some(stream) => stream.try_clone(),
            None => Err(Error::new(ErrorKind::NotConnected, "Client not connected")),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<TcpStream>> {
        self.stream.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for TcpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientTransport for TcpClient {
    fn connect(&self, addr: SocketAddr) -> Result<()> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.connect(&SockAddr::from(addr))?;
        self.install(socket)
    }

    fn send(&self, data: &[u8]) -> Result<usize> {
        self.current()?.write(data)
    }

    fn receive(&self, buffer: &mut [u8]) -> Result<usize> {
        self.current()?.read(buffer)
    }

    fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    fn close(&self) {
        if let Some(stream) = self.lock().take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
    }
}
