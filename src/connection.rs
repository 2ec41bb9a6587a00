//! Blocking-agnostic connection facade over a [`Client`].
//!
//! The facade owns a [`Transport`] and moves bytes between it and the
//! Sans-IO state machine. Transports signal backpressure with
//! [`Poll::WouldBlock`] instead of blocking, so the same facade works over
//! blocking sockets, nonblocking sockets and in-memory test pipes.

use std::sync::Arc;

use log::debug;

use crate::client::Client;
use crate::config::Config;
use crate::error::Error;

const READ_CHUNK: usize = 4096;

/// Outcome of a transport or connection operation that may need to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll<T> {
    Ready(T),
    /// The transport cannot proceed right now. Retry when it is readable
    /// or writable again.
    WouldBlock,
}

/// Byte transport under a connection.
///
/// `read` returning `Ready(0)` means EOF. Neither call may block when the
/// underlying channel supports nonblocking operation; they report
/// [`Poll::WouldBlock`] instead.
pub trait Transport {
    fn read(&mut self, buf: &mut [u8]) -> Result<Poll<usize>, Error>;

    fn write(&mut self, data: &[u8]) -> Result<Poll<usize>, Error>;
}

impl Transport for std::net::TcpStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<Poll<usize>, Error> {
        match std::io::Read::read(self, buf) {
            Ok(n) => Ok(Poll::Ready(n)),
            Err(e) => map_io_error(e),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<Poll<usize>, Error> {
        match std::io::Write::write(self, data) {
            Ok(n) => Ok(Poll::Ready(n)),
            Err(e) => map_io_error(e),
        }
    }
}

fn map_io_error(e: std::io::Error) -> Result<Poll<usize>, Error> {
    match e.kind() {
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::Interrupted => Ok(Poll::WouldBlock),
        std::io::ErrorKind::UnexpectedEof
        | std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::BrokenPipe => Err(Error::TransportClosed),
        _ => Err(Error::Transport(e.to_string())),
    }
}

/// A TLS client connection over a [`Transport`].
pub struct Connection<T: Transport> {
    /// Taken on close so the transport is released exactly once.
    transport: Option<T>,
    client: Client,
    /// Partially written record, kept across `WouldBlock`.
    pending_tx: Vec<u8>,
    closed: bool,
}

impl<T: Transport> Connection<T> {
    /// Open a connection and drive the handshake as far as the transport
    /// allows.
    ///
    /// When the transport reports `WouldBlock` mid-handshake the connection
    /// is returned unestablished; resume with
    /// [`complete_handshake`](Connection::complete_handshake). A failed
    /// handshake is an error.
    pub fn connect(transport: T, server_name: &str, config: Arc<Config>) -> Result<Self, Error> {
        let client = Client::new(config, server_name)?;
        let mut connection = Connection {
            transport: Some(transport),
            client,
            pending_tx: Vec::new(),
            closed: false,
        };
        connection.complete_handshake()?;
        Ok(connection)
    }

    /// Resume a handshake suspended on `WouldBlock`.
    ///
    /// `Ready(())` means established. A handshake that reached the failed
    /// state surfaces as an error on this call.
    pub fn complete_handshake(&mut self) -> Result<Poll<()>, Error> {
        loop {
            if let Poll::WouldBlock = self.flush_tx()? {
                return Ok(Poll::WouldBlock);
            }

            if let Some(error) = self.client.handshake_error() {
                return Err(error);
            }
            if self.client.is_established() {
                return Ok(Poll::Ready(()));
            }

            if matches!(self.client.state(), crate::client::HandshakeState::Start)
                || self.client.can_make_progress()
            {
                self.client.advance(None)?;
                continue;
            }

            let mut buf = [0u8; READ_CHUNK];
            match self.transport()?.read(&mut buf)? {
                Poll::WouldBlock => return Ok(Poll::WouldBlock),
                Poll::Ready(0) => return Err(Error::TransportClosed),
                Poll::Ready(n) => {
                    self.client.advance(Some(&buf[..n]))?;
                }
            }
        }
    }

    pub fn is_established(&self) -> bool {
        self.client.is_established()
    }

    /// Read decrypted application data.
    ///
    /// Fails with [`Error::NotEstablished`] before the handshake completes
    /// and [`Error::TransportClosed`] after the peer closed.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<Poll<usize>, Error> {
        if buf.is_empty() {
            return Ok(Poll::Ready(0));
        }
        loop {
            let n = self.client.read_application_data(buf)?;
            if n > 0 {
                return Ok(Poll::Ready(n));
            }

            if self.client.can_make_progress() {
                self.client.advance(None)?;
                continue;
            }

            let mut chunk = [0u8; READ_CHUNK];
            match self.transport()?.read(&mut chunk)? {
                Poll::WouldBlock => return Ok(Poll::WouldBlock),
                Poll::Ready(0) => return Err(Error::TransportClosed),
                Poll::Ready(n) => {
                    self.client.advance(Some(&chunk[..n]))?;
                }
            }
        }
    }

    /// Encrypt and send application data.
    ///
    /// The data is always accepted in full; what the transport does not
    /// take immediately stays queued and flushes on later calls or
    /// [`flush`](Connection::flush).
    pub fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        let n = self.client.send_application_data(data)?;
        let _ = self.flush_tx()?;
        Ok(n)
    }

    /// Push queued records into the transport.
    pub fn flush(&mut self) -> Result<Poll<()>, Error> {
        self.flush_tx()
    }

    /// Send close_notify (when established) and release the transport.
    ///
    /// Idempotent. Flushing is best effort; a transport that cannot take
    /// the alert right now does not keep the connection alive.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if self.client.is_established() && !self.client.peer_closed() {
            self.client.queue_close_notify()?;
            let _ = self.flush_tx();
        }

        debug!("Connection closed");
        self.transport = None;
        Ok(())
    }

    fn transport(&mut self) -> Result<&mut T, Error> {
        self.transport.as_mut().ok_or(Error::TransportClosed)
    }

    fn flush_tx(&mut self) -> Result<Poll<()>, Error> {
        loop {
            if self.pending_tx.is_empty() {
                match self.client.poll_transmit() {
                    Some(record) => self.pending_tx = record,
                    None => return Ok(Poll::Ready(())),
                }
            }
            let pending = std::mem::take(&mut self.pending_tx);
            match self.transport()?.write(&pending) {
                Ok(Poll::Ready(0)) => {
                    self.pending_tx = pending;
                    return Err(Error::TransportClosed);
                }
                Ok(Poll::Ready(n)) => {
                    self.pending_tx = pending;
                    self.pending_tx.drain(..n);
                }
                Ok(Poll::WouldBlock) => {
                    self.pending_tx = pending;
                    return Ok(Poll::WouldBlock);
                }
                Err(e) => {
                    self.pending_tx = pending;
                    return Err(e);
                }
            }
        }
    }
}

impl<T: Transport> Drop for Connection<T> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl<T: Transport> std::fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("client", &self.client)
            .field("closed", &self.closed)
            .finish()
    }
}
