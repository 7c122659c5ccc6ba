use std::sync::Arc;

use crate::address::{InetAddress, SocketAddress};
use crate::error::{ErrorKind, Failure, Result};
use crate::network::{Network, Socket, INVALID_SOCKET, TCP_V4};

/// Blocking mode applied to the pair's endpoints at start.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SocketPairMode {
    Blocking,
    NonBlocking,
}

/// Self-connected TCP loopback pair.
///
/// The writer end is always non-blocking; the reader follows the caller's
/// mode. Any thread can wake a thread blocked on the reader by writing a
/// byte to the writer. Both endpoints are valid after a successful
/// [`SocketPair::start`] and both are invalid after [`SocketPair::stop`].
pub struct SocketPair {
    network: Arc<Network>,
    sockets: [Socket; 2],
}

impl SocketPair {
    pub fn new(network: Arc<Network>) -> Self {
        Self {
            network,
            sockets: [INVALID_SOCKET, INVALID_SOCKET],
        }
    }

    pub fn create(network: Arc<Network>, mode: SocketPairMode) -> Result<Self> {
        let mut pair = Self::new(network);
        pair.start(mode)?;
        Ok(pair)
    }

    pub fn reader(&self) -> Socket {
        self.sockets[0]
    }

    pub fn writer(&self) -> Socket {
        self.sockets[1]
    }

    /// Rendezvous through a loopback listener on port zero: bind, read the
    /// assigned port, connect a second socket, accept. The accepted socket
    /// becomes the reader, the connecting socket the writer, and the
    /// listener is closed right away. Idempotent on a started pair.
    pub fn start(&mut self, mode: SocketPairMode) -> Result<()> {
        if self.reader().is_valid() {
            return Ok(());
        }

        match self.start_inner(mode) {
            Ok(sockets) => {
                self.sockets = sockets;
                log::trace!(
                    "socket pair started (reader={}, writer={})",
                    self.sockets[0],
                    self.sockets[1]
                );
                Ok(())
            }
            Err(failure) => Err(failure),
        }
    }

    fn start_inner(&self, mode: SocketPairMode) -> Result<[Socket; 2]> {
        let network = &self.network;

        let listener = network
            .create_socket(TCP_V4)
            .map_err(|e| e.with_context("failed to initialize notify listener"))?;

        let result = (|| {
            let address = SocketAddress::inet(InetAddress::LOOPBACK, 0);
            network.bind(listener, &address).map_err(|e| {
                e.with_context(format!(
                    "failed to bind notify listener '{}' to '{}'",
                    listener, address
                ))
            })?;
            network.listen(listener, 1).map_err(|e| {
                e.with_context(format!("failed to listen on notify listener '{}'", listener))
            })?;

            let remote = network.get_sock_name(listener).map_err(|e| {
                e.with_context(format!(
                    "failed to determine notify listener name '{}'",
                    listener
                ))
            })?;

            let writer = network
                .create_socket(TCP_V4)
                .map_err(|e| e.with_context("failed to initialize notify writer"))?;

            let connected = (|| {
                network.connect(writer, &remote).map_err(|e| {
                    e.with_context(format!("failed to connect notify writer '{}'", writer))
                })?;

                let accepted = network.accept(listener).map_err(|e| {
                    e.with_context(format!(
                        "failed to accept read end of the notify pair on '{}'",
                        listener
                    ))
                })?;
                Ok(accepted.sock)
            })();

            let reader = match connected {
                Ok(reader) => reader,
                Err(failure) => {
                    let _ = network.close(writer);
                    return Err(failure);
                }
            };

            // the writer never blocks; the reader follows the caller
            let reader_blocking = mode == SocketPairMode::Blocking;
            if let Err(failure) = network
                .set_blocking(writer, false)
                .and_then(|_| network.set_blocking(reader, reader_blocking))
            {
                let _ = network.close(writer);
                let _ = network.close(reader);
                return Err(
                    failure.with_context("failed to apply blocking mode to the notify pair")
                );
            }

            Ok([reader, writer])
        })();

        let _ = network.close(listener);
        result
    }

    /// Non-blocking reads until `NetWouldBlock`; the only valid way to
    /// clear the pipe.
    pub fn drain(&self) -> Result<()> {
        if !self.reader().is_valid() {
            return Err(Failure::new(ErrorKind::NotInitialized)
                .with_context("socket pair is not started"));
        }

        let mut buffer = [0u8; 16];

        loop {
            match self.network.recv(self.reader(), &mut buffer) {
                Ok(_) => continue,
                Err(failure) if failure == ErrorKind::NetWouldBlock => break,
                Err(failure) => {
                    return Err(failure.with_context(format!(
                        "failed to drain notification socket '{}'",
                        self.reader()
                    )))
                }
            }
        }

        Ok(())
    }

    /// Close both endpoints. Safe to call repeatedly.
    pub fn stop(&mut self) -> Result<()> {
        for sock in self.sockets.iter_mut() {
            if sock.is_valid() {
                let _ = self.network.close(*sock);
                *sock = INVALID_SOCKET;
            }
        }
        Ok(())
    }
}

impl Drop for SocketPair {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
