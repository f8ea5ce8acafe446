//! Byte stream abstraction
//!
//! The protocol client only needs four primitives from the network: connect,
//! a single (possibly partial) write, a single (possibly partial) read, and
//! close. Accumulating partial transfers is the client's job, so transports
//! stay thin and easy to fake.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};

use crate::TransportError;

/// Blocking stream connection to an object store
pub trait Transport {
    /// Establishes the connection
    fn connect(&mut self) -> Result<(), TransportError>;

    /// Writes some prefix of `bytes`, returning how many were written
    fn send(&mut self, bytes: &[u8]) -> Result<usize, TransportError>;

    /// Reads up to `buffer.len()` bytes, returning how many were read.
    /// Zero means the peer closed the stream.
    fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, TransportError>;

    /// Tears the connection down. Closing a closed transport is a no-op.
    fn close(&mut self);

    /// Whether a connection is currently live
    fn is_connected(&self) -> bool;
}

/// TCP transport backed by `std::net::TcpStream`
pub struct TcpTransport {
    address: String,
    port: u16,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            stream: None,
        }
    }

    /// Returns `address:port`
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    fn stream(&mut self) -> Result<&mut TcpStream, TransportError> {
        self.stream.as_mut().ok_or(TransportError::NotConnected)
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let stream = TcpStream::connect((self.address.as_str(), self.port)).map_err(|err| {
            TransportError::Connect {
                address: self.endpoint(),
                reason: err.to_string(),
            }
        })?;
        stream
            .set_nodelay(true)
            .map_err(|err| TransportError::Connect {
                address: self.endpoint(),
                reason: err.to_string(),
            })?;

        log::debug!("connected to {}", self.endpoint());
        self.stream = Some(stream);
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        self.stream()?
            .write(bytes)
            .map_err(|err| TransportError::Send(err.to_string()))
    }

    fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, TransportError> {
        self.stream()?
            .read(buffer)
            .map_err(|err| TransportError::Receive(err.to_string()))
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            log::debug!("closed connection to {}", self.endpoint());
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_tcp_send_receive() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4];
            socket.read_exact(&mut buf).unwrap();
            socket.write_all(&buf).unwrap();
        });

        let mut transport = TcpTransport::new("127.0.0.1", port);
        assert!(!transport.is_connected());
        transport.connect().unwrap();
        assert!(transport.is_connected());

        let mut sent = 0;
        while sent < 4 {
            sent += transport.send(&[1, 2, 3, 4][sent..]).unwrap();
        }

        let mut echoed = [0u8; 4];
        let mut received = 0;
        while received < 4 {
            received += transport.receive(&mut echoed[received..]).unwrap();
        }
        assert_eq!(echoed, [1, 2, 3, 4]);

        transport.close();
        assert!(!transport.is_connected());
        server.join().unwrap();
    }

    #[test]
    fn test_tcp_connect_refused() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let mut transport = TcpTransport::new("127.0.0.1", port);
        let result = transport.connect();
        assert!(matches!(result, Err(TransportError::Connect { .. })));
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_tcp_io_requires_connection() {
        let mut transport = TcpTransport::new("127.0.0.1", 1);
        assert_eq!(transport.send(&[0]), Err(TransportError::NotConnected));
        let mut buf = [0u8; 1];
        assert_eq!(transport.receive(&mut buf), Err(TransportError::NotConnected));
    }
}
