//! # Loopback Transport
//!
//! An in-process [`Transport`] wired straight to a [`SimServer`]. Bytes
//! written by the client are reassembled into frames and answered
//! immediately; the encoded response waits in an inbound queue until the
//! client reads it.
//!
//! An optional chunk limit caps how many bytes each `send` and `receive`
//! call moves, so callers see the partial transfers a real socket produces.

use std::collections::VecDeque;

use crud_client::{Transport, TransportError};
use crud_codec::{CrudRequest, HEADER_SIZE};

use crate::SimServer;

pub struct LoopbackTransport {
    server: SimServer,
    connected: bool,
    chunk: Option<usize>,
    outbound: Vec<u8>,
    inbound: VecDeque<u8>,
}

impl LoopbackTransport {
    pub fn new(server: SimServer) -> Self {
        Self {
            server,
            connected: false,
            chunk: None,
            outbound: Vec::new(),
            inbound: VecDeque::new(),
        }
    }

    /// Limits every send and receive call to at most `chunk` bytes
    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = Some(chunk.max(1));
        self
    }

    pub fn server(&self) -> &SimServer {
        &self.server
    }

    fn limit(&self, len: usize) -> usize {
        self.chunk.map_or(len, |chunk| chunk.min(len))
    }

    /// Answers every complete frame waiting in the outbound buffer
    fn dispatch(&mut self) -> Result<(), TransportError> {
        while self.outbound.len() >= HEADER_SIZE {
            let mut header = [0u8; HEADER_SIZE];
            header.copy_from_slice(&self.outbound[..HEADER_SIZE]);
            let request = CrudRequest::from_wire(header)
                .map_err(|err| TransportError::Send(format!("store rejected frame: {}", err)))?;

            let payload_len = if request.request_type().carries_request_payload() {
                request.length() as usize
            } else {
                0
            };
            let frame_len = HEADER_SIZE + payload_len;
            if self.outbound.len() < frame_len {
                return Ok(());
            }

            let frame: Vec<u8> = self.outbound.drain(..frame_len).collect();
            let (response, data) = self.server.handle(&request, &frame[HEADER_SIZE..]);
            self.inbound.extend(response.to_wire());
            self.inbound.extend(data);
        }
        Ok(())
    }
}

impl Transport for LoopbackTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        if !self.connected {
            self.server.note_connection();
            self.connected = true;
        }
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        let n = self.limit(bytes.len());
        self.outbound.extend_from_slice(&bytes[..n]);
        self.dispatch()?;
        Ok(n)
    }

    fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        let n = self.limit(buffer.len()).min(self.inbound.len());
        for (slot, byte) in buffer.iter_mut().zip(self.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn close(&mut self) {
        self.connected = false;
        self.outbound.clear();
        self.inbound.clear();
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crud_client::{ClientError, CrudStore, ObjectStore};
    use crud_codec::{ObjectId, RequestFlags, RequestType};

    fn store(server: &SimServer, chunk: Option<usize>) -> CrudStore<LoopbackTransport> {
        let transport = LoopbackTransport::new(server.clone());
        let transport = match chunk {
            Some(chunk) => transport.with_chunk(chunk),
            None => transport,
        };
        CrudStore::new(transport)
    }

    #[test]
    fn test_store_round_trip_over_loopback() {
        let server = SimServer::new();
        let mut store = store(&server, None);

        store.init().unwrap();
        let info = store.create(b"payload", RequestFlags::empty()).unwrap();
        assert_eq!(info.id, ObjectId::new(1));
        assert_eq!(info.length, 7);

        let mut buffer = [0u8; 16];
        let read = store
            .read(info.id, RequestFlags::empty(), &mut buffer)
            .unwrap();
        assert_eq!(&buffer[..read.length as usize], b"payload");
        assert_eq!(server.connections(), 1);
    }

    #[test]
    fn test_single_byte_chunks() {
        let server = SimServer::new();
        let mut store = store(&server, Some(1));

        store.init().unwrap();
        let info = store.create(b"chunked", RequestFlags::empty()).unwrap();
        store
            .update(info.id, RequestFlags::empty(), b"CHUNKED")
            .unwrap();
        assert_eq!(server.object(info.id).unwrap(), b"CHUNKED");

        let mut buffer = [0u8; 7];
        store
            .read(info.id, RequestFlags::empty(), &mut buffer)
            .unwrap();
        assert_eq!(&buffer, b"CHUNKED");
    }

    #[test]
    fn test_store_failure_keeps_connection() {
        let server = SimServer::new();
        let mut store = store(&server, None);

        store.init().unwrap();
        let result = store.delete(ObjectId::new(42));
        assert!(matches!(result, Err(ClientError::StoreFailure { .. })));
        assert!(store.client().is_connected());
        assert_eq!(
            server.request_types(),
            vec![RequestType::Init, RequestType::Delete]
        );
    }

    #[test]
    fn test_close_then_reconnect() {
        let server = SimServer::new();
        let mut store = store(&server, None);

        store.init().unwrap();
        store.close().unwrap();
        assert!(!store.client().is_connected());

        store.init().unwrap();
        assert_eq!(server.connections(), 2);
    }

    #[test]
    fn test_send_requires_connection() {
        let mut transport = LoopbackTransport::new(SimServer::new());
        assert_eq!(transport.send(&[0u8; 8]), Err(TransportError::NotConnected));
    }
}
