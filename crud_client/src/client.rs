//! Request/response exchange over a [`Transport`]

use crud_codec::{CrudRequest, RequestType, HEADER_SIZE};

use crate::{ClientError, Transport, TransportError};

/// Connection lifecycle of a [`ProtocolClient`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No live connection; the next exchange connects first
    Disconnected,
    /// Idle with a live connection
    Connected,
    /// Writing a request header and payload
    Sending,
    /// Waiting for the response header and payload
    AwaitingResponse,
}

/// Payload attached to one exchange
///
/// CREATE and UPDATE send `Outgoing` bytes after the header. READ responses
/// land in the `Incoming` buffer, which must be large enough for the whole
/// object.
pub enum Payload<'a> {
    None,
    Outgoing(&'a [u8]),
    Incoming(&'a mut [u8]),
}

/// Drives single request/response exchanges with the object store.
///
/// Exactly one exchange is in flight at a time: the protocol carries no
/// request identifiers, so responses are matched to requests by order alone.
pub struct ProtocolClient<T: Transport> {
    transport: T,
    state: ConnectionState,
    exchanges: u64,
}

impl<T: Transport> ProtocolClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: ConnectionState::Disconnected,
            exchanges: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state != ConnectionState::Disconnected
    }

    /// Number of completed exchanges
    pub fn exchange_count(&self) -> u64 {
        self.exchanges
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Establishes the connection. A no-op when already connected.
    pub fn connect(&mut self) -> Result<(), ClientError> {
        if self.is_connected() {
            return Ok(());
        }

        self.transport.connect()?;
        self.state = ConnectionState::Connected;
        Ok(())
    }

    /// Closes the connection without a CLOSE exchange
    pub fn disconnect(&mut self) {
        self.transport.close();
        self.state = ConnectionState::Disconnected;
    }

    /// Sends `request` and returns the decoded response.
    ///
    /// Transport and protocol failures leave the client disconnected; the
    /// next exchange reconnects.
    pub fn exchange(
        &mut self,
        request: &CrudRequest,
        payload: Payload<'_>,
    ) -> Result<CrudRequest, ClientError> {
        let (outgoing, incoming) = match payload {
            Payload::None => (None, None),
            Payload::Outgoing(bytes) => (Some(bytes), None),
            Payload::Incoming(buffer) => (None, Some(buffer)),
        };

        let request_type = request.request_type();
        let outgoing = if request_type.carries_request_payload() {
            let expected = request.length() as usize;
            let bytes = outgoing.unwrap_or(&[]);
            if bytes.len() < expected {
                return Err(ClientError::MissingPayload {
                    request: request_type,
                    expected,
                    actual: bytes.len(),
                });
            }
            Some(&bytes[..expected])
        } else {
            None
        };

        self.connect()?;

        match self.round_trip(request, outgoing, incoming) {
            Ok(response) => {
                self.exchanges += 1;
                Ok(response)
            }
            Err(err) => {
                log::warn!("{} exchange failed, dropping connection: {}", request_type, err);
                self.disconnect();
                Err(err)
            }
        }
    }

    fn round_trip(
        &mut self,
        request: &CrudRequest,
        outgoing: Option<&[u8]>,
        incoming: Option<&mut [u8]>,
    ) -> Result<CrudRequest, ClientError> {
        log::debug!("-> {}", request);

        self.state = ConnectionState::Sending;
        send_all(&mut self.transport, &request.to_wire())?;
        if let Some(bytes) = outgoing {
            send_all(&mut self.transport, bytes)?;
        }

        self.state = ConnectionState::AwaitingResponse;
        let mut header = [0u8; HEADER_SIZE];
        receive_exact(&mut self.transport, &mut header)?;
        let response = CrudRequest::from_wire(header).map_err(|err| {
            ClientError::Protocol(format!("malformed response header: {}", err))
        })?;
        log::debug!("<- {}", response);

        if response.request_type() != request.request_type() {
            return Err(ClientError::Protocol(format!(
                "{} answered with {}",
                request.request_type(),
                response.request_type()
            )));
        }

        if response.request_type().carries_response_payload() {
            let mut empty = [0u8; 0];
            let buffer = match incoming {
                Some(buffer) => buffer,
                None => &mut empty[..],
            };
            let length = response.length() as usize;
            if length > buffer.len() {
                return Err(ClientError::Protocol(format!(
                    "response payload of {} bytes exceeds {} byte buffer",
                    length,
                    buffer.len()
                )));
            }
            receive_exact(&mut self.transport, &mut buffer[..length])?;
        }

        if response.request_type() == RequestType::Close {
            self.transport.close();
            self.state = ConnectionState::Disconnected;
        } else {
            self.state = ConnectionState::Connected;
        }

        Ok(response)
    }
}

fn send_all<T: Transport>(transport: &mut T, bytes: &[u8]) -> Result<(), TransportError> {
    let mut sent = 0;
    while sent < bytes.len() {
        let written = transport.send(&bytes[sent..])?;
        if written == 0 {
            return Err(TransportError::Send(format!(
                "stream accepted no bytes after {} of {}",
                sent,
                bytes.len()
            )));
        }
        sent += written;
    }
    Ok(())
}

fn receive_exact<T: Transport>(transport: &mut T, buffer: &mut [u8]) -> Result<(), TransportError> {
    let mut received = 0;
    while received < buffer.len() {
        let read = transport.receive(&mut buffer[received..])?;
        if read == 0 {
            return Err(TransportError::Closed);
        }
        received += read;
    }
    Ok(())
}
