//! # Failing Transport
//!
//! A Transport wrapper that simulates connection faults for testing error
//! propagation and reconnection.

use crud_client::{Transport, TransportError};

/// Policy for when failures should occur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Never fail (passthrough)
    Never,
    /// Refuse every connection attempt
    RefuseConnect,
    /// Fail after N successful sends
    AfterSends(usize),
    /// Report the peer closed after N successful receives
    AfterReceives(usize),
}

/// Wrapper around a Transport that can simulate failures
pub struct FailingTransport<T: Transport> {
    inner: T,
    policy: FailurePolicy,
    send_count: usize,
    receive_count: usize,
}

impl<T: Transport> FailingTransport<T> {
    pub fn new(inner: T, policy: FailurePolicy) -> Self {
        Self {
            inner,
            policy,
            send_count: 0,
            receive_count: 0,
        }
    }

    /// Get the underlying transport (for inspection)
    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn send_count(&self) -> usize {
        self.send_count
    }

    pub fn receive_count(&self) -> usize {
        self.receive_count
    }

    /// Reset the failure policy and counters
    pub fn set_policy(&mut self, policy: FailurePolicy) {
        self.policy = policy;
        self.send_count = 0;
        self.receive_count = 0;
    }
}

impl<T: Transport> Transport for FailingTransport<T> {
    fn connect(&mut self) -> Result<(), TransportError> {
        if self.policy == FailurePolicy::RefuseConnect {
            return Err(TransportError::Connect {
                address: "loopback".to_string(),
                reason: "connection refused".to_string(),
            });
        }
        self.inner.connect()
    }

    fn send(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        if matches!(self.policy, FailurePolicy::AfterSends(n) if self.send_count >= n) {
            return Err(TransportError::Send("connection reset".to_string()));
        }
        let sent = self.inner.send(bytes)?;
        self.send_count += 1;
        Ok(sent)
    }

    fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, TransportError> {
        if matches!(self.policy, FailurePolicy::AfterReceives(n) if self.receive_count >= n) {
            return Ok(0);
        }
        let received = self.inner.receive(buffer)?;
        self.receive_count += 1;
        Ok(received)
    }

    fn close(&mut self) {
        self.inner.close();
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }
}
