//! # CRUD Store Simulator
//!
//! An in-memory stand-in for the remote object store, for tests and local runs.
//!
//! ## Philosophy
//!
//! The simulator speaks the real wire format. Nothing above the transport
//! knows it is not talking to a socket, so every test exercises the same
//! framing, header codec and error paths as production.
//!
//! ## Pieces
//!
//! - [`SimServer`]: object map, priority object, session state, request log
//!   and injectable store failures
//! - [`LoopbackTransport`]: in-process transport with optional chunking
//! - [`FailingTransport`]: wraps any transport to inject connection faults

pub mod failing_transport;
pub mod loopback;
pub mod server;

pub use failing_transport::{FailingTransport, FailurePolicy};
pub use loopback::LoopbackTransport;
pub use server::{ExchangeRecord, SimServer};
