//! # CRUD Protocol Client
//!
//! This crate talks to a remote CRUD object store over one blocking byte
//! stream.
//!
//! ## Architecture
//!
//! - **Transport**: connect / send / receive / close on a byte stream.
//!   `TcpTransport` is the production implementation; tests substitute
//!   in-memory fakes.
//! - **ProtocolClient**: one request/response exchange at a time, with lazy
//!   connection and partial-transfer accumulation.
//! - **ObjectStore**: whole-object CREATE/READ/UPDATE/DELETE plus session
//!   control. `CrudStore` maps it onto the wire.
//! - **CrudConfig**: typed, validated settings.

pub mod client;
pub mod config;
pub mod error;
pub mod store;
pub mod transport;

pub use client::{ConnectionState, Payload, ProtocolClient};
pub use config::CrudConfig;
pub use error::{ClientError, ConfigError, TransportError};
pub use store::{CrudStore, ObjectInfo, ObjectStore};
pub use transport::{TcpTransport, Transport};
