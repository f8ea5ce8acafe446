//! # CRUD Request Codec
//!
//! This crate defines the fixed-width header word exchanged with a CRUD
//! object store.
//!
//! ## Layout
//!
//! Every request and every response is a single 64-bit word, sent in network
//! byte order, optionally followed by a raw payload:
//!
//! | bits  | field          |
//! |-------|----------------|
//! | 63–32 | `object_id`    |
//! | 31–28 | `request_type` |
//! | 27–4  | `length`       |
//! | 3–1   | `flags`        |
//! | 0     | `result`       |
//!
//! ## Design
//!
//! - **RawFields / pack / unpack**: the bit-level primitives. Packing masks
//!   oversized fields, so they are only used behind validation.
//! - **CrudRequest**: a typed record. Construction rejects values that do not
//!   fit their field instead of truncating them.
//! - **RequestType / RequestFlags / ObjectId**: typed field values.

pub mod error;
pub mod request;

pub use error::CodecError;
pub use request::{
    pack, unpack, CrudRequest, ObjectId, RawFields, RequestFlags, RequestResult, RequestType,
    HEADER_SIZE, MAX_LENGTH,
};
