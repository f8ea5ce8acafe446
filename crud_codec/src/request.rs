//! Header word packing and the typed request record

use bitflags::bitflags;
use core::fmt;

use crate::CodecError;

/// Size of the encoded header word on the wire
pub const HEADER_SIZE: usize = 8;

/// Largest value the 24-bit length field can carry
pub const MAX_LENGTH: u32 = 0x00FF_FFFF;

const TYPE_MASK: u64 = 0xF;
const LENGTH_MASK: u64 = MAX_LENGTH as u64;
const FLAGS_MASK: u64 = 0x7;
const RESULT_MASK: u64 = 0x1;

const OBJECT_ID_SHIFT: u32 = 32;
const TYPE_SHIFT: u32 = 28;
const LENGTH_SHIFT: u32 = 4;
const FLAGS_SHIFT: u32 = 1;

/// Identifier of an object in the remote store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectId(i32);

impl ObjectId {
    /// Placeholder id for requests that do not target an object
    pub const NONE: ObjectId = ObjectId(0);

    /// Creates an object ID from the raw store value
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw store value
    pub const fn as_raw(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self.0)
    }
}

/// Request types understood by the object store
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    /// Initialize the session
    Init = 0,
    /// Allocate a new object from the payload
    Create = 1,
    /// Fetch a whole object
    Read = 2,
    /// Replace a whole object
    Update = 3,
    /// Free an object
    Delete = 4,
    /// Remove every object in the store
    Format = 5,
    /// End the session and close the connection
    Close = 6,
}

impl RequestType {
    /// Returns the 4-bit wire value
    pub const fn as_raw(self) -> u8 {
        self as u8
    }

    /// True for requests whose header is followed by an outgoing payload
    pub const fn carries_request_payload(self) -> bool {
        matches!(self, RequestType::Create | RequestType::Update)
    }

    /// True for responses whose header is followed by an incoming payload
    pub const fn carries_response_payload(self) -> bool {
        matches!(self, RequestType::Read)
    }
}

impl TryFrom<u8> for RequestType {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => RequestType::Init,
            1 => RequestType::Create,
            2 => RequestType::Read,
            3 => RequestType::Update,
            4 => RequestType::Delete,
            5 => RequestType::Format,
            6 => RequestType::Close,
            other => return Err(CodecError::UnknownRequestType(other)),
        })
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestType::Init => "INIT",
            RequestType::Create => "CREATE",
            RequestType::Read => "READ",
            RequestType::Update => "UPDATE",
            RequestType::Delete => "DELETE",
            RequestType::Format => "FORMAT",
            RequestType::Close => "CLOSE",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Object class hints carried in the 3-bit flags field
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RequestFlags: u8 {
        /// Addresses the store's single priority object
        const PRIORITY_OBJECT = 0b001;
    }
}

/// Outcome bit of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RequestResult {
    #[default]
    Success,
    Failure,
}

impl RequestResult {
    pub const fn is_success(self) -> bool {
        matches!(self, RequestResult::Success)
    }
}

/// Untyped header fields, exactly as they sit in the word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawFields {
    pub object_id: i32,
    pub request_type: u8,
    pub length: u32,
    pub flags: u8,
    pub result: u8,
}

/// Packs raw fields into a header word.
///
/// Fields wider than their slot are masked, not rejected: a length of
/// `0x0100_0000` packs as zero. Callers that need range checking go through
/// [`CrudRequest::new`].
pub fn pack(fields: RawFields) -> u64 {
    let object_id = (fields.object_id as u32 as u64) << OBJECT_ID_SHIFT;
    let request_type = (fields.request_type as u64 & TYPE_MASK) << TYPE_SHIFT;
    let length = (fields.length as u64 & LENGTH_MASK) << LENGTH_SHIFT;
    let flags = (fields.flags as u64 & FLAGS_MASK) << FLAGS_SHIFT;
    let result = fields.result as u64 & RESULT_MASK;

    object_id | request_type | length | flags | result
}

/// Splits a header word into its raw fields
pub fn unpack(word: u64) -> RawFields {
    RawFields {
        object_id: (word >> OBJECT_ID_SHIFT) as u32 as i32,
        request_type: ((word >> TYPE_SHIFT) & TYPE_MASK) as u8,
        length: ((word >> LENGTH_SHIFT) & LENGTH_MASK) as u32,
        flags: ((word >> FLAGS_SHIFT) & FLAGS_MASK) as u8,
        result: (word & RESULT_MASK) as u8,
    }
}

/// A validated request or response header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrudRequest {
    object_id: ObjectId,
    request_type: RequestType,
    length: u32,
    flags: RequestFlags,
    result: RequestResult,
}

impl CrudRequest {
    /// Creates a request, rejecting a length the 24-bit field cannot hold
    pub fn new(
        object_id: ObjectId,
        request_type: RequestType,
        length: u32,
        flags: RequestFlags,
    ) -> Result<Self, CodecError> {
        if length > MAX_LENGTH {
            return Err(CodecError::FieldOutOfRange {
                field: "length",
                value: length as u64,
                max: MAX_LENGTH as u64,
            });
        }

        Ok(Self {
            object_id,
            request_type,
            length,
            flags,
            result: RequestResult::Success,
        })
    }

    /// Creates a zero-length request that targets no object (INIT, FORMAT, CLOSE)
    pub fn control(request_type: RequestType) -> Self {
        Self {
            object_id: ObjectId::NONE,
            request_type,
            length: 0,
            flags: RequestFlags::empty(),
            result: RequestResult::Success,
        }
    }

    /// Sets the result bit
    pub fn with_result(mut self, result: RequestResult) -> Self {
        self.result = result;
        self
    }

    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn flags(&self) -> RequestFlags {
        self.flags
    }

    pub fn result(&self) -> RequestResult {
        self.result
    }

    /// Packs the record into a header word
    pub fn encode(&self) -> u64 {
        pack(RawFields {
            object_id: self.object_id.as_raw(),
            request_type: self.request_type.as_raw(),
            length: self.length,
            flags: self.flags.bits(),
            result: match self.result {
                RequestResult::Success => 0,
                RequestResult::Failure => 1,
            },
        })
    }

    /// Decodes a header word, rejecting unknown request types
    pub fn decode(word: u64) -> Result<Self, CodecError> {
        let raw = unpack(word);
        Ok(Self {
            object_id: ObjectId::new(raw.object_id),
            request_type: RequestType::try_from(raw.request_type)?,
            length: raw.length,
            flags: RequestFlags::from_bits_retain(raw.flags),
            result: if raw.result == 0 {
                RequestResult::Success
            } else {
                RequestResult::Failure
            },
        })
    }

    /// Returns the header in network byte order
    pub fn to_wire(&self) -> [u8; HEADER_SIZE] {
        self.encode().to_be_bytes()
    }

    /// Decodes a header received in network byte order
    pub fn from_wire(bytes: [u8; HEADER_SIZE]) -> Result<Self, CodecError> {
        Self::decode(u64::from_be_bytes(bytes))
    }
}

impl fmt::Display for CrudRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} len={} flags={:#05b} {:?}",
            self.request_type,
            self.object_id,
            self.length,
            self.flags.bits(),
            self.result
        )
    }
}
