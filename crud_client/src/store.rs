//! Whole-object store interface
//!
//! [`ObjectStore`] is the seam between file-level logic and the wire. It only
//! offers whole-object operations; there is no ranged read or partial
//! update. [`CrudStore`] implements it over a [`ProtocolClient`].

use crud_codec::{CrudRequest, ObjectId, RequestFlags, RequestType};

use crate::client::{Payload, ProtocolClient};
use crate::{ClientError, Transport};

/// Identity and size of a stored object, as reported by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectInfo {
    pub id: ObjectId,
    pub length: u32,
}

/// Whole-object CRUD operations plus session control
pub trait ObjectStore {
    /// Initializes the session
    fn init(&mut self) -> Result<(), ClientError>;

    /// Removes every object in the store
    fn format(&mut self) -> Result<(), ClientError>;

    /// Allocates a new object holding `data`
    fn create(&mut self, data: &[u8], flags: RequestFlags) -> Result<ObjectInfo, ClientError>;

    /// Reads the whole object into `buffer`
    fn read(
        &mut self,
        id: ObjectId,
        flags: RequestFlags,
        buffer: &mut [u8],
    ) -> Result<ObjectInfo, ClientError>;

    /// Replaces the whole object with `data`
    fn update(
        &mut self,
        id: ObjectId,
        flags: RequestFlags,
        data: &[u8],
    ) -> Result<ObjectInfo, ClientError>;

    /// Frees the object
    fn delete(&mut self, id: ObjectId) -> Result<(), ClientError>;

    /// Ends the session and closes the connection
    fn close(&mut self) -> Result<(), ClientError>;
}

/// [`ObjectStore`] speaking the CRUD wire protocol
pub struct CrudStore<T: Transport> {
    client: ProtocolClient<T>,
}

impl<T: Transport> CrudStore<T> {
    pub fn new(transport: T) -> Self {
        Self {
            client: ProtocolClient::new(transport),
        }
    }

    pub fn client(&self) -> &ProtocolClient<T> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut ProtocolClient<T> {
        &mut self.client
    }

    fn call(
        &mut self,
        request: CrudRequest,
        payload: Payload<'_>,
    ) -> Result<CrudRequest, ClientError> {
        let response = self.client.exchange(&request, payload)?;
        if !response.result().is_success() {
            return Err(ClientError::StoreFailure {
                request: request.request_type(),
                object_id: request.object_id(),
            });
        }
        Ok(response)
    }
}

fn payload_length(data: &[u8]) -> Result<u32, ClientError> {
    u32::try_from(data.len()).map_err(|_| {
        ClientError::Codec(crud_codec::CodecError::FieldOutOfRange {
            field: "length",
            value: data.len() as u64,
            max: crud_codec::MAX_LENGTH as u64,
        })
    })
}

impl<T: Transport> ObjectStore for CrudStore<T> {
    fn init(&mut self) -> Result<(), ClientError> {
        self.call(CrudRequest::control(RequestType::Init), Payload::None)?;
        Ok(())
    }

    fn format(&mut self) -> Result<(), ClientError> {
        self.call(CrudRequest::control(RequestType::Format), Payload::None)?;
        Ok(())
    }

    fn create(&mut self, data: &[u8], flags: RequestFlags) -> Result<ObjectInfo, ClientError> {
        let request = CrudRequest::new(
            ObjectId::NONE,
            RequestType::Create,
            payload_length(data)?,
            flags,
        )?;
        let response = self.call(request, Payload::Outgoing(data))?;
        Ok(ObjectInfo {
            id: response.object_id(),
            length: response.length(),
        })
    }

    fn read(
        &mut self,
        id: ObjectId,
        flags: RequestFlags,
        buffer: &mut [u8],
    ) -> Result<ObjectInfo, ClientError> {
        let request = CrudRequest::new(id, RequestType::Read, payload_length(buffer)?, flags)?;
        let response = self.call(request, Payload::Incoming(buffer))?;
        Ok(ObjectInfo {
            id: response.object_id(),
            length: response.length(),
        })
    }

    fn update(
        &mut self,
        id: ObjectId,
        flags: RequestFlags,
        data: &[u8],
    ) -> Result<ObjectInfo, ClientError> {
        let request = CrudRequest::new(id, RequestType::Update, payload_length(data)?, flags)?;
        let response = self.call(request, Payload::Outgoing(data))?;
        Ok(ObjectInfo {
            id: response.object_id(),
            length: response.length(),
        })
    }

    fn delete(&mut self, id: ObjectId) -> Result<(), ClientError> {
        let request = CrudRequest::new(id, RequestType::Delete, 0, RequestFlags::empty())?;
        self.call(request, Payload::None)?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ClientError> {
        self.call(CrudRequest::control(RequestType::Close), Payload::None)?;
        Ok(())
    }
}
