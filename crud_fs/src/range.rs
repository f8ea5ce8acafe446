//! Byte-range access on top of a whole-object store
//!
//! [`RangeStrategy`] turns "read or write these bytes of a file" into object
//! operations. [`ReadModifyWrite`] does it with whole-object transfers, the
//! only thing a plain CRUD store supports. A store with ranged operations can
//! plug in its own strategy without touching the file API.

use crud_client::ObjectStore;
use crud_codec::RequestFlags;

use crate::{FileTableEntry, FsError};

pub trait RangeStrategy<S: ObjectStore> {
    /// Fills `buffer` from the file bytes at `offset`.
    ///
    /// The caller guarantees `offset + buffer.len() <= entry.length` and a
    /// non-empty buffer.
    fn read_range(
        &mut self,
        store: &mut S,
        entry: &FileTableEntry,
        offset: u32,
        buffer: &mut [u8],
    ) -> Result<(), FsError>;

    /// Writes `data` at `offset`, growing the file if needed.
    ///
    /// Updates `object_id` and `length` of `entry`; `position` is left to the
    /// caller. Returns the number of bytes the store reports as written.
    fn write_range(
        &mut self,
        store: &mut S,
        entry: &mut FileTableEntry,
        offset: u32,
        data: &[u8],
    ) -> Result<usize, FsError>;
}

/// Whole-object read-modify-write
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadModifyWrite;

impl ReadModifyWrite {
    fn fetch<S: ObjectStore>(
        store: &mut S,
        entry: &FileTableEntry,
        buffer: &mut [u8],
    ) -> Result<(), FsError> {
        let info = store.read(entry.object_id, RequestFlags::empty(), buffer)?;
        if info.length != entry.length {
            return Err(FsError::CorruptTable(format!(
                "{} holds {} bytes, table records {}",
                entry.object_id, info.length, entry.length
            )));
        }
        Ok(())
    }

    fn create<S: ObjectStore>(
        store: &mut S,
        entry: &mut FileTableEntry,
        data: &[u8],
    ) -> Result<usize, FsError> {
        let info = store.create(data, RequestFlags::empty())?;
        if info.length as usize != data.len() {
            return Err(FsError::Protocol(format!(
                "CREATE of {} bytes answered with length {}",
                data.len(),
                info.length
            )));
        }
        entry.object_id = info.id;
        entry.length = info.length;
        Ok(info.length as usize)
    }

    fn overwrite<S: ObjectStore>(
        store: &mut S,
        entry: &FileTableEntry,
        offset: usize,
        data: &[u8],
    ) -> Result<usize, FsError> {
        let mut object = vec![0u8; entry.length as usize];
        Self::fetch(store, entry, &mut object)?;
        object[offset..offset + data.len()].copy_from_slice(data);
        store.update(entry.object_id, RequestFlags::empty(), &object)?;
        Ok(data.len())
    }

    /// Recreates the object at its new size. The old object is deleted
    /// before the final UPDATE, so from then on the entry follows the new one.
    fn grow<S: ObjectStore>(
        store: &mut S,
        entry: &mut FileTableEntry,
        offset: usize,
        data: &[u8],
    ) -> Result<usize, FsError> {
        let new_length = offset + data.len();
        let mut object = vec![0u8; new_length];
        Self::fetch(store, entry, &mut object[..entry.length as usize])?;

        let created = store.create(&object, RequestFlags::empty())?;
        object[offset..].copy_from_slice(data);

        if let Err(err) = store.delete(entry.object_id) {
            log::warn!(
                "could not delete {} after growing into {}: {}",
                entry.object_id,
                created.id,
                err
            );
            return Err(err.into());
        }

        entry.object_id = created.id;
        entry.length = new_length as u32;
        store.update(created.id, RequestFlags::empty(), &object)?;
        Ok(data.len())
    }
}

impl<S: ObjectStore> RangeStrategy<S> for ReadModifyWrite {
    fn read_range(
        &mut self,
        store: &mut S,
        entry: &FileTableEntry,
        offset: u32,
        buffer: &mut [u8],
    ) -> Result<(), FsError> {
        let mut object = vec![0u8; entry.length as usize];
        Self::fetch(store, entry, &mut object)?;
        let start = offset as usize;
        buffer.copy_from_slice(&object[start..start + buffer.len()]);
        Ok(())
    }

    fn write_range(
        &mut self,
        store: &mut S,
        entry: &mut FileTableEntry,
        offset: u32,
        data: &[u8],
    ) -> Result<usize, FsError> {
        let offset = offset as usize;
        if !entry.has_object() {
            Self::create(store, entry, data)
        } else if offset + data.len() <= entry.length as usize {
            Self::overwrite(store, entry, offset, data)
        } else {
            Self::grow(store, entry, offset, data)
        }
    }
}
