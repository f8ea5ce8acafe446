//! Volume lifecycle: format, mount, unmount
//!
//! The file table lives in the store's priority object. Format creates it,
//! mount loads it and unmount writes it back before closing the session.

use crud_client::ObjectStore;
use crud_codec::{ObjectId, RequestFlags};

use crate::persist::{decode_table, encode_table};
use crate::{FileSystem, FsError, RangeStrategy};

impl<S: ObjectStore, R: RangeStrategy<S>> FileSystem<S, R> {
    /// Erases the store and writes an empty file table
    pub fn format(&mut self) -> Result<(), FsError> {
        self.ensure_initialized()?;
        let result = self.store.format().map_err(FsError::from);
        self.settle(result)?;

        self.table.reset();
        self.metadata = None;
        let blob = encode_table(self.table.entries(), self.geometry())?;
        let result = self
            .store
            .create(&blob, RequestFlags::PRIORITY_OBJECT)
            .map_err(FsError::from);
        let info = self.settle(result)?;

        self.metadata = Some(info.id);
        log::info!(
            "formatted volume: {} entries, table in {}",
            self.table.capacity(),
            info.id
        );
        Ok(())
    }

    /// Loads the file table from the store. Every descriptor starts closed.
    pub fn mount(&mut self) -> Result<(), FsError> {
        self.ensure_initialized()?;
        let mut blob = vec![0u8; self.geometry().blob_size()];
        let result = self
            .store
            .read(ObjectId::NONE, RequestFlags::PRIORITY_OBJECT, &mut blob)
            .map_err(FsError::from);
        let info = self.settle(result)?;

        blob.truncate(info.length as usize);
        let entries = decode_table(&blob, self.geometry())?;
        self.table.load(entries);
        self.metadata = Some(info.id);
        log::info!(
            "mounted volume from {}: {} files",
            info.id,
            self.table
                .entries()
                .iter()
                .filter(|entry| entry.is_in_use())
                .count()
        );
        Ok(())
    }

    /// Writes the file table back and ends the session
    pub fn unmount(&mut self) -> Result<(), FsError> {
        let metadata = self
            .metadata
            .ok_or_else(|| FsError::InvalidArgument("no volume mounted".to_string()))?;
        self.ensure_initialized()?;

        let blob = encode_table(self.table.entries(), self.geometry())?;
        let result = self
            .store
            .update(ObjectId::NONE, RequestFlags::PRIORITY_OBJECT, &blob)
            .map_err(FsError::from);
        self.settle(result)?;

        let result = self.store.close().map_err(FsError::from);
        self.settle(result)?;
        self.initialized = false;
        self.metadata = None;
        log::info!("unmounted volume, table saved to {}", metadata);
        Ok(())
    }
}
