//! Client context owning the store connection and the file table

use crud_client::{CrudConfig, CrudStore, ObjectStore, TcpTransport};
use crud_codec::ObjectId;

use crate::persist::TableGeometry;
use crate::{FileTable, FsError, RangeStrategy, ReadModifyWrite};

/// File system over a CRUD object store.
///
/// One value per session: it owns the store, the in-memory file table and the
/// session flags. File operations live in `file_ops`, volume operations in
/// `volume`.
pub struct FileSystem<S: ObjectStore, R: RangeStrategy<S> = ReadModifyWrite> {
    pub(crate) store: S,
    pub(crate) strategy: R,
    pub(crate) table: FileTable,
    pub(crate) config: CrudConfig,
    /// INIT has been accepted on the current connection
    pub(crate) initialized: bool,
    /// Metadata object of the mounted volume
    pub(crate) metadata: Option<ObjectId>,
}

impl FileSystem<CrudStore<TcpTransport>> {
    /// Builds a context that reaches the store over TCP. Nothing connects
    /// until the first exchange.
    pub fn tcp(config: CrudConfig) -> Result<Self, FsError> {
        let transport = TcpTransport::new(config.address.clone(), config.port);
        Self::new(CrudStore::new(transport), config)
    }
}

impl<S: ObjectStore> FileSystem<S> {
    pub fn new(store: S, config: CrudConfig) -> Result<Self, FsError> {
        Self::with_strategy(store, ReadModifyWrite, config)
    }
}

impl<S: ObjectStore, R: RangeStrategy<S>> FileSystem<S, R> {
    pub fn with_strategy(store: S, strategy: R, config: CrudConfig) -> Result<Self, FsError> {
        config.validate()?;
        Ok(Self {
            store,
            strategy,
            table: FileTable::new(config.max_files),
            config,
            initialized: false,
            metadata: None,
        })
    }

    pub fn config(&self) -> &CrudConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn table(&self) -> &FileTable {
        &self.table
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn metadata_object(&self) -> Option<ObjectId> {
        self.metadata
    }

    pub(crate) fn geometry(&self) -> TableGeometry {
        TableGeometry {
            max_files: self.config.max_files,
            max_path_len: self.config.max_path_len,
        }
    }

    /// Sends INIT once per connection
    pub(crate) fn ensure_initialized(&mut self) -> Result<(), FsError> {
        if !self.initialized {
            let result = self.store.init().map_err(FsError::from);
            self.settle(result)?;
            self.initialized = true;
        }
        Ok(())
    }

    /// A dropped connection takes the session with it
    pub(crate) fn settle<T>(&mut self, result: Result<T, FsError>) -> Result<T, FsError> {
        if let Err(err) = &result {
            if err.is_terminal() {
                self.initialized = false;
            }
        }
        result
    }
}
