//! Scenario Test Utilities
//!
//! Shared helpers for the cross-crate scenario tests.
//!
//! ## Test Philosophy
//!
//! - **Real wire path**: every scenario goes through the codec, the protocol
//!   client and the loopback transport, never a shortcut into the store
//! - **Observable store**: tests assert on the simulated store's objects and
//!   request log, not only on what the file API returns
//! - **Deterministic**: randomized workloads use fixed seeds

use crud_client::{CrudConfig, CrudStore, Transport};
use crud_fs::{FileHandle, FileSystem, FsError};
use crud_sim::{LoopbackTransport, SimServer};

pub type SimFileSystem = FileSystem<CrudStore<LoopbackTransport>>;

/// Small geometry that keeps table blobs readable in failures
pub fn test_config() -> CrudConfig {
    CrudConfig::default()
        .with_max_files(16)
        .with_max_path_len(32)
}

/// Opens a new session against `server`
pub fn session(server: &SimServer, config: CrudConfig) -> SimFileSystem {
    session_over(LoopbackTransport::new(server.clone()), config)
}

/// Opens a new session over any transport
pub fn session_over<T: Transport>(
    transport: T,
    config: CrudConfig,
) -> FileSystem<CrudStore<T>> {
    match FileSystem::new(CrudStore::new(transport), config) {
        Ok(fs) => fs,
        Err(err) => panic!("test configuration rejected: {}", err),
    }
}

/// A formatted volume on a fresh store
pub fn formatted() -> (SimServer, SimFileSystem) {
    let server = SimServer::new();
    let mut fs = session(&server, test_config());
    if let Err(err) = fs.format() {
        panic!("format failed: {}", err);
    }
    (server, fs)
}

/// Reads the whole file from offset 0
pub fn read_all<T: Transport>(
    fs: &mut FileSystem<CrudStore<T>>,
    fd: FileHandle,
) -> Result<Vec<u8>, FsError> {
    let length = fs.length(fd)? as usize;
    fs.seek(fd, 0)?;
    let mut buffer = vec![0u8; length];
    let read = fs.read(fd, &mut buffer)?;
    buffer.truncate(read);
    Ok(buffer)
}
