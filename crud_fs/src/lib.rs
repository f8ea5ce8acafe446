//! # CRUD File System
//!
//! POSIX-like files on top of a whole-object CRUD store.
//!
//! ## Philosophy
//!
//! The store only knows whole objects; it cannot read or patch a byte range.
//! Files are emulated on the client:
//!
//! - a file gets its backing object lazily, on first write
//! - writes inside the file read the object, patch it and update it
//! - writes past the end recreate the object at its new size
//!
//! ## Design
//!
//! - **FileSystem**: the session context. No global state, so several
//!   independent sessions can coexist.
//! - **FileTable**: fixed-capacity name to object mapping, indexed by
//!   [`FileHandle`]. Persisted in the store's priority object.
//! - **RangeStrategy**: how byte ranges map to object operations.
//!   [`ReadModifyWrite`] is the default.
//!
//! ## Example
//!
//! ```no_run
//! use crud_client::CrudConfig;
//! use crud_fs::FileSystem;
//!
//! let mut fs = FileSystem::tcp(CrudConfig::default())?;
//! fs.format()?;
//! let fd = fs.open("notes.txt")?;
//! fs.write(fd, b"hello")?;
//! fs.seek(fd, 0)?;
//! let mut buffer = [0u8; 5];
//! fs.read(fd, &mut buffer)?;
//! fs.close(fd)?;
//! fs.unmount()?;
//! # Ok::<(), crud_fs::FsError>(())
//! ```

pub mod error;
mod file_ops;
pub mod file_table;
pub mod filesystem;
pub mod persist;
pub mod range;
mod volume;

pub use error::FsError;
pub use file_table::{FileHandle, FileTable, FileTableEntry};
pub use filesystem::FileSystem;
pub use persist::TableGeometry;
pub use range::{RangeStrategy, ReadModifyWrite};
