//! POSIX-like file operations

use crud_client::ObjectStore;

use crate::{FileHandle, FileSystem, FileTableEntry, FsError, RangeStrategy};

impl<S: ObjectStore, R: RangeStrategy<S>> FileSystem<S, R> {
    /// Opens `path`, creating a table entry on first use.
    ///
    /// Opening a path that is already in the table returns the same
    /// descriptor, rewound to offset 0. No object is created until the first
    /// write.
    pub fn open(&mut self, path: &str) -> Result<FileHandle, FsError> {
        if path.is_empty() {
            return Err(FsError::InvalidArgument("empty path".to_string()));
        }
        if path.len() > self.config.max_path_len {
            return Err(FsError::InvalidArgument(format!(
                "path of {} bytes exceeds {}",
                path.len(),
                self.config.max_path_len
            )));
        }
        if path.contains('\0') {
            return Err(FsError::InvalidArgument("path contains NUL".to_string()));
        }

        self.ensure_initialized()?;
        let fd = self.table.open(path)?;
        log::debug!("open {:?} -> {}", path, fd);
        Ok(fd)
    }

    /// Marks the descriptor closed. The file and its object are kept.
    pub fn close(&mut self, fd: FileHandle) -> Result<(), FsError> {
        self.table.get_open_mut(fd)?.open = false;
        Ok(())
    }

    /// Moves the file position. `offset` may equal the length but not pass it.
    pub fn seek(&mut self, fd: FileHandle, offset: u32) -> Result<(), FsError> {
        let entry = self.table.get_open_mut(fd)?;
        if offset > entry.length {
            return Err(FsError::InvalidArgument(format!(
                "offset {} past end of {}-byte file",
                offset, entry.length
            )));
        }
        entry.position = offset;
        Ok(())
    }

    /// Reads up to `buffer.len()` bytes from the current position.
    ///
    /// Returns 0 at end of file.
    pub fn read(&mut self, fd: FileHandle, buffer: &mut [u8]) -> Result<usize, FsError> {
        let entry = self.table.get_open_mut(fd)?;
        if entry.position >= entry.length {
            entry.position = entry.length;
            return Ok(0);
        }
        let count = buffer.len().min((entry.length - entry.position) as usize);
        if count == 0 {
            return Ok(0);
        }

        self.ensure_initialized()?;
        let entry = self.table.get_open(fd)?;
        let offset = entry.position;
        let result = self
            .strategy
            .read_range(&mut self.store, entry, offset, &mut buffer[..count]);
        self.settle(result)?;

        self.table.get_open_mut(fd)?.position = offset + count as u32;
        Ok(count)
    }

    /// Writes `data` at the current position, growing the file as needed
    pub fn write(&mut self, fd: FileHandle, data: &[u8]) -> Result<usize, FsError> {
        let entry = self.table.get_open(fd)?;
        if data.is_empty() {
            return Err(FsError::InvalidArgument("empty write".to_string()));
        }
        let end = u64::from(entry.position) + data.len() as u64;
        if end > u64::from(self.config.max_object_size) {
            return Err(FsError::Capacity(format!(
                "write would end at byte {}, objects are limited to {}",
                end, self.config.max_object_size
            )));
        }

        self.ensure_initialized()?;
        let entry = self.table.get_open_mut(fd)?;
        let offset = entry.position;
        let result = self
            .strategy
            .write_range(&mut self.store, entry, offset, data);
        if result.is_ok() {
            entry.position = offset + data.len() as u32;
        }
        self.settle(result)
    }

    /// Entry behind a descriptor, open or not
    pub fn entry(&self, fd: FileHandle) -> Result<&FileTableEntry, FsError> {
        self.table
            .get(fd)
            .filter(|entry| entry.is_in_use())
            .ok_or(FsError::InvalidHandle(fd))
    }

    pub fn length(&self, fd: FileHandle) -> Result<u32, FsError> {
        self.entry(fd).map(|entry| entry.length)
    }

    pub fn position(&self, fd: FileHandle) -> Result<u32, FsError> {
        self.entry(fd).map(|entry| entry.position)
    }

    pub fn entries(&self) -> &[FileTableEntry] {
        self.table.entries()
    }
}
