//! # File Table
//!
//! Fixed-capacity table mapping filenames to backing objects. The index of an
//! entry is its file descriptor.
//!
//! Entries are claimed by `open` and never freed individually; only a volume
//! format resets the whole table.

use core::fmt;

use crud_codec::ObjectId;

use crate::FsError;

/// File descriptor: an index into the file table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileHandle(u16);

impl FileHandle {
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn as_raw(&self) -> u16 {
        self.0
    }

    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileHandle({})", self.0)
    }
}

/// One slot of the file table
///
/// `object_id` is only meaningful once `length > 0`; until the first write
/// no object exists in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTableEntry {
    pub filename: String,
    pub object_id: ObjectId,
    pub length: u32,
    pub position: u32,
    pub open: bool,
}

impl FileTableEntry {
    /// An entry is in use once it carries a filename
    pub fn is_in_use(&self) -> bool {
        !self.filename.is_empty()
    }

    /// Whether a backing object exists in the store
    pub fn has_object(&self) -> bool {
        self.length > 0
    }
}

#[derive(Debug, Clone)]
pub struct FileTable {
    entries: Vec<FileTableEntry>,
}

impl FileTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![FileTableEntry::default(); capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[FileTableEntry] {
        &self.entries
    }

    pub fn get(&self, fd: FileHandle) -> Option<&FileTableEntry> {
        self.entries.get(fd.index())
    }

    /// Returns the entry behind an open descriptor
    pub fn get_open(&self, fd: FileHandle) -> Result<&FileTableEntry, FsError> {
        self.entries
            .get(fd.index())
            .filter(|entry| entry.open)
            .ok_or(FsError::InvalidHandle(fd))
    }

    pub fn get_open_mut(&mut self, fd: FileHandle) -> Result<&mut FileTableEntry, FsError> {
        self.entries
            .get_mut(fd.index())
            .filter(|entry| entry.open)
            .ok_or(FsError::InvalidHandle(fd))
    }

    /// Finds the in-use entry carrying `filename`
    pub fn find(&self, filename: &str) -> Option<FileHandle> {
        self.entries
            .iter()
            .position(|entry| entry.is_in_use() && entry.filename == filename)
            .and_then(|index| u16::try_from(index).ok())
            .map(FileHandle::new)
    }

    /// Opens `filename`, reusing its entry or claiming the first empty slot
    pub fn open(&mut self, filename: &str) -> Result<FileHandle, FsError> {
        let fd = match self.find(filename) {
            Some(fd) => fd,
            None => {
                let index = self
                    .entries
                    .iter()
                    .position(|entry| !entry.is_in_use())
                    .ok_or_else(|| {
                        FsError::Capacity(format!("file table full ({} entries)", self.capacity()))
                    })?;
                let fd = u16::try_from(index)
                    .map(FileHandle::new)
                    .map_err(|_| FsError::Capacity(format!("slot {} has no descriptor", index)))?;
                self.entries[index] = FileTableEntry {
                    filename: filename.to_string(),
                    ..FileTableEntry::default()
                };
                fd
            }
        };

        let entry = &mut self.entries[fd.index()];
        entry.position = 0;
        entry.open = true;
        Ok(fd)
    }

    /// Empties every slot
    pub fn reset(&mut self) {
        self.entries.fill(FileTableEntry::default());
    }

    /// Replaces the contents with loaded entries, all closed
    pub fn load(&mut self, entries: Vec<FileTableEntry>) {
        self.entries = entries;
        for entry in &mut self.entries {
            entry.open = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_claims_first_empty_slot() {
        let mut table = FileTable::new(4);
        assert_eq!(table.open("a").unwrap(), FileHandle::new(0));
        assert_eq!(table.open("b").unwrap(), FileHandle::new(1));

        let entry = table.get(FileHandle::new(1)).unwrap();
        assert_eq!(entry.filename, "b");
        assert_eq!(entry.length, 0);
        assert!(entry.open);
    }

    #[test]
    fn test_open_same_name_shares_entry() {
        let mut table = FileTable::new(4);
        let fd = table.open("a").unwrap();
        table.entries[fd.index()].length = 5;
        table.entries[fd.index()].position = 3;

        assert_eq!(table.open("a").unwrap(), fd);
        let entry = table.get(fd).unwrap();
        assert_eq!(entry.position, 0);
        assert_eq!(entry.length, 5);
    }

    #[test]
    fn test_full_table_is_capacity_error() {
        let mut table = FileTable::new(2);
        table.open("a").unwrap();
        table.open("b").unwrap();
        assert!(matches!(table.open("c"), Err(FsError::Capacity(_))));
        assert!(table.open("a").is_ok());
    }

    #[test]
    fn test_closed_entry_is_invalid_handle() {
        let mut table = FileTable::new(2);
        let fd = table.open("a").unwrap();
        table.get_open_mut(fd).unwrap().open = false;

        assert_eq!(table.get_open(fd), Err(FsError::InvalidHandle(fd)));
        assert_eq!(
            table.get_open(FileHandle::new(9)),
            Err(FsError::InvalidHandle(FileHandle::new(9)))
        );
    }

    #[test]
    fn test_load_closes_entries() {
        let mut table = FileTable::new(1);
        table.load(vec![FileTableEntry {
            filename: "kept".to_string(),
            object_id: ObjectId::new(2),
            length: 4,
            position: 1,
            open: true,
        }]);
        let entry = table.get(FileHandle::new(0)).unwrap();
        assert!(!entry.open);
        assert_eq!(entry.position, 1);
        assert_eq!(table.find("kept"), Some(FileHandle::new(0)));
    }

    #[test]
    fn test_reset_empties_table() {
        let mut table = FileTable::new(2);
        table.open("a").unwrap();
        table.reset();
        assert!(table.entries().iter().all(|entry| !entry.is_in_use()));
        assert_eq!(table.capacity(), 2);
    }
}
