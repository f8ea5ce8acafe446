//! # Table Persistence
//!
//! Encoding of the file table into the metadata object.
//!
//! The blob has a fixed size for a given geometry, so the metadata object is
//! created once at format time and updated in place on every unmount.
//!
//! ```text
//! header  magic "CRFT" | version u16 | entries u16 | entry width u32 | crc32 u32
//! entry   filename (NUL padded) | object id i32 | length u32 | position u32 | open u8
//! ```
//!
//! All integers are big-endian. The checksum covers every byte after the
//! header.

use std::collections::BTreeSet;

use crud_client::config::{ENTRY_FIXED_BYTES, TABLE_HEADER_BYTES};
use crud_codec::ObjectId;

use crate::{FileTableEntry, FsError};

const MAGIC: [u8; 4] = *b"CRFT";
const FORMAT_VERSION: u16 = 1;

/// Shape of the persisted table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableGeometry {
    pub max_files: usize,
    pub max_path_len: usize,
}

impl TableGeometry {
    pub fn entry_size(&self) -> usize {
        self.max_path_len + ENTRY_FIXED_BYTES
    }

    pub fn blob_size(&self) -> usize {
        TABLE_HEADER_BYTES + self.max_files * self.entry_size()
    }
}

/// Serializes `entries` into a blob of exactly `geometry.blob_size()` bytes
pub fn encode_table(entries: &[FileTableEntry], geometry: TableGeometry) -> Result<Vec<u8>, FsError> {
    if entries.len() != geometry.max_files {
        return Err(FsError::InvalidArgument(format!(
            "table has {} entries, geometry expects {}",
            entries.len(),
            geometry.max_files
        )));
    }
    let count = u16::try_from(geometry.max_files)
        .map_err(|_| FsError::Capacity(format!("{} entries", geometry.max_files)))?;
    let width = u32::try_from(geometry.entry_size())
        .map_err(|_| FsError::Capacity(format!("entry width {}", geometry.entry_size())))?;

    let mut body = Vec::with_capacity(geometry.blob_size() - TABLE_HEADER_BYTES);
    for entry in entries {
        let name = entry.filename.as_bytes();
        if name.len() > geometry.max_path_len {
            return Err(FsError::InvalidArgument(format!(
                "filename of {} bytes exceeds {}",
                name.len(),
                geometry.max_path_len
            )));
        }
        body.extend_from_slice(name);
        body.resize(body.len() + geometry.max_path_len - name.len(), 0);
        body.extend_from_slice(&entry.object_id.as_raw().to_be_bytes());
        body.extend_from_slice(&entry.length.to_be_bytes());
        body.extend_from_slice(&entry.position.to_be_bytes());
        body.push(u8::from(entry.open));
    }

    let mut blob = Vec::with_capacity(geometry.blob_size());
    blob.extend_from_slice(&MAGIC);
    blob.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
    blob.extend_from_slice(&count.to_be_bytes());
    blob.extend_from_slice(&width.to_be_bytes());
    blob.extend_from_slice(&crc32fast::hash(&body).to_be_bytes());
    blob.extend_from_slice(&body);
    Ok(blob)
}

/// Parses a blob written by [`encode_table`] for the same geometry
pub fn decode_table(blob: &[u8], geometry: TableGeometry) -> Result<Vec<FileTableEntry>, FsError> {
    if blob.len() != geometry.blob_size() {
        return Err(FsError::CorruptTable(format!(
            "blob is {} bytes, expected {}",
            blob.len(),
            geometry.blob_size()
        )));
    }

    let (header, body) = blob.split_at(TABLE_HEADER_BYTES);
    if header[0..4] != MAGIC {
        return Err(FsError::CorruptTable("bad magic".to_string()));
    }
    let version = u16::from_be_bytes([header[4], header[5]]);
    if version != FORMAT_VERSION {
        return Err(FsError::CorruptTable(format!("unsupported version {}", version)));
    }
    let count = u16::from_be_bytes([header[6], header[7]]) as usize;
    let width = read_u32(&header[8..12]) as usize;
    if count != geometry.max_files || width != geometry.entry_size() {
        return Err(FsError::CorruptTable(format!(
            "geometry {}x{} does not match {}x{}",
            count,
            width,
            geometry.max_files,
            geometry.entry_size()
        )));
    }
    let checksum = read_u32(&header[12..16]);
    if crc32fast::hash(body) != checksum {
        return Err(FsError::CorruptTable("checksum mismatch".to_string()));
    }

    let entries = body
        .chunks_exact(width)
        .enumerate()
        .map(|(index, raw)| decode_entry(index, raw, geometry.max_path_len))
        .collect::<Result<Vec<_>, _>>()?;

    let mut names = BTreeSet::new();
    for (index, entry) in entries.iter().enumerate() {
        if entry.is_in_use() && !names.insert(entry.filename.as_str()) {
            return Err(FsError::CorruptTable(format!(
                "entry {} repeats filename {:?}",
                index, entry.filename
            )));
        }
    }
    Ok(entries)
}

fn decode_entry(index: usize, raw: &[u8], max_path_len: usize) -> Result<FileTableEntry, FsError> {
    let (name, fields) = raw.split_at(max_path_len);
    let name_len = name.iter().position(|&b| b == 0).unwrap_or(name.len());
    let filename = std::str::from_utf8(&name[..name_len])
        .map_err(|_| FsError::CorruptTable(format!("entry {} has a non UTF-8 filename", index)))?
        .to_string();

    let entry = FileTableEntry {
        filename,
        object_id: ObjectId::new(read_u32(&fields[0..4]) as i32),
        length: read_u32(&fields[4..8]),
        position: read_u32(&fields[8..12]),
        open: fields[12] != 0,
    };
    if entry.position > entry.length {
        return Err(FsError::CorruptTable(format!(
            "entry {} has position {} past length {}",
            index, entry.position, entry.length
        )));
    }
    Ok(entry)
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[..4]);
    u32::from_be_bytes(raw)
}
