//! Client configuration
//!
//! Settings are typed and carry built-in defaults. A configuration can be
//! built in code with the `with_*` setters or parsed from JSON; either way it
//! is validated before use.

use crud_codec::MAX_LENGTH;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 19876;
pub const DEFAULT_MAX_FILES: usize = 1024;
pub const DEFAULT_MAX_PATH_LEN: usize = 128;

/// Fixed bytes of one persisted file table entry besides its filename
pub const ENTRY_FIXED_BYTES: usize = 13;

/// Bytes of the persisted file table header
pub const TABLE_HEADER_BYTES: usize = 16;

/// Descriptors are 16-bit on the public API
const MAX_FILES_LIMIT: usize = u16::MAX as usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrudConfig {
    /// Object store host
    pub address: String,
    /// Object store port
    pub port: u16,
    /// File table capacity
    pub max_files: usize,
    /// Longest filename in bytes
    pub max_path_len: usize,
    /// Largest object the client will ask the store for
    pub max_object_size: u32,
}

impl Default for CrudConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            max_files: DEFAULT_MAX_FILES,
            max_path_len: DEFAULT_MAX_PATH_LEN,
            max_object_size: MAX_LENGTH,
        }
    }
}

impl CrudConfig {
    /// Parses and validates a JSON configuration. Missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: CrudConfig =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_address(mut self, address: impl Into<String>, port: u16) -> Self {
        self.address = address.into();
        self.port = port;
        self
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn with_max_path_len(mut self, max_path_len: usize) -> Self {
        self.max_path_len = max_path_len;
        self
    }

    pub fn with_max_object_size(mut self, max_object_size: u32) -> Self {
        self.max_object_size = max_object_size;
        self
    }

    /// Size of one persisted file table entry
    pub fn table_entry_size(&self) -> usize {
        self.max_path_len + ENTRY_FIXED_BYTES
    }

    /// Size of the persisted file table object
    pub fn table_blob_size(&self) -> usize {
        TABLE_HEADER_BYTES + self.max_files * self.table_entry_size()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.is_empty() {
            return Err(ConfigError::Invalid("address is empty".to_string()));
        }
        if self.max_object_size == 0 || self.max_object_size > MAX_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "max_object_size must be within 1..={}, got {}",
                MAX_LENGTH, self.max_object_size
            )));
        }
        if self.max_files == 0 || self.max_files > MAX_FILES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_files must be within 1..={}, got {}",
                MAX_FILES_LIMIT, self.max_files
            )));
        }
        if self.max_path_len == 0 {
            return Err(ConfigError::Invalid("max_path_len is zero".to_string()));
        }
        if self.table_blob_size() > self.max_object_size as usize {
            return Err(ConfigError::Invalid(format!(
                "file table needs {} bytes but objects are limited to {}",
                self.table_blob_size(),
                self.max_object_size
            )));
        }
        Ok(())
    }
}
