//! Byte-level access to the named records of a container.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::error::XrmError;

/// Read-only access to named records.
///
/// Record paths use `/` separators relative to the container root, e.g.
/// `ImageInfo/NoOfImages`.
pub trait RecordSource {
    /// Whether a record exists at `path`. Never fails.
    fn exists(&self, path: &str) -> bool;

    /// Read the full contents of the record at `path`.
    ///
    /// # Errors
    /// Returns `XrmError::FieldAbsent` if there is no such record.
    fn read_record(&mut self, path: &str) -> Result<Vec<u8>, XrmError>;
}

/// Compound-file (OLE) container backed by the `cfb` crate.
pub struct CompoundFileSource {
    inner: cfb::CompoundFile<File>,
}

fn stream_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

impl CompoundFileSource {
    /// Open a compound file read-only.
    ///
    /// # Errors
    /// Returns `XrmError::ContainerOpen` if the file is missing or is not a
    /// valid compound container.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, XrmError> {
        let path = path.as_ref();
        let inner = cfb::open(path).map_err(|source| XrmError::ContainerOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { inner })
    }
}

impl RecordSource for CompoundFileSource {
    fn exists(&self, path: &str) -> bool {
        self.inner.is_stream(stream_path(path))
    }

    fn read_record(&mut self, path: &str) -> Result<Vec<u8>, XrmError> {
        if !self.exists(path) {
            return Err(XrmError::FieldAbsent(path.to_string()));
        }
        let mut stream = self.inner.open_stream(stream_path(path))?;
        let mut buf = Vec::with_capacity(stream.len() as usize);
        stream.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl std::fmt::Debug for CompoundFileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompoundFileSource").finish_non_exhaustive()
    }
}

/// `HashMap`-backed record source for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSource {
    records: HashMap<String, Vec<u8>>,
}

impl MemoryRecordSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub fn insert(&mut self, path: &str, bytes: impl Into<Vec<u8>>) {
        self.records
            .insert(path.trim_start_matches('/').to_string(), bytes.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Remove a record, returning its bytes if present.
    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.records.remove(path.trim_start_matches('/'))
    }
}

impl RecordSource for MemoryRecordSource {
    fn exists(&self, path: &str) -> bool {
        self.records.contains_key(path.trim_start_matches('/'))
    }

    fn read_record(&mut self, path: &str) -> Result<Vec<u8>, XrmError> {
        self.records
            .get(path.trim_start_matches('/'))
            .cloned()
            .ok_or_else(|| XrmError::FieldAbsent(path.to_string()))
    }
}
