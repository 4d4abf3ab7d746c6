//! File selection registry.
//!
//! Holds the queue of files picked for the next batch. The UI adds and
//! removes freely until the orchestrator freezes the registry for a run;
//! while frozen, mutations fail with [`RegistryError::UploadInProgress`].

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::RegistryError;

/// Opaque handle identifying one selected file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionId(u64);

/// A file queued for upload, owned by the registry until the batch runs.
#[derive(Debug)]
pub struct FileSelection {
    pub id: SelectionId,
    /// Original file name, extension included.
    pub name: String,
    pub content: Vec<u8>,
}

impl FileSelection {
    pub fn byte_length(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Ordered, thread-safe queue of selected files.
pub struct SelectionRegistry {
    inner: Mutex<RegistryInner>,
}

struct RegistryInner {
    files: Vec<Arc<FileSelection>>,
    next_id: u64,
    /// Set for the duration of a batch run.
    busy: bool,
}

impl Default for SelectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                files: Vec::new(),
                next_id: 0,
                busy: false,
            }),
        }
    }

    /// Appends a file to the end of the selection.
    ///
    /// Insertion order is preserved and duplicate names are permitted;
    /// identity is the returned [`SelectionId`], not the name.
    pub fn add(&self, name: &str, content: Vec<u8>) -> Result<SelectionId, RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.busy {
            return Err(RegistryError::UploadInProgress);
        }
        let id = SelectionId(inner.next_id);
        inner.next_id += 1;
        inner.files.push(Arc::new(FileSelection {
            id,
            name: name.to_string(),
            content,
        }));
        Ok(id)
    }

    /// Reads a file from disk and appends it to the selection.
    pub fn add_path(&self, path: &Path) -> Result<SelectionId, RegistryError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                RegistryError::Io(std::io::Error::other(format!(
                    "no file name in path: {}",
                    path.display()
                )))
            })?;
        let content = std::fs::read(path)?;
        self.add(&name, content)
    }

    /// Removes a selection by identity.
    pub fn remove(&self, id: SelectionId) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.busy {
            return Err(RegistryError::UploadInProgress);
        }
        let before = inner.files.len();
        inner.files.retain(|f| f.id != id);
        if inner.files.len() == before {
            return Err(RegistryError::UnknownSelection(id.0));
        }
        Ok(())
    }

    /// Locks the registry for a batch run and returns the frozen file list.
    pub fn freeze(&self) -> Result<Vec<Arc<FileSelection>>, RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.busy {
            return Err(RegistryError::UploadInProgress);
        }
        inner.busy = true;
        Ok(inner.files.clone())
    }

    /// Unlocks the registry without touching its contents (abort path).
    pub fn thaw(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.busy = false;
    }

    /// Empties the registry and unlocks it (full-batch completion path).
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.files.clear();
        inner.busy = false;
    }

    /// Current selection, in insertion order.
    pub fn snapshot(&self) -> Vec<Arc<FileSelection>> {
        let inner = self.inner.lock().unwrap();
        inner.files.clone()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_busy(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.busy
    }
}
