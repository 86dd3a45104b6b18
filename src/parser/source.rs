//! Layout sources: where document layouts come from.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::DocumentLayout;

/// Loads the layout of a document by its file name.
pub trait LayoutSource: Send + Sync {
    /// Load the named document.
    fn load(&self, document: &str) -> Result<DocumentLayout>;
}

/// Parse a layout from JSON bytes.
pub fn layout_from_bytes(name: &str, data: &[u8]) -> Result<DocumentLayout> {
    let mut layout: DocumentLayout = serde_json::from_slice(data)
        .map_err(|e| Error::UnreadableDocument(name.to_string(), e.to_string()))?;
    layout.name = name.to_string();
    Ok(layout)
}

/// Parse a layout from a reader.
pub fn layout_from_reader<R: Read>(name: &str, mut reader: R) -> Result<DocumentLayout> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    layout_from_bytes(name, &data)
}

/// Load a layout JSON file; the document is named after the file.
pub fn layout_from_file<P: AsRef<Path>>(path: P) -> Result<DocumentLayout> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let data =
        std::fs::read(path).map_err(|e| Error::UnreadableDocument(name.clone(), e.to_string()))?;
    layout_from_bytes(&name, &data)
}

/// Reads `<dir>/<stem>.json` for a document named `<stem>.pdf`.
#[derive(Debug, Clone)]
pub struct JsonLayoutSource {
    dir: PathBuf,
}

impl JsonLayoutSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the layout file for a document.
    pub fn path_for(&self, document: &str) -> PathBuf {
        let stem = Path::new(document)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| document.to_string());
        self.dir.join(format!("{stem}.json"))
    }
}

impl LayoutSource for JsonLayoutSource {
    fn load(&self, document: &str) -> Result<DocumentLayout> {
        let path = self.path_for(document);
        let data = std::fs::read(&path).map_err(|e| {
            Error::UnreadableDocument(document.to_string(), format!("{}: {}", path.display(), e))
        })?;
        layout_from_bytes(document, &data)
    }
}

/// Serves layouts held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLayoutSource {
    layouts: HashMap<String, DocumentLayout>,
}

impl MemoryLayoutSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a layout under its own name.
    pub fn insert(&mut self, layout: DocumentLayout) {
        self.layouts.insert(layout.name.clone(), layout);
    }

    /// Builder-style insert.
    pub fn with(mut self, layout: DocumentLayout) -> Self {
        self.insert(layout);
        self
    }
}

impl LayoutSource for MemoryLayoutSource {
    fn load(&self, document: &str) -> Result<DocumentLayout> {
        self.layouts
            .get(document)
            .cloned()
            .ok_or_else(|| Error::UnreadableDocument(document.to_string(), "not found".into()))
    }
}
