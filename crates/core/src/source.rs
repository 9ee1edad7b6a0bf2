//! Where the input text comes from.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// UTF-8 input text and the identifier it was read under. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInput {
    identifier: String,
    text: String,
}

impl RawInput {
    pub fn new(identifier: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            text: text.into(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// UTF-8 length in bytes.
    pub fn byte_len(&self) -> usize {
        self.text.len()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Provider of input text.
///
/// A missing, unreadable or non-UTF-8 input is `Error::InputUnavailable`.
/// Emptiness is not an error at this level.
pub trait TextSource {
    fn read(&self, identifier: &str) -> Result<RawInput>;
}

/// Reads identifiers as file paths, optionally relative to a base directory.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    base_dir: Option<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative identifiers against `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }
}

impl TextSource for FileSource {
    fn read(&self, identifier: &str) -> Result<RawInput> {
        let path = match &self.base_dir {
            Some(base) => base.join(identifier),
            None => PathBuf::from(identifier),
        };

        // read_to_string reports invalid UTF-8 as ErrorKind::InvalidData
        let text = std::fs::read_to_string(&path).map_err(|source| Error::InputUnavailable {
            identifier: identifier.to_string(),
            source,
        })?;

        tracing::debug!(path = %path.display(), bytes = text.len(), "read input file");
        Ok(RawInput::new(identifier, text))
    }
}

/// Serves one in-memory text under one identifier.
#[derive(Debug, Clone)]
pub struct MemorySource {
    identifier: String,
    text: String,
}

impl MemorySource {
    pub fn new(identifier: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            text: text.into(),
        }
    }
}

impl TextSource for MemorySource {
    fn read(&self, identifier: &str) -> Result<RawInput> {
        if identifier != self.identifier {
            return Err(Error::InputUnavailable {
                identifier: identifier.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such text"),
            });
        }
        Ok(RawInput::new(&self.identifier, &self.text))
    }
}
