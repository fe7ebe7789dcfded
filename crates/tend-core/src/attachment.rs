use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Pdf,
    Docx,
    Txt,
    Jpg,
    Png,
}

impl AttachmentKind {
    pub const ACCEPTED: [AttachmentKind; 5] = [
        AttachmentKind::Pdf,
        AttachmentKind::Docx,
        AttachmentKind::Txt,
        AttachmentKind::Jpg,
        AttachmentKind::Png,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            AttachmentKind::Pdf => "pdf",
            AttachmentKind::Docx => "docx",
            AttachmentKind::Txt => "txt",
            AttachmentKind::Jpg => "jpg",
            AttachmentKind::Png => "png",
        }
    }

    /// Classifies a file name by its extension, ignoring case.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
        Self::ACCEPTED
            .into_iter()
            .find(|kind| kind.extension() == ext)
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Opaque file reference held by a task. The bytes are never interpreted
/// and are left out of serialized output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub kind: AttachmentKind,
    pub size: usize,
    #[serde(skip)]
    bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> StoreResult<Self> {
        let file_name = file_name.into();
        let kind = AttachmentKind::from_file_name(&file_name).ok_or_else(|| {
            StoreError::UnsupportedAttachment {
                file_name: file_name.clone(),
            }
        })?;

        Ok(Self {
            file_name,
            kind,
            size: bytes.len(),
            bytes,
        })
    }

    #[tracing::instrument(skip(path), fields(path = %path.display()))]
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        // Reject by name before touching the file system.
        if AttachmentKind::from_file_name(&file_name).is_none() {
            return Err(StoreError::UnsupportedAttachment { file_name }.into());
        }

        let bytes =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        debug!(size = bytes.len(), "read attachment");
        Ok(Self::new(file_name, bytes)?)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
