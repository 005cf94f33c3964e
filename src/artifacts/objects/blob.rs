//! Git blob object
//!
//! Blobs carry raw file content; the name and permissions live in the tree
//! entry pointing at them. The mode kept here travels with the blob so the
//! filter knows which tree-entry mode to write when it plants the blob.
//!
//! On disk: `blob <size>\0<content>`

use crate::artifacts::objects::entry_mode::FileMode;
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use derive_new::new;
use std::io::{BufRead, Write};

/// File content plus its mode. Immutable once hashed.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Blob {
    content: Bytes,
    mode: FileMode,
}

impl Blob {
    /// Convenience constructor for regular-file content.
    pub fn from_content(content: impl Into<Bytes>) -> Self {
        Blob::new(content.into(), FileMode::Regular)
    }

    pub fn mode(&self) -> &FileMode {
        &self.mode
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }
}

impl Packable for Blob {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut blob_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), self.content.len());
        blob_bytes.write_all(header.as_bytes())?;
        blob_bytes.write_all(&self.content)?;

        Ok(Bytes::from(blob_bytes))
    }
}

impl Unpackable for Blob {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        // the header has already been read
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;

        Ok(Self::new(content.into(), Default::default()))
    }
}

impl Object for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }
}
