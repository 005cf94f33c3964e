//! Git tree object
//!
//! A tree is a directory snapshot: an ordered set of entries, unique by name,
//! each carrying a mode and the id of the object it points at. The tree's own
//! id is derived from the canonical serialization of its sorted entries, so
//! two trees listing the same content are the same object.
//!
//! On disk: `tree <size>\0<entries>`, each entry `<mode> <name>\0<20-byte-sha1>`.
//!
//! git sorts entries as if directory names ended in `/`; serialization honors
//! that so the ids produced here match what git itself would produce.

use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// One tree entry: a mode and the id of the blob, subtree or submodule
/// commit it references.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct TreeRecord {
    pub mode: EntryMode,
    pub oid: ObjectId,
}

/// An immutable, already-hashed directory snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: BTreeMap<String, TreeRecord>,
}

impl Tree {
    pub fn from_entries(entries: BTreeMap<String, TreeRecord>) -> Self {
        Tree { entries }
    }

    pub fn get(&self, name: &str) -> Option<&TreeRecord> {
        self.entries.get(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &TreeRecord)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in git's canonical order: byte order over names, with
    /// directory names compared as if they had a trailing `/`.
    fn canonical_entries(&self) -> Vec<(&String, &TreeRecord)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|(a_name, a), (b_name, b)| {
            let a_key = sort_key(a_name, &a.mode);
            let b_key = sort_key(b_name, &b.mode);
            a_key.cmp(&b_key)
        });
        entries
    }
}

fn sort_key(name: &str, mode: &EntryMode) -> Vec<u8> {
    let mut key = name.as_bytes().to_vec();
    if mode.is_tree() {
        key.push(b'/');
    }
    key
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content_bytes = Vec::new();
        for (name, record) in self.canonical_entries() {
            let header = format!("{} {}", record.mode.as_str(), name);
            content_bytes.write_all(header.as_bytes())?;
            content_bytes.push(0);
            record.oid.write_h40_to(&mut content_bytes)?;
        }

        let mut tree_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content_bytes.len());
        tree_bytes.write_all(header.as_bytes())?;
        tree_bytes.write_all(&content_bytes)?;

        Ok(Bytes::from(tree_bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = BTreeMap::new();
        let mut reader = reader;

        // Reuse scratch buffers to reduce allocs
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            // Read "mode " (space-delimited)
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            // Must end with ' ' or it's malformed
            if *mode_bytes.last().unwrap() != b' ' {
                return Err(anyhow::anyhow!("unexpected EOF in mode"));
            }
            mode_bytes.pop(); // drop the space

            let mode_str = std::str::from_utf8(&mode_bytes)?;
            let mode = EntryMode::try_from(mode_str)?;

            // Read "name\0"
            name_bytes.clear();
            let n = reader.read_until(b'\0', &mut name_bytes)?;
            if n == 0 || *name_bytes.last().unwrap() != b'\0' {
                return Err(anyhow::anyhow!("unexpected EOF in name"));
            }
            name_bytes.pop(); // drop NUL
            let name = std::str::from_utf8(&name_bytes)?.to_owned();

            // Read object id
            let oid =
                ObjectId::read_h40_from(&mut reader).context("unexpected EOF in object id")?;

            entries.insert(name, TreeRecord::new(mode, oid));
        }

        Ok(Tree { entries })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }
}
