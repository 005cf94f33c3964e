use crate::areas::database::Database;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::{Tree, TreeRecord};
use std::collections::BTreeMap;

/// One entry of a staged tree.
///
/// `Carried` entries point at objects that already exist in the database and
/// were not touched by any edit; they are written back verbatim, by id, so an
/// unmodified subtree keeps its original object id. Submodule entries are
/// always carried since their target commit lives in another repository.
#[derive(Debug, Clone)]
pub enum StagedEntry {
    Carried(TreeRecord),
    Blob(Blob),
    Tree(StagedTree),
}

/// A mutable directory snapshot under construction.
///
/// Built lazily from an immutable [`Tree`]: every entry starts out carried
/// and is only expanded into a nested `StagedTree` when an edit descends
/// into it.
#[derive(Debug, Clone, Default)]
pub struct StagedTree {
    entries: BTreeMap<String, StagedEntry>,
}

impl StagedTree {
    pub fn empty() -> Self {
        StagedTree::default()
    }

    /// Stage an existing tree: all entries are carried by reference.
    pub fn from_tree(tree: &Tree) -> Self {
        let entries = tree
            .entries()
            .map(|(name, record)| (name.clone(), StagedEntry::Carried(record.clone())))
            .collect();

        StagedTree { entries }
    }

    pub fn get(&self, name: &str) -> Option<&StagedEntry> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut StagedEntry> {
        self.entries.get_mut(name)
    }

    pub fn insert(&mut self, name: String, entry: StagedEntry) {
        self.entries.insert(name, entry);
    }

    pub fn remove(&mut self, name: &str) -> Option<StagedEntry> {
        self.entries.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the staged tree to the database bottom-up and return the
    /// resulting tree id.
    ///
    /// Carried entries are emitted as-is without loading the objects they
    /// point at. Nested staged trees are saved first so their ids are known
    /// when the parent is serialized; blobs planted by `add` are stored here
    /// too. Empty nested trees must have been pruned by the caller before
    /// saving, so no empty tree object is ever produced below the root. The
    /// root itself may legitimately be empty (a release that removed
    /// everything) and is stored as the empty tree.
    pub fn save(&self, database: &Database) -> anyhow::Result<ObjectId> {
        let mut records = BTreeMap::new();

        for (name, entry) in &self.entries {
            let record = match entry {
                StagedEntry::Carried(record) => record.clone(),
                StagedEntry::Blob(blob) => {
                    let oid = database.store(blob)?;
                    TreeRecord::new(EntryMode::File(blob.mode().clone()), oid)
                }
                StagedEntry::Tree(subtree) => {
                    let oid = subtree.save(database)?;
                    TreeRecord::new(EntryMode::Directory, oid)
                }
            };
            records.insert(name.clone(), record);
        }

        database.store(&Tree::from_entries(records))
    }
}
