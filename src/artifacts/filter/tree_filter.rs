use crate::areas::database::Database;
use crate::artifacts::filter::staged_tree::{StagedEntry, StagedTree};
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::ReleaseError;

/// A single declarative edit against the release tree.
#[derive(Debug, Clone)]
pub enum FilterOp {
    Add { path: String, blob: Blob },
    Remove { path: String },
}

impl FilterOp {
    pub fn add(path: impl Into<String>, blob: Blob) -> Self {
        FilterOp::Add {
            path: path.into(),
            blob,
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        FilterOp::Remove { path: path.into() }
    }
}

/// Copy-on-write editor over a tree snapshot.
///
/// Seeded from a root tree id, it materializes only the directories an edit
/// descends through; everything else remains carried by reference. `save`
/// writes the touched spine back to the database and yields the new root id.
///
/// Paths are slash-separated and relative to the tree root. Adding over a
/// non-tree entry (file or submodule) replaces that entry with a directory;
/// the filter never reads through a submodule boundary.
#[derive(Debug)]
pub struct TreeFilter<'d> {
    database: &'d Database,
    root: StagedTree,
}

impl<'d> TreeFilter<'d> {
    /// Stage the tree identified by `root_oid` for editing.
    pub fn new(database: &'d Database, root_oid: &ObjectId) -> anyhow::Result<Self> {
        let root = database.load_tree(root_oid)?;

        Ok(TreeFilter {
            database,
            root: StagedTree::from_tree(&root),
        })
    }

    /// Start from an empty tree. Used to build the very first snapshot of a
    /// repository that has no commits yet.
    pub fn from_empty(database: &'d Database) -> Self {
        TreeFilter {
            database,
            root: StagedTree::empty(),
        }
    }

    /// Plant a blob at `path`, creating intermediate directories as needed
    /// and overwriting whatever was there.
    pub fn add(&mut self, path: &str, blob: Blob) -> anyhow::Result<()> {
        let segments = split_path(path)?;
        let (leaf, dirs) = segments.split_last().expect("split_path yields >= 1");

        let mut current = &mut self.root;
        for dir in dirs {
            current = Self::descend(self.database, current, dir)?;
        }

        current.insert((*leaf).to_string(), StagedEntry::Blob(blob));
        Ok(())
    }

    /// Remove the entry at `path`. Directories emptied by the removal are
    /// pruned all the way up, so the resulting tree never contains an empty
    /// directory. Removing a path that does not exist is an error.
    pub fn remove(&mut self, path: &str) -> anyhow::Result<()> {
        let segments = split_path(path)?;

        // the returned flag only signals "became empty" to parents; the
        // root itself is never pruned
        Self::remove_in(self.database, &mut self.root, &segments, path)?;
        Ok(())
    }

    /// Write all touched directories to the database and return the new root
    /// tree id. Untouched subtrees keep their original ids.
    pub fn save(self) -> anyhow::Result<ObjectId> {
        self.root.save(self.database)
    }

    /// Step into `name` within `tree`, expanding a carried directory into a
    /// staged one on first touch. Non-tree entries (including submodules)
    /// are replaced by a fresh empty directory, as is a missing entry.
    fn descend<'t>(
        database: &Database,
        tree: &'t mut StagedTree,
        name: &str,
    ) -> anyhow::Result<&'t mut StagedTree> {
        let staged = match tree.get(name) {
            Some(StagedEntry::Tree(_)) => None,
            Some(StagedEntry::Carried(record)) if record.mode.is_tree() => {
                let subtree = database.load_tree(&record.oid)?;
                Some(StagedTree::from_tree(&subtree))
            }
            _ => Some(StagedTree::empty()),
        };

        if let Some(staged) = staged {
            tree.insert(name.to_string(), StagedEntry::Tree(staged));
        }

        match tree.get_mut(name) {
            Some(StagedEntry::Tree(subtree)) => Ok(subtree),
            _ => unreachable!("entry was just staged as a tree"),
        }
    }

    /// Recursive removal; returns whether `tree` became empty so the caller
    /// can prune the entry pointing at it.
    fn remove_in(
        database: &Database,
        tree: &mut StagedTree,
        segments: &[&str],
        full_path: &str,
    ) -> anyhow::Result<bool> {
        let (head, rest) = segments.split_first().expect("split_path yields >= 1");

        if rest.is_empty() {
            if tree.remove(head).is_none() {
                anyhow::bail!(ReleaseError::PathNotFound(full_path.to_string()));
            }
            return Ok(tree.is_empty());
        }

        // descending through anything that is not a directory is the same
        // as the path not existing
        let is_tree_entry = match tree.get(head) {
            Some(StagedEntry::Tree(_)) => true,
            Some(StagedEntry::Carried(record)) => record.mode.is_tree(),
            _ => false,
        };
        if !is_tree_entry {
            anyhow::bail!(ReleaseError::PathNotFound(full_path.to_string()));
        }

        let subtree = Self::descend(database, tree, head)?;
        let became_empty = Self::remove_in(database, subtree, rest, full_path)?;

        if became_empty {
            tree.remove(head);
        }
        Ok(tree.is_empty())
    }
}

fn split_path(path: &str) -> anyhow::Result<Vec<&str>> {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.is_empty() {
        anyhow::bail!("empty path");
    }
    Ok(segments)
}
