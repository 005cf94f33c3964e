//! Copy-on-write tree filtering
//!
//! The filter rewrites a commit's tree without a working directory: paths are
//! added or removed against an in-memory staged tree that only materializes
//! the directories actually touched. Untouched subtrees stay as carried
//! references to the original objects and are never re-read or re-written,
//! so a handful of edits against an arbitrarily large tree costs work
//! proportional to the touched paths only.

pub mod staged_tree;
pub mod tree_filter;

use tree_filter::TreeFilter;

/// A set of edits applied to a drafted release tree before it is written.
///
/// Implementors get the filter after it has been seeded with the source
/// commit's tree and call `add`/`remove` on it.
pub trait TreeRewrite {
    fn rewrite(&self, filter: &mut TreeFilter) -> anyhow::Result<()>;
}

impl TreeRewrite for Vec<tree_filter::FilterOp> {
    fn rewrite(&self, filter: &mut TreeFilter) -> anyhow::Result<()> {
        for op in self {
            match op {
                tree_filter::FilterOp::Add { path, blob } => filter.add(path, blob.clone())?,
                tree_filter::FilterOp::Remove { path } => filter.remove(path)?,
            }
        }
        Ok(())
    }
}
