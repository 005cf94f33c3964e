//! Commit fabrication
//!
//! Release and merge-back commits are copies of an existing commit with new
//! parents, fresh timestamps and (optionally) a new message and author. The
//! tree pointer is reused as-is, so no tree or blob objects are duplicated.
//!
//! Timestamps are taken from the local clock, truncated to whole seconds as
//! git requires. When that coincides with the source commit's corresponding
//! timestamp it is advanced by one second, so the copy always serializes to
//! a distinct object and timestamps stay strictly ahead of the source.

use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_id::ObjectId;
use chrono::SubsecRound;

/// Overrides for a copied commit. Fields left at `Default` fall back to the
/// source commit's message, an empty parent list and the repository identity.
#[derive(Debug, Clone, Default)]
pub struct CopyOptions {
    pub message: Option<String>,
    pub parents: Vec<ObjectId>,
    /// Identity override as `"Name <email>"`.
    pub author: Option<String>,
}

/// Fabricate a new commit from `source`, reusing its tree.
///
/// The returned commit is not yet stored; the caller decides when (and
/// whether) it hits the object database.
pub fn copy_commit(
    repository: &Repository,
    source: &Commit,
    options: &CopyOptions,
) -> anyhow::Result<Commit> {
    let now = chrono::Local::now().fixed_offset().trunc_subsecs(0);

    let authored_at = advance_past(now, source.author().timestamp());
    let committed_at = advance_past(now, source.committer().timestamp());

    let (name, email) = match options.author.as_deref() {
        Some(identity) => {
            let parsed = Author::try_parse_identity(identity, now)?;
            (parsed.name().to_string(), parsed.email().to_string())
        }
        None => repository.identity()?,
    };

    let author = Author::new_with_timestamp(name.clone(), email.clone(), authored_at);
    let committer = Author::new_with_timestamp(name, email, committed_at);

    let message = options
        .message
        .clone()
        .unwrap_or_else(|| source.message().to_string());

    Ok(Commit::new(
        options.parents.clone(),
        source.tree_oid().clone(),
        author,
        committer,
        message,
    )
    .with_encoding(source.encoding().map(str::to_string)))
}

fn advance_past(
    now: chrono::DateTime<chrono::FixedOffset>,
    source: chrono::DateTime<chrono::FixedOffset>,
) -> chrono::DateTime<chrono::FixedOffset> {
    if now.timestamp() == source.timestamp() {
        now + chrono::Duration::seconds(1)
    } else {
        now
    }
}
