use assert_fs::TempDir;
use assert_fs::prelude::*;
use gitship::areas::repository::Repository;
use gitship::artifacts::branch::branch_name::BranchName;
use gitship::artifacts::filter::tree_filter::TreeFilter;
use gitship::artifacts::objects::blob::Blob;
use gitship::artifacts::objects::commit::{Author, Commit};
use gitship::artifacts::objects::object_id::ObjectId;
use rstest::fixture;
use std::sync::atomic::{AtomicI64, Ordering};

/// Deterministic, strictly increasing commit timestamps so identical file
/// content still yields distinct commits.
static CLOCK: AtomicI64 = AtomicI64::new(1_700_000_000);

pub fn next_timestamp() -> chrono::DateTime<chrono::FixedOffset> {
    let secs = CLOCK.fetch_add(60, Ordering::SeqCst);
    chrono::DateTime::from_timestamp(secs, 0)
        .expect("valid timestamp")
        .fixed_offset()
}

pub fn main_branch() -> BranchName {
    BranchName::try_parse("main".to_string()).expect("valid branch name")
}

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// A repository with a committer identity but no commits yet.
#[fixture]
pub fn seeded_repository_dir(repository_dir: TempDir) -> TempDir {
    Repository::init(repository_dir.path(), &main_branch()).expect("Failed to init repository");

    repository_dir
        .child(".git/config")
        .write_str("[user]\n\tname = Test User\n\temail = test@example.com\n")
        .expect("Failed to write repository config");

    repository_dir
}

/// Commit the given files on top of the branch tip (or as a root commit)
/// and advance the branch. Returns the new commit id.
pub fn commit_files(
    repository: &Repository,
    branch: &BranchName,
    files: &[(&str, &str)],
    message: &str,
) -> ObjectId {
    let database = repository.database();

    let parent = repository
        .refs()
        .read_ref(branch)
        .expect("Failed to read branch");

    let mut filter = match &parent {
        Some(tip) => {
            let commit = database.load_commit(tip).expect("Failed to load tip commit");
            TreeFilter::new(database, commit.tree_oid()).expect("Failed to stage tree")
        }
        None => TreeFilter::from_empty(database),
    };

    for (path, content) in files {
        filter
            .add(path, Blob::from_content(content.as_bytes().to_vec()))
            .expect("Failed to add file");
    }
    let tree_oid = filter.save().expect("Failed to save tree");

    let author = Author::new_with_timestamp(
        "Test User".to_string(),
        "test@example.com".to_string(),
        next_timestamp(),
    );
    let commit = Commit::new(
        parent.into_iter().collect(),
        tree_oid,
        author.clone(),
        author,
        message.to_string(),
    );

    let oid = database.store(&commit).expect("Failed to store commit");
    repository
        .refs()
        .update_ref(branch, &oid)
        .expect("Failed to update branch");

    oid
}
