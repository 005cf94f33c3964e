mod common;

use assert_fs::TempDir;
use common::fixtures::{commit_files, main_branch, seeded_repository_dir};
use gitship::areas::repository::Repository;
use gitship::artifacts::filter::tree_filter::TreeFilter;
use gitship::artifacts::objects::blob::Blob;
use gitship::artifacts::objects::entry_mode::EntryMode;
use gitship::artifacts::objects::object_id::ObjectId;
use gitship::artifacts::objects::tree::{Tree, TreeRecord};
use gitship::errors::ReleaseError;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::BTreeMap;

fn root_tree_oid(repository: &Repository) -> ObjectId {
    let tip = repository
        .refs()
        .read_ref(&main_branch())
        .unwrap()
        .expect("branch exists");
    repository
        .database()
        .load_commit(&tip)
        .unwrap()
        .tree_oid()
        .clone()
}

#[rstest]
fn untouched_subtrees_keep_their_object_id(
    seeded_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository = Repository::open(seeded_repository_dir.path())?;
    commit_files(
        &repository,
        &main_branch(),
        &[("a/1.txt", "one"), ("c/2.txt", "two")],
        "initial",
    );

    let root = repository.database().load_tree(&root_tree_oid(&repository))?;
    let untouched_before = root.get("c").expect("c exists").oid.clone();

    let mut filter = TreeFilter::new(repository.database(), &root_tree_oid(&repository))?;
    filter.add("a/b/new.txt", Blob::from_content(b"new".to_vec()))?;
    let rewritten = repository.database().load_tree(&filter.save()?)?;

    // only the spine a/ was rewritten; c/ is carried by reference
    assert_eq!(rewritten.get("c").expect("c survives").oid, untouched_before);
    assert_ne!(
        rewritten.get("a").expect("a survives").oid,
        root.get("a").expect("a exists").oid
    );

    Ok(())
}

#[rstest]
fn add_then_remove_restores_the_original_root(
    seeded_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository = Repository::open(seeded_repository_dir.path())?;
    commit_files(
        &repository,
        &main_branch(),
        &[("a/1.txt", "one"), ("b/2.txt", "two")],
        "initial",
    );
    let original_root = root_tree_oid(&repository);

    let mut filter = TreeFilter::new(repository.database(), &original_root)?;
    filter.add("a/extra.txt", Blob::from_content(b"extra".to_vec()))?;
    filter.remove("a/extra.txt")?;

    // content addressing: same listing, same id
    assert_eq!(filter.save()?, original_root);

    Ok(())
}

#[rstest]
fn emptied_directories_are_pruned_upward(
    seeded_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository = Repository::open(seeded_repository_dir.path())?;
    commit_files(
        &repository,
        &main_branch(),
        &[("deep/nested/only.txt", "x"), ("kept.txt", "y")],
        "initial",
    );

    let mut filter = TreeFilter::new(repository.database(), &root_tree_oid(&repository))?;
    filter.remove("deep/nested/only.txt")?;
    let rewritten = repository.database().load_tree(&filter.save()?)?;

    assert!(rewritten.get("deep").is_none());
    assert!(rewritten.get("kept.txt").is_some());

    Ok(())
}

#[rstest]
fn removing_a_missing_path_is_an_error(
    seeded_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository = Repository::open(seeded_repository_dir.path())?;
    commit_files(&repository, &main_branch(), &[("a/1.txt", "one")], "initial");

    let mut filter = TreeFilter::new(repository.database(), &root_tree_oid(&repository))?;

    let error = filter.remove("a/ghost.txt").unwrap_err();
    assert!(matches!(
        error.downcast_ref::<ReleaseError>(),
        Some(ReleaseError::PathNotFound(path)) if path == "a/ghost.txt"
    ));

    // descending through a file is the same as the path not existing
    assert!(filter.remove("a/1.txt/below").is_err());

    Ok(())
}

#[rstest]
fn submodules_are_carried_without_being_read(
    seeded_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository = Repository::open(seeded_repository_dir.path())?;
    let database = repository.database();

    // the gitlink target lives in another repository and is not resolvable
    // here; the filter must never try to load it
    let foreign_commit = ObjectId::try_parse("f".repeat(40))?;
    let blob_oid = database.store(&Blob::from_content(b"app".to_vec()))?;

    let mut entries = BTreeMap::new();
    entries.insert(
        "vendor".to_string(),
        TreeRecord::new(EntryMode::Submodule, foreign_commit.clone()),
    );
    entries.insert(
        "app.txt".to_string(),
        TreeRecord::new(EntryMode::File(Default::default()), blob_oid),
    );
    let root_oid = database.store(&Tree::from_entries(entries))?;

    let mut filter = TreeFilter::new(database, &root_oid)?;
    filter.add("docs/readme.md", Blob::from_content(b"docs".to_vec()))?;
    let rewritten = database.load_tree(&filter.save()?)?;

    let vendor = rewritten.get("vendor").expect("submodule survives");
    assert_eq!(vendor.mode, EntryMode::Submodule);
    assert_eq!(vendor.oid, foreign_commit);

    Ok(())
}
