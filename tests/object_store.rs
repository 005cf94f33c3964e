mod common;

use assert_fs::TempDir;
use common::fixtures::{commit_files, main_branch, seeded_repository_dir};
use gitship::areas::repository::Repository;
use gitship::artifacts::objects::blob::Blob;
use gitship::artifacts::objects::object::Object;
use gitship::artifacts::objects::object_id::ObjectId;
use gitship::errors::ReleaseError;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn storing_the_same_content_twice_is_idempotent(
    seeded_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository = Repository::open(seeded_repository_dir.path())?;
    let database = repository.database();

    let blob = Blob::from_content(b"hello release".to_vec());
    let first = database.store(&blob)?;
    let second = database.store(&blob)?;

    assert_eq!(first, second);
    assert_eq!(first, blob.object_id()?);
    assert!(database.contains(&first));

    Ok(())
}

#[rstest]
fn stored_objects_read_back_equal(
    seeded_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository = Repository::open(seeded_repository_dir.path())?;
    let database = repository.database();

    let blob = Blob::from_content(b"content under test".to_vec());
    let blob_oid = database.store(&blob)?;
    assert_eq!(database.load_blob(&blob_oid)?.content(), blob.content());

    let commit_oid = commit_files(
        &repository,
        &main_branch(),
        &[("src/app.txt", "v1")],
        "initial",
    );
    let commit = database.load_commit(&commit_oid)?;
    assert_eq!(commit.message(), "initial");
    assert_eq!(commit.parents(), &[]);

    // the tree the commit points at must be resolvable too
    let tree = database.load_tree(commit.tree_oid())?;
    assert!(tree.get("src").is_some());

    Ok(())
}

#[rstest]
fn missing_object_reads_fail_with_a_typed_error(
    seeded_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository = Repository::open(seeded_repository_dir.path())?;
    let absent = ObjectId::try_parse("0".repeat(40))?;

    let error = repository.database().load_commit(&absent).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<ReleaseError>(),
        Some(ReleaseError::ObjectNotFound(oid)) if *oid == absent
    ));

    Ok(())
}

#[rstest]
fn loading_an_object_as_the_wrong_type_fails(
    seeded_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository = Repository::open(seeded_repository_dir.path())?;
    let database = repository.database();

    let blob_oid = database.store(&Blob::from_content(b"not a commit".to_vec()))?;
    assert!(database.load_commit(&blob_oid).is_err());
    assert!(database.load_tree(&blob_oid).is_err());

    Ok(())
}
