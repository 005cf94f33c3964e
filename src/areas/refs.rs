//! Branch and tag registry
//!
//! Refs are the only mutable state in the engine: text files under
//! `refs/heads/` and `refs/tags/` mapping a name to a commit id, created
//! lazily on first set. Individual updates take an exclusive file lock, so a
//! single write is atomic, but across whole release cycles the semantics
//! are last-write-wins. Two concurrent cycles against the same branch pair
//! can race and silently drop one cycle's result; callers who need more
//! should either use `compare_and_set` or hold an external advisory lock
//! around the full cycle, keyed by (repository path, deployment branch).
//!
//! Ref files contain either a 40-character hash or `ref: <path>` for
//! symbolic references; reads follow the indirection.

use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::io::{Read, Seek, Write};
use std::ops::DerefMut;
use std::path::Path;
use walkdir::WalkDir;

/// Regex pattern for parsing symbolic references
const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// Prefix of the derived deployment branch.
const DEPLOYMENT_BRANCH_PREFIX: &str = "release/";

/// Derive the deployment branch name for a source branch.
///
/// This is a pure naming convention (`release/<source>`), deliberately not
/// user-overridable: the orchestrator depends on it to locate the last
/// release commit of any source branch.
pub fn deployment_branch_name(source: &BranchName) -> BranchName {
    // The prefix cannot invalidate an already-valid name.
    BranchName::try_parse(format!("{DEPLOYMENT_BRANCH_PREFIX}{source}"))
        .expect("derived deployment branch name is always valid")
}

/// Internal representation of a ref file's content.
#[derive(Debug, Clone)]
enum SymRefOrOid {
    SymRef { target: String },
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn read_symref_or_oid(path: &Path) -> anyhow::Result<Option<SymRefOrOid>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        let symref_match = regex::Regex::new(SYMREF_REGEX)?.captures(content);
        if let Some(symref_match) = symref_match {
            Ok(Some(SymRefOrOid::SymRef {
                target: symref_match[1].to_string(),
            }))
        } else {
            Ok(Some(SymRefOrOid::Oid(ObjectId::try_parse(
                content.to_string(),
            )?)))
        }
    }
}

/// File-backed branch and tag registry rooted at a `.git` directory.
#[derive(Debug, new)]
pub struct Refs {
    path: Box<Path>,
}

impl Refs {
    /// Read the commit a branch points at, following symbolic indirection.
    /// Returns `None` when the branch does not exist yet.
    pub fn read_ref(&self, branch: &BranchName) -> anyhow::Result<Option<ObjectId>> {
        self.read_symref(&self.heads_path().join(branch.as_ref()))
    }

    /// Point a branch at a commit, creating the branch on first use.
    ///
    /// Unconditional overwrite: last write wins. See the module docs for why
    /// nothing stronger is offered here.
    pub fn update_ref(&self, branch: &BranchName, oid: &ObjectId) -> anyhow::Result<()> {
        let branch_path = self.heads_path().join(branch.as_ref()).into_boxed_path();
        self.write_ref_file(branch_path, oid.as_ref())
    }

    /// Compare-and-set update for callers needing stronger-than-last-write-
    /// wins guarantees: the branch is moved to `oid` only while it still
    /// points at `expected` (`None` meaning "does not exist yet"). Returns
    /// whether the swap happened.
    pub fn compare_and_set(
        &self,
        branch: &BranchName,
        expected: Option<&ObjectId>,
        oid: &ObjectId,
    ) -> anyhow::Result<bool> {
        let branch_path = self.heads_path().join(branch.as_ref());

        std::fs::create_dir_all(branch_path.parent().with_context(|| {
            format!("failed to create parent directories for {branch_path:?}")
        })?)?;

        let mut ref_file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&branch_path)
            .with_context(|| format!("failed to open ref file at {branch_path:?}"))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;

        let mut content = String::new();
        lock.deref_mut().read_to_string(&mut content)?;
        let content = content.trim();

        let current = if content.is_empty() {
            None
        } else {
            Some(ObjectId::try_parse(content.to_string())?)
        };

        if current.as_ref() != expected {
            return Ok(false);
        }

        let file = lock.deref_mut();
        file.set_len(0)?;
        file.seek(std::io::SeekFrom::Start(0))?;
        file.write_all(oid.as_ref().as_bytes())?;

        Ok(true)
    }

    /// Create a tag pointing at a commit. Tags are written once; an existing
    /// tag with the same name is an error.
    pub fn create_tag(&self, name: &str, oid: &ObjectId) -> anyhow::Result<()> {
        let tag_path = self.tags_path().join(name).into_boxed_path();

        if tag_path.exists() {
            anyhow::bail!("tag {} already exists", name);
        }

        self.write_ref_file(tag_path, oid.as_ref())
    }

    pub fn read_tag(&self, name: &str) -> anyhow::Result<Option<ObjectId>> {
        self.read_symref(&self.tags_path().join(name))
    }

    /// All tag names, in directory-walk order.
    pub fn list_tags(&self) -> anyhow::Result<Vec<String>> {
        let tags_path = self.tags_path();
        if !tags_path.exists() {
            return Ok(Vec::new());
        }

        let mut tags = WalkDir::new(tags_path.as_ref())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(tags_path.as_ref())
                    .ok()
                    .map(|relative| relative.to_string_lossy().to_string())
            })
            .collect::<Vec<_>>();
        tags.sort();

        Ok(tags)
    }

    /// Initialize HEAD as a symbolic ref to the given branch. Used when
    /// creating a fresh repository skeleton.
    pub fn init_head(&self, branch: &BranchName) -> anyhow::Result<()> {
        self.write_ref_file(
            self.path.join("HEAD").into_boxed_path(),
            &format!("ref: refs/heads/{branch}"),
        )
    }

    fn read_symref(&self, path: &Path) -> anyhow::Result<Option<ObjectId>> {
        let ref_content = SymRefOrOid::read_symref_or_oid(path)?;

        match ref_content {
            Some(SymRefOrOid::SymRef { target }) => {
                self.read_symref(self.path.join(target).as_path())
            }
            Some(SymRefOrOid::Oid(oid)) => Ok(Some(oid)),
            None => Ok(None),
        }
    }

    fn write_ref_file(&self, path: Box<Path>, raw_ref: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(path.parent().with_context(|| {
            format!("failed to create parent directories for ref file at {path:?}")
        })?)?;

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.clone())
            .with_context(|| format!("failed to open ref file at {path:?}"))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;
        lock.deref_mut().write_all(raw_ref.as_bytes())?;

        Ok(())
    }

    pub fn refs_path(&self) -> Box<Path> {
        self.path.join("refs").into_boxed_path()
    }

    pub fn heads_path(&self) -> Box<Path> {
        self.refs_path().join("heads").into_boxed_path()
    }

    pub fn tags_path(&self) -> Box<Path> {
        self.refs_path().join("tags").into_boxed_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::proptest;

    fn oid(fill: char) -> ObjectId {
        ObjectId::try_parse(fill.to_string().repeat(40)).unwrap()
    }

    fn refs_in(dir: &assert_fs::TempDir) -> Refs {
        Refs::new(dir.path().to_path_buf().into_boxed_path())
    }

    #[test]
    fn branch_is_created_lazily_and_overwritten() {
        let dir = assert_fs::TempDir::new().unwrap();
        let refs = refs_in(&dir);
        let branch = BranchName::try_parse("main".to_string()).unwrap();

        assert_eq!(refs.read_ref(&branch).unwrap(), None);

        refs.update_ref(&branch, &oid('a')).unwrap();
        assert_eq!(refs.read_ref(&branch).unwrap(), Some(oid('a')));

        // last write wins
        refs.update_ref(&branch, &oid('b')).unwrap();
        assert_eq!(refs.read_ref(&branch).unwrap(), Some(oid('b')));
    }

    #[test]
    fn compare_and_set_moves_only_from_expected() {
        let dir = assert_fs::TempDir::new().unwrap();
        let refs = refs_in(&dir);
        let branch = BranchName::try_parse("main".to_string()).unwrap();

        // creation requires expecting absence
        assert!(!refs.compare_and_set(&branch, Some(&oid('a')), &oid('b')).unwrap());
        assert!(refs.compare_and_set(&branch, None, &oid('a')).unwrap());

        // stale expectation loses
        assert!(!refs.compare_and_set(&branch, None, &oid('b')).unwrap());
        assert!(refs.compare_and_set(&branch, Some(&oid('a')), &oid('b')).unwrap());
        assert_eq!(refs.read_ref(&branch).unwrap(), Some(oid('b')));
    }

    #[test]
    fn tags_are_write_once() {
        let dir = assert_fs::TempDir::new().unwrap();
        let refs = refs_in(&dir);

        refs.create_tag("v1", &oid('a')).unwrap();
        assert_eq!(refs.read_tag("v1").unwrap(), Some(oid('a')));
        assert!(refs.create_tag("v1", &oid('b')).is_err());

        refs.create_tag("v2", &oid('b')).unwrap();
        assert_eq!(refs.list_tags().unwrap(), vec!["v1", "v2"]);
    }

    #[test]
    fn deployment_branch_is_a_pure_derivation() {
        let branch = BranchName::try_parse("main".to_string()).unwrap();
        assert_eq!(deployment_branch_name(&branch).as_ref(), "release/main");

        let nested = BranchName::try_parse("feature/login".to_string()).unwrap();
        assert_eq!(
            deployment_branch_name(&nested).as_ref(),
            "release/feature/login"
        );
    }

    proptest! {
        #[test]
        fn valid_branch_names_parse(branch_name in "[a-zA-Z0-9_-]+") {
            // Valid names: alphanumeric, underscore, hyphen
            proptest::prop_assert!(BranchName::try_parse(branch_name).is_ok());
        }

        #[test]
        fn hierarchical_branch_names_parse(
            prefix in "[a-zA-Z0-9_-]+",
            suffix in "[a-zA-Z0-9_-]+"
        ) {
            let branch_name = format!("{}/{}", prefix, suffix);
            proptest::prop_assert!(BranchName::try_parse(branch_name).is_ok());
        }

        #[test]
        fn names_starting_with_dot_are_rejected(suffix in "[a-zA-Z0-9_-]+") {
            let branch_name = format!(".{}", suffix);
            proptest::prop_assert!(BranchName::try_parse(branch_name).is_err());
        }

        #[test]
        fn names_ending_with_lock_are_rejected(prefix in "[a-zA-Z0-9_-]+") {
            let branch_name = format!("{}.lock", prefix);
            proptest::prop_assert!(BranchName::try_parse(branch_name).is_err());
        }

        #[test]
        fn names_with_consecutive_dots_are_rejected(
            prefix in "[a-zA-Z0-9_-]+",
            suffix in "[a-zA-Z0-9_-]+"
        ) {
            let branch_name = format!("{}..{}", prefix, suffix);
            proptest::prop_assert!(BranchName::try_parse(branch_name).is_err());
        }

        #[test]
        fn names_with_special_chars_are_rejected(
            prefix in "[a-zA-Z0-9_-]+",
            suffix in "[a-zA-Z0-9_-]+",
            special_char in r"[\*:\?\[\\^~]"
        ) {
            let branch_name = format!("{}{}{}", prefix, special_char, suffix);
            proptest::prop_assert!(BranchName::try_parse(branch_name).is_err());
        }
    }
}
