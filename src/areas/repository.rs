use crate::areas::database::Database;
use crate::areas::refs::Refs;
use crate::artifacts::branch::branch_name::BranchName;
use crate::errors::ReleaseError;
use anyhow::Context;
use std::path::Path;

/// A git repository opened for direct object manipulation.
///
/// No working tree is ever touched: everything goes through the object
/// database and the ref registry under `.git`.
#[derive(Debug)]
pub struct Repository {
    path: Box<Path>,
    database: Database,
    refs: Refs,
}

impl Repository {
    /// Open an existing repository rooted at `path` (the directory containing
    /// `.git`).
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let git_path = path.join(".git");

        if !git_path.is_dir() {
            anyhow::bail!(ReleaseError::Configuration(
                "path is not a git repository (no .git directory)"
            ));
        }

        Ok(Repository {
            path: path.to_path_buf().into_boxed_path(),
            database: Database::new(git_path.join("objects").into_boxed_path()),
            refs: Refs::new(git_path.into_boxed_path()),
        })
    }

    /// Create a fresh repository skeleton at `path` and open it. Running
    /// against an existing repository is a no-op apart from reopening it.
    pub fn init(path: &Path, head_branch: &BranchName) -> anyhow::Result<Self> {
        let git_path = path.join(".git");

        if !git_path.exists() {
            std::fs::create_dir_all(git_path.join("objects"))
                .context("failed to create objects directory")?;
            std::fs::create_dir_all(git_path.join("refs").join("heads"))
                .context("failed to create refs/heads directory")?;
            std::fs::create_dir_all(git_path.join("refs").join("tags"))
                .context("failed to create refs/tags directory")?;

            let refs = Refs::new(git_path.clone().into_boxed_path());
            refs.init_head(head_branch)?;
        }

        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn git_path(&self) -> Box<Path> {
        self.path.join(".git").into_boxed_path()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    /// The committer identity for fabricated commits.
    ///
    /// Resolution order: `[user]` in `.git/config`, then the
    /// `GIT_AUTHOR_NAME`/`GIT_AUTHOR_EMAIL` environment pair. Fabricating
    /// commits without an identity is not possible.
    pub fn identity(&self) -> anyhow::Result<(String, String)> {
        if let Some(identity) = self.config_identity()? {
            return Ok(identity);
        }

        match (
            std::env::var("GIT_AUTHOR_NAME"),
            std::env::var("GIT_AUTHOR_EMAIL"),
        ) {
            (Ok(name), Ok(email)) if !name.is_empty() && !email.is_empty() => Ok((name, email)),
            _ => Err(ReleaseError::Configuration(
                "no committer identity: set [user] name/email in .git/config \
                 or GIT_AUTHOR_NAME/GIT_AUTHOR_EMAIL",
            )
            .into()),
        }
    }

    /// Minimal INI scan of `.git/config` for the `[user]` section.
    fn config_identity(&self) -> anyhow::Result<Option<(String, String)>> {
        let config_path = self.git_path().join("config");
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;

        let mut in_user_section = false;
        let mut name = None;
        let mut email = None;

        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('[') {
                in_user_section = line == "[user]";
                continue;
            }
            if !in_user_section {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "name" => name = Some(value.trim().to_string()),
                    "email" => email = Some(value.trim().to_string()),
                    _ => {}
                }
            }
        }

        match (name, email) {
            (Some(name), Some(email)) => Ok(Some((name, email))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn init_creates_skeleton_and_is_idempotent() {
        let dir = assert_fs::TempDir::new().unwrap();
        let branch = BranchName::try_parse("main".to_string()).unwrap();

        let repo = Repository::init(dir.path(), &branch).unwrap();
        dir.child(".git/objects").assert(predicates::path::is_dir());
        dir.child(".git/refs/heads")
            .assert(predicates::path::is_dir());
        dir.child(".git/HEAD").assert("ref: refs/heads/main");

        // second init must not clobber anything
        drop(repo);
        Repository::init(dir.path(), &branch).unwrap();
        dir.child(".git/HEAD").assert("ref: refs/heads/main");
    }

    #[test]
    fn open_requires_a_git_directory() {
        let dir = assert_fs::TempDir::new().unwrap();
        assert!(Repository::open(dir.path()).is_err());
    }

    #[test]
    fn identity_comes_from_config() {
        let dir = assert_fs::TempDir::new().unwrap();
        let branch = BranchName::try_parse("main".to_string()).unwrap();
        let repo = Repository::init(dir.path(), &branch).unwrap();

        dir.child(".git/config")
            .write_str("[user]\n\tname = Jane Doe\n\temail = jane@example.com\n")
            .unwrap();

        let (name, email) = repo.identity().unwrap();
        assert_eq!(name, "Jane Doe");
        assert_eq!(email, "jane@example.com");
    }
}
