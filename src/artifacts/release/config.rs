use crate::artifacts::branch::branch_name::BranchName;
use crate::errors::ReleaseError;
use std::path::PathBuf;

/// Where the remote repository lives when it is reached over SSH.
#[derive(Debug, Clone)]
pub struct RemoteHost {
    pub user: String,
    pub host: String,
    pub port: Option<u16>,
}

/// Settings for one release cycle.
///
/// Validation happens in `new`, before any I/O: a cycle that would fail on a
/// missing setting fails here instead, with nothing touched yet.
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    repository_path: PathBuf,
    branch: BranchName,
    remote_repository_path: String,
    remote_host: Option<RemoteHost>,
    author: Option<String>,
    message: Option<String>,
    tag: Option<String>,
    merge_back: bool,
    pull_remote: Option<String>,
    bare_remote: bool,
}

impl ReleaseConfig {
    pub fn new(
        repository_path: PathBuf,
        branch: BranchName,
        remote_repository_path: String,
    ) -> anyhow::Result<Self> {
        if repository_path.as_os_str().is_empty() {
            anyhow::bail!(ReleaseError::Configuration("repository path"));
        }
        if remote_repository_path.is_empty() {
            anyhow::bail!(ReleaseError::Configuration("remote repository path"));
        }

        Ok(ReleaseConfig {
            repository_path,
            branch,
            remote_repository_path,
            remote_host: None,
            author: None,
            message: None,
            tag: None,
            merge_back: true,
            pull_remote: None,
            bare_remote: false,
        })
    }

    pub fn with_remote_host(mut self, host: RemoteHost) -> Self {
        self.remote_host = Some(host);
        self
    }

    /// Override the author/committer identity, as `"Name <email>"`.
    pub fn with_author(mut self, author: String) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_message(mut self, message: String) -> Self {
        self.message = Some(message);
        self
    }

    pub fn with_tag(mut self, tag: String) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn with_merge_back(mut self, merge_back: bool) -> Self {
        self.merge_back = merge_back;
        self
    }

    /// Name of the remote to fetch from before a cycle. Without it, pulling
    /// is skipped.
    pub fn with_pull_remote(mut self, remote: String) -> Self {
        self.pull_remote = Some(remote);
        self
    }

    pub fn with_bare_remote(mut self, bare: bool) -> Self {
        self.bare_remote = bare;
        self
    }

    pub fn repository_path(&self) -> &PathBuf {
        &self.repository_path
    }

    pub fn branch(&self) -> &BranchName {
        &self.branch
    }

    pub fn remote_repository_path(&self) -> &str {
        &self.remote_repository_path
    }

    pub fn remote_host(&self) -> Option<&RemoteHost> {
        self.remote_host.as_ref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn merge_back(&self) -> bool {
        self.merge_back
    }

    pub fn pull_remote(&self) -> Option<&str> {
        self.pull_remote.as_deref()
    }

    pub fn bare_remote(&self) -> bool {
        self.bare_remote
    }

    /// Name the deployment repository is registered under in the local
    /// repository's remote list.
    pub fn deployment_remote_name(&self) -> String {
        format!("release/{}", self.branch)
    }

    /// URL of the deployment repository.
    ///
    /// With a host: `ssh://user@host[:port]/path`, where a relative remote
    /// path (no leading `/`) lands in the user's home as
    /// `ssh://user@host[:port]/~user/path`. Without a host the path is used
    /// as a plain local URL.
    pub fn remote_url(&self) -> String {
        match &self.remote_host {
            Some(remote) => {
                let authority = match remote.port {
                    Some(port) => format!("{}@{}:{}", remote.user, remote.host, port),
                    None => format!("{}@{}", remote.user, remote.host),
                };
                if self.remote_repository_path.starts_with('/') {
                    format!("ssh://{}{}", authority, self.remote_repository_path)
                } else {
                    format!(
                        "ssh://{}/~{}/{}",
                        authority, remote.user, self.remote_repository_path
                    )
                }
            }
            None => self.remote_repository_path.clone(),
        }
    }
}
