use crate::areas::refs;
use crate::areas::repository::Repository;
use crate::artifacts::release::config::ReleaseConfig;
use crate::artifacts::remote::transport::Transport;
use crate::errors::ReleaseError;

/// Pushes release branches to the deployment repository and repoints its
/// checkout.
///
/// Every step is idempotent: initialization of an already initialized remote
/// is a no-op, pushing an already pushed branch is a no-op, and switching to
/// the commit the checkout is already on leaves it unchanged. A failed deploy
/// can always be restarted from the top.
pub struct RemoteSync<'a> {
    repository: &'a Repository,
    config: &'a ReleaseConfig,
    transport: &'a dyn Transport,
}

impl<'a> RemoteSync<'a> {
    pub fn new(
        repository: &'a Repository,
        config: &'a ReleaseConfig,
        transport: &'a dyn Transport,
    ) -> Self {
        RemoteSync {
            repository,
            config,
            transport,
        }
    }

    /// Push the deployment branch to the remote repository, initializing it
    /// on first use.
    ///
    /// The remote repository is created with `git init` (optionally bare) if
    /// its path does not exist yet; a path that exists but is not a directory
    /// aborts rather than being clobbered. Non-bare remotes get
    /// `receive.denyCurrentBranch ignore` so the push can update the branch
    /// the checkout is on; the checkout itself is only moved by `switch`.
    pub fn push_release_branch(&self) -> anyhow::Result<()> {
        self.ensure_remote_repository()?;
        self.ensure_remote_registered()?;

        let deployment_branch = refs::deployment_branch_name(self.config.branch());
        let remote_name = self.config.deployment_remote_name();

        self.transport
            .run_local(
                self.repository.path(),
                &["git", "push", &remote_name, deployment_branch.as_ref()],
            )?
            .expect_success("pushing the deployment branch")?;

        Ok(())
    }

    /// Push both the source and the deployment branch to `remote`. A no-op
    /// when that remote is not registered, so repositories without an
    /// upstream deploy the same way.
    pub fn push_upstream(&self, remote: &str) -> anyhow::Result<()> {
        let probe = self.transport.run_local(
            self.repository.path(),
            &["git", "remote", "get-url", remote],
        )?;
        if !probe.success {
            return Ok(());
        }

        let deployment_branch = refs::deployment_branch_name(self.config.branch());
        self.transport
            .run_local(
                self.repository.path(),
                &[
                    "git",
                    "push",
                    remote,
                    self.config.branch().as_ref(),
                    deployment_branch.as_ref(),
                ],
            )?
            .expect_success("pushing to the upstream remote")?;

        Ok(())
    }

    /// Fast-forward local branches from the configured pull remote. The
    /// source branch must advance cleanly; the deployment branch tolerates
    /// not existing upstream yet.
    ///
    /// The source branch is usually checked out in the local repository,
    /// which makes git refuse a plain fetch into it. The engine never reads
    /// the working tree, so a stale checkout is harmless and the fetch runs
    /// with `--update-head-ok`.
    pub fn pull(&self) -> anyhow::Result<()> {
        let Some(remote) = self.config.pull_remote() else {
            return Ok(());
        };

        let branch = self.config.branch();
        let refspec = format!("{branch}:{branch}");
        self.transport
            .run_local(
                self.repository.path(),
                &["git", "fetch", "--update-head-ok", remote, &refspec],
            )?
            .expect_success("fetching the source branch")?;

        let deployment_branch = refs::deployment_branch_name(branch);
        let upstream_ref = format!("refs/heads/{deployment_branch}");

        // the remote is known reachable after the fetch above, so an empty
        // listing here means the deployment branch does not exist upstream
        // yet (first deploy from this clone) and the fast-forward is
        // skipped; any other failure still surfaces
        let probe = self.transport.run_local(
            self.repository.path(),
            &["git", "ls-remote", "--exit-code", remote, &upstream_ref],
        )?;
        if probe.success {
            let refspec = format!("{deployment_branch}:{deployment_branch}");
            self.transport
                .run_local(
                    self.repository.path(),
                    &["git", "fetch", "--update-head-ok", remote, &refspec],
                )?
                .expect_success("fetching the deployment branch")?;
        }

        Ok(())
    }

    /// Repoint the remote checkout at a release commit.
    ///
    /// `target` defaults to the deployment branch tip. The dance is
    /// reset → detached checkout → reset: resetting first drops stray index
    /// state, checking out the commit hash moves HEAD without dragging the
    /// branch ref along prematurely, and the final hard reset materializes
    /// the working tree. Running it twice with the same target changes
    /// nothing.
    ///
    /// `update_to_remote` instead re-syncs the deployment branch from that
    /// remote's view before checking it out, used when another machine
    /// pushed a newer release.
    pub fn switch_remote_checkout(
        &self,
        target: Option<&str>,
        update_to_remote: Option<&str>,
    ) -> anyhow::Result<()> {
        let remote_path = self.config.remote_repository_path();
        let deployment_branch = refs::deployment_branch_name(self.config.branch());

        // a fresh checkout has no HEAD to reset yet
        self.transport
            .run_remote_in(remote_path, &["git", "reset", "--hard"])?;

        // the branch-resync path only applies when switching to the
        // deployment branch itself, not to an explicit historical commit
        let wants_branch = match target {
            None => true,
            Some(target) => target == deployment_branch.as_ref(),
        };

        if let Some(remote) = update_to_remote.filter(|_| wants_branch) {
            let head = self
                .transport
                .run_remote_in(remote_path, &["git", "rev-parse", "HEAD"])?
                .expect_success("resolving the remote checkout HEAD")?;
            let head = head.trimmed_stdout().to_string();

            // park HEAD on the commit so the branch ref can be moved
            self.transport
                .run_remote_in(remote_path, &["git", "checkout", &head])?
                .expect_success("detaching the remote checkout")?;

            let branch_ref = format!("refs/heads/{deployment_branch}");
            let remote_ref = format!("refs/remotes/{remote}/{deployment_branch}");
            self.transport
                .run_remote_in(
                    remote_path,
                    &["git", "update-ref", &branch_ref, &remote_ref],
                )?
                .expect_success("updating the deployment branch from the remote")?;

            self.transport
                .run_remote_in(remote_path, &["git", "checkout", deployment_branch.as_ref()])?
                .expect_success("checking out the deployment branch")?;
        } else {
            let target = target.unwrap_or(deployment_branch.as_ref());
            self.transport
                .run_remote_in(remote_path, &["git", "checkout", target])?
                .expect_success("checking out the release target")?;
        }

        self.transport
            .run_remote_in(remote_path, &["git", "reset", "--hard"])?
            .expect_success("resetting the remote working tree")?;

        Ok(())
    }

    /// Create the remote repository if its path does not hold one yet.
    fn ensure_remote_repository(&self) -> anyhow::Result<()> {
        let remote_path = self.config.remote_repository_path();

        if self.transport.path_exists(remote_path)? {
            if !self.transport.path_is_dir(remote_path)? {
                anyhow::bail!(ReleaseError::RemoteState {
                    path: remote_path.to_string(),
                    expected: "a directory",
                });
            }
        } else {
            self.transport
                .run_remote(&["mkdir", "-p", remote_path])?
                .expect_success("creating the remote repository directory")?;
        }

        // `git init` inside an existing repository is harmless
        let init: &[&str] = if self.config.bare_remote() {
            &["git", "init", "--bare"]
        } else {
            &["git", "init"]
        };
        self.transport
            .run_remote_in(remote_path, init)?
            .expect_success("initializing the remote repository")?;

        if !self.config.bare_remote() {
            self.transport
                .run_remote_in(
                    remote_path,
                    &["git", "config", "receive.denyCurrentBranch", "ignore"],
                )?
                .expect_success("configuring the remote repository")?;
        }

        Ok(())
    }

    /// Register (or re-register) the deployment remote in the local
    /// repository. An entry pointing at a stale URL is replaced.
    fn ensure_remote_registered(&self) -> anyhow::Result<()> {
        let remote_name = self.config.deployment_remote_name();
        let url = self.config.remote_url();

        let current = self.transport.run_local(
            self.repository.path(),
            &["git", "remote", "get-url", &remote_name],
        )?;

        if current.success {
            if current.trimmed_stdout() == url {
                return Ok(());
            }
            self.transport
                .run_local(
                    self.repository.path(),
                    &["git", "remote", "remove", &remote_name],
                )?
                .expect_success("removing the stale deployment remote")?;
        }

        self.transport
            .run_local(
                self.repository.path(),
                &["git", "remote", "add", &remote_name, &url],
            )?
            .expect_success("registering the deployment remote")?;

        Ok(())
    }
}
