use crate::areas::refs;
use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::filter::TreeRewrite;
use crate::artifacts::filter::tree_filter::TreeFilter;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::release::commit_factory::{self, CopyOptions};
use crate::artifacts::release::config::ReleaseConfig;
use crate::artifacts::remote::sync::RemoteSync;
use crate::artifacts::remote::transport::Transport;
use crate::errors::ReleaseError;

/// Stage a release cycle has reached. Stages advance strictly in this
/// order; calling a stage method out of order is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    ReleaseCommitCreated,
    Filtered,
    Written,
    Tagged,
    MergedBack,
}

/// An in-flight release cycle.
///
/// Holds the drafted release commit while it is still mutable (filtering
/// replaces its tree pointer) and remembers the source commit so the
/// merge-back can reuse the original, unfiltered tree.
#[derive(Debug)]
pub struct ReleaseCycle {
    source_oid: ObjectId,
    source: Commit,
    release: Commit,
    release_oid: Option<ObjectId>,
    state: CycleState,
}

impl ReleaseCycle {
    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn source_oid(&self) -> &ObjectId {
        &self.source_oid
    }

    pub fn release(&self) -> &Commit {
        &self.release
    }

    /// Id of the release commit, available once the cycle is written.
    pub fn release_oid(&self) -> Option<&ObjectId> {
        self.release_oid.as_ref()
    }

    fn expect(&self, allowed: &[CycleState], stage: &str) -> anyhow::Result<()> {
        if !allowed.contains(&self.state) {
            anyhow::bail!(
                "cannot {stage}: release cycle is in state {:?}",
                self.state
            );
        }
        Ok(())
    }
}

/// Result of a completed release cycle.
#[derive(Debug)]
pub struct ReleaseOutcome {
    pub release_oid: ObjectId,
    pub merge_oid: Option<ObjectId>,
    pub deployment_branch: BranchName,
}

/// Drives release cycles against one repository.
pub struct ReleaseOrchestrator<'a> {
    repository: &'a Repository,
    config: &'a ReleaseConfig,
    transport: &'a dyn Transport,
}

impl<'a> ReleaseOrchestrator<'a> {
    pub fn new(
        repository: &'a Repository,
        config: &'a ReleaseConfig,
        transport: &'a dyn Transport,
    ) -> Self {
        ReleaseOrchestrator {
            repository,
            config,
            transport,
        }
    }

    /// Fast-forward local branches from the pull remote, if one is
    /// configured.
    pub fn pull(&self) -> anyhow::Result<()> {
        self.remote_sync().pull()
    }

    /// Draft the release commit: a copy of the source branch tip with the
    /// current deployment branch tip as its sole parent (none on the first
    /// release). The commit is not stored yet.
    pub fn create_release_commit(&self) -> anyhow::Result<ReleaseCycle> {
        let branch = self.config.branch();
        let source_oid = self
            .repository
            .refs()
            .read_ref(branch)?
            .ok_or_else(|| ReleaseError::RefNotFound(branch.to_string()))?;
        let source = self.repository.database().load_commit(&source_oid)?;

        let deployment_branch = refs::deployment_branch_name(branch);
        let parents = match self.repository.refs().read_ref(&deployment_branch)? {
            Some(tip) => vec![tip],
            None => vec![],
        };

        let message = match self.config.message() {
            Some(message) => message.to_string(),
            None => format!(
                "release of {} ({}) to {} at {}",
                branch,
                source_oid.to_short_oid(),
                deployment_branch,
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S %z"),
            ),
        };

        let release = commit_factory::copy_commit(
            self.repository,
            &source,
            &CopyOptions {
                message: Some(message),
                parents,
                author: self.config.author().map(str::to_string),
            },
        )?;

        Ok(ReleaseCycle {
            source_oid,
            source,
            release,
            release_oid: None,
            state: CycleState::ReleaseCommitCreated,
        })
    }

    /// Rewrite the drafted release tree through `rewrite`. The source
    /// commit's own tree is untouched; only the draft's tree pointer moves.
    pub fn apply_filter(
        &self,
        cycle: &mut ReleaseCycle,
        rewrite: &dyn TreeRewrite,
    ) -> anyhow::Result<()> {
        cycle.expect(&[CycleState::ReleaseCommitCreated], "apply the filter")?;

        let mut filter = TreeFilter::new(self.repository.database(), cycle.release.tree_oid())?;
        rewrite.rewrite(&mut filter)?;
        let tree_oid = filter.save()?;

        cycle.release = cycle.release.clone().with_tree(tree_oid);
        cycle.state = CycleState::Filtered;
        Ok(())
    }

    /// Persist the release commit and advance the deployment branch to it.
    pub fn write(&self, cycle: &mut ReleaseCycle) -> anyhow::Result<ObjectId> {
        cycle.expect(
            &[CycleState::ReleaseCommitCreated, CycleState::Filtered],
            "write the release commit",
        )?;

        let database = self.repository.database();
        let release_oid = database.store(&cycle.release)?;
        if !database.contains(&release_oid) {
            anyhow::bail!(ReleaseError::WriteIntegrity(release_oid));
        }

        let deployment_branch = refs::deployment_branch_name(self.config.branch());
        self.repository
            .refs()
            .update_ref(&deployment_branch, &release_oid)?;

        cycle.release_oid = Some(release_oid.clone());
        cycle.state = CycleState::Written;
        Ok(release_oid)
    }

    /// Tag the just-written release commit.
    pub fn tag_release(&self, cycle: &mut ReleaseCycle, name: &str) -> anyhow::Result<()> {
        cycle.expect(&[CycleState::Written], "tag the release")?;

        let release_oid = cycle
            .release_oid
            .clone()
            .expect("written cycle has a release oid");
        self.repository.refs().create_tag(name, &release_oid)?;

        cycle.state = CycleState::Tagged;
        Ok(())
    }

    /// Tag the deployment branch tip outside a cycle. Fails with
    /// `RefNotFound` when no release has ever been written.
    pub fn tag(&self, name: &str) -> anyhow::Result<ObjectId> {
        let deployment_branch = refs::deployment_branch_name(self.config.branch());
        let release_oid = self
            .repository
            .refs()
            .read_ref(&deployment_branch)?
            .ok_or_else(|| ReleaseError::RefNotFound(deployment_branch.to_string()))?;

        self.repository.refs().create_tag(name, &release_oid)?;
        Ok(release_oid)
    }

    /// Record the release on the source branch: a merge commit with parents
    /// `[source, release]` that reuses the source commit's original,
    /// unfiltered tree. The source branch advances to it, so the next cycle
    /// sees this release in its history.
    pub fn merge_back(&self, cycle: &mut ReleaseCycle) -> anyhow::Result<ObjectId> {
        cycle.expect(
            &[CycleState::Written, CycleState::Tagged],
            "merge the release back",
        )?;

        let release_oid = cycle
            .release_oid
            .clone()
            .expect("written cycle has a release oid");

        let deployment_branch = refs::deployment_branch_name(self.config.branch());
        let merge = commit_factory::copy_commit(
            self.repository,
            &cycle.source,
            &CopyOptions {
                message: Some(format!(
                    "merge back of {} ({}) into {}",
                    deployment_branch,
                    release_oid.to_short_oid(),
                    self.config.branch(),
                )),
                parents: vec![cycle.source_oid.clone(), release_oid],
                author: self.config.author().map(str::to_string),
            },
        )?;

        let merge_oid = self.repository.database().store(&merge)?;
        self.repository
            .refs()
            .update_ref(self.config.branch(), &merge_oid)?;

        cycle.state = CycleState::MergedBack;
        Ok(merge_oid)
    }

    /// Run a full cycle: pull, draft, filter, write, tag, merge back.
    pub fn release(&self, rewrite: Option<&dyn TreeRewrite>) -> anyhow::Result<ReleaseOutcome> {
        self.pull()?;

        let mut cycle = self.create_release_commit()?;
        if let Some(rewrite) = rewrite {
            self.apply_filter(&mut cycle, rewrite)?;
        }
        let release_oid = self.write(&mut cycle)?;

        if let Some(tag) = self.config.tag() {
            self.tag_release(&mut cycle, tag)?;
        }

        let merge_oid = if self.config.merge_back() {
            Some(self.merge_back(&mut cycle)?)
        } else {
            None
        };

        Ok(ReleaseOutcome {
            release_oid,
            merge_oid,
            deployment_branch: refs::deployment_branch_name(self.config.branch()),
        })
    }

    /// Push the deployment branch to the remote repository.
    pub fn push(&self) -> anyhow::Result<()> {
        self.remote_sync().push_release_branch()
    }

    /// Push source and deployment branches to an upstream remote.
    pub fn push_upstream(&self, remote: &str) -> anyhow::Result<()> {
        self.remote_sync().push_upstream(remote)
    }

    /// Repoint the remote checkout, defaulting to the deployment branch tip.
    pub fn switch_release(
        &self,
        commit: Option<&str>,
        update_to_remote: Option<&str>,
    ) -> anyhow::Result<()> {
        self.remote_sync()
            .switch_remote_checkout(commit, update_to_remote)
    }

    fn remote_sync(&self) -> RemoteSync<'_> {
        RemoteSync::new(self.repository, self.config, self.transport)
    }
}
