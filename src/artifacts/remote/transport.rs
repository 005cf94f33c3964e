use anyhow::Context;
use std::path::Path;
use std::process::Command;

/// Result of a transport command.
///
/// Failures are data, not errors: some git invocations are expected to fail
/// (probing a remote that is not registered yet, resetting a checkout that
/// has no HEAD) and the caller decides which ones matter.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl CommandOutput {
    /// Turn a failed command into an error, with its stderr attached.
    pub fn expect_success(self, description: &str) -> anyhow::Result<Self> {
        if !self.success {
            anyhow::bail!("{description} failed: {}", self.stderr.trim());
        }
        Ok(self)
    }

    pub fn trimmed_stdout(&self) -> &str {
        self.stdout.trim()
    }
}

/// Command execution seam between the engine and the machines it touches.
///
/// The engine never shells out directly; everything goes through this trait
/// so tests can run against a local process transport (or a recording fake)
/// and deployments can route the remote side over SSH.
pub trait Transport {
    /// Run a command on the local machine, in the given working directory.
    fn run_local(&self, cwd: &Path, argv: &[&str]) -> anyhow::Result<CommandOutput>;

    /// Run a command on the deployment host.
    fn run_remote(&self, argv: &[&str]) -> anyhow::Result<CommandOutput>;

    /// Run a command on the deployment host, in the given directory.
    fn run_remote_in(&self, dir: &str, argv: &[&str]) -> anyhow::Result<CommandOutput>;

    fn path_exists(&self, path: &str) -> anyhow::Result<bool>;

    fn path_is_dir(&self, path: &str) -> anyhow::Result<bool>;
}

/// Transport where the "remote" side is this same machine. Covers local
/// deployment targets and tests; an SSH-backed implementation has the same
/// shape with `run_remote` wrapping the argv in an ssh invocation.
#[derive(Debug, Default)]
pub struct LocalProcessTransport;

impl LocalProcessTransport {
    fn run(cwd: Option<&Path>, argv: &[&str]) -> anyhow::Result<CommandOutput> {
        let (program, args) = argv
            .split_first()
            .context("transport invoked with an empty argv")?;

        let mut command = Command::new(program);
        command.args(args);
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }

        let output = command
            .output()
            .with_context(|| format!("failed to spawn '{}'", argv.join(" ")))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        })
    }
}

impl Transport for LocalProcessTransport {
    fn run_local(&self, cwd: &Path, argv: &[&str]) -> anyhow::Result<CommandOutput> {
        Self::run(Some(cwd), argv)
    }

    fn run_remote(&self, argv: &[&str]) -> anyhow::Result<CommandOutput> {
        Self::run(None, argv)
    }

    fn run_remote_in(&self, dir: &str, argv: &[&str]) -> anyhow::Result<CommandOutput> {
        Self::run(Some(Path::new(dir)), argv)
    }

    fn path_exists(&self, path: &str) -> anyhow::Result<bool> {
        Ok(Path::new(path).exists())
    }

    fn path_is_dir(&self, path: &str) -> anyhow::Result<bool> {
        Ok(Path::new(path).is_dir())
    }
}
