use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use gitship::areas::repository::Repository;
use gitship::artifacts::branch::branch_name::BranchName;
use gitship::artifacts::filter::TreeRewrite;
use gitship::artifacts::filter::tree_filter::FilterOp;
use gitship::artifacts::objects::blob::Blob;
use gitship::artifacts::release::config::{ReleaseConfig, RemoteHost};
use gitship::artifacts::release::orchestrator::ReleaseOrchestrator;
use gitship::artifacts::remote::transport::LocalProcessTransport;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gitship",
    version = "0.1.0",
    about = "A git release engine",
    long_about = "gitship fabricates release commits directly in a git object store, \
    without a working directory, and deploys them by pushing a release branch \
    to a remote checkout.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[arg(long, global = true, default_value = ".", help = "Path to the local repository")]
    repo: PathBuf,

    #[arg(long, global = true, default_value = "main", help = "Source branch to release from")]
    branch: String,

    #[arg(long, global = true, help = "Path of the remote deployment repository")]
    remote_path: Option<String>,

    #[arg(long, global = true, help = "SSH user on the deployment host")]
    user: Option<String>,

    #[arg(long, global = true, help = "Deployment host; omit for a local path target")]
    host: Option<String>,

    #[arg(long, global = true, help = "SSH port on the deployment host")]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "release",
        about = "Create a release commit and advance the release branch",
        long_about = "This command runs a full release cycle: fetch, create the release \
        commit, filter its tree, write it, optionally tag it and merge it back \
        into the source branch."
    )]
    Release {
        #[arg(short, long, help = "The release commit message")]
        message: Option<String>,

        #[arg(long, help = "Tag to place on the release commit")]
        tag: Option<String>,

        #[arg(long, help = "Author override as 'Name <email>'")]
        author: Option<String>,

        #[arg(long, help = "Skip merging the release back into the source branch")]
        no_merge_back: bool,

        #[arg(long, help = "Remote to fetch from before releasing")]
        pull_remote: Option<String>,

        #[arg(long, help = "Remove a path from the release tree (repeatable)")]
        remove: Vec<String>,

        #[arg(long, value_names = ["PATH", "FILE"], num_args = 2, help = "Add a local file at a path in the release tree (repeatable)")]
        add: Vec<String>,
    },
    #[command(name = "pull", about = "Fast-forward local branches from a remote")]
    Pull {
        #[arg(index = 1, help = "The remote to fetch from")]
        remote: String,
    },
    #[command(
        name = "push",
        about = "Push the release branch to the deployment repository",
        long_about = "This command pushes the release branch to the deployment repository, \
        creating and configuring that repository on first use."
    )]
    Push {
        #[arg(long, help = "Initialize the deployment repository as bare")]
        bare: bool,

        #[arg(long, help = "Also push source and release branches to this upstream remote")]
        upstream: Option<String>,
    },
    #[command(
        name = "switch",
        about = "Repoint the deployment checkout at a release commit",
        long_about = "This command moves the deployment repository's working tree to a \
        release commit, defaulting to the tip of the release branch."
    )]
    Switch {
        #[arg(long, help = "Commit or ref to switch to instead of the release branch tip")]
        commit: Option<String>,

        #[arg(long, help = "Re-sync the release branch from this remote before switching")]
        update_to_remote: Option<String>,
    },
    #[command(name = "tag", about = "Tag the current release branch tip")]
    Tag {
        #[arg(index = 1, help = "The tag name")]
        name: String,
    },
    #[command(name = "tags", about = "List release tags")]
    Tags,
}

fn build_config(cli: &Cli) -> Result<ReleaseConfig> {
    let branch = BranchName::try_parse(cli.branch.clone())?;
    let mut config = ReleaseConfig::new(
        cli.repo.clone(),
        branch,
        cli.remote_path.clone().unwrap_or_default(),
    )?;

    if let (Some(user), Some(host)) = (&cli.user, &cli.host) {
        config = config.with_remote_host(RemoteHost {
            user: user.clone(),
            host: host.clone(),
            port: cli.port,
        });
    }

    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let repository = Repository::open(&cli.repo)?;
    let transport = LocalProcessTransport;

    match &cli.command {
        Commands::Release {
            message,
            tag,
            author,
            no_merge_back,
            pull_remote,
            remove,
            add,
        } => {
            let mut config = build_config(&cli)?.with_merge_back(!no_merge_back);
            if let Some(message) = message {
                config = config.with_message(message.clone());
            }
            if let Some(tag) = tag {
                config = config.with_tag(tag.clone());
            }
            if let Some(author) = author {
                config = config.with_author(author.clone());
            }
            if let Some(remote) = pull_remote {
                config = config.with_pull_remote(remote.clone());
            }

            let mut ops: Vec<FilterOp> = remove
                .iter()
                .map(|path| FilterOp::remove(path.clone()))
                .collect();
            for pair in add.chunks(2) {
                let content = std::fs::read(&pair[1])?;
                ops.push(FilterOp::add(pair[0].clone(), Blob::from_content(content)));
            }

            let orchestrator = ReleaseOrchestrator::new(&repository, &config, &transport);
            let rewrite = (!ops.is_empty()).then_some(&ops as &dyn TreeRewrite);
            let outcome = orchestrator.release(rewrite)?;

            println!(
                "{} {} at {}",
                "released".green(),
                outcome.deployment_branch,
                outcome.release_oid.to_short_oid()
            );
            if let Some(merge_oid) = &outcome.merge_oid {
                println!(
                    "{} {} at {}",
                    "merged back into".green(),
                    cli.branch,
                    merge_oid.to_short_oid()
                );
            }
        }
        Commands::Pull { remote } => {
            let config = build_config(&cli)?.with_pull_remote(remote.clone());
            ReleaseOrchestrator::new(&repository, &config, &transport).pull()?;
            println!("{} from {remote}", "pulled".green());
        }
        Commands::Push { bare, upstream } => {
            let config = build_config(&cli)?.with_bare_remote(*bare);
            let orchestrator = ReleaseOrchestrator::new(&repository, &config, &transport);
            orchestrator.push()?;
            if let Some(upstream) = upstream {
                orchestrator.push_upstream(upstream)?;
            }
            println!("{} to {}", "pushed".green(), config.remote_url());
        }
        Commands::Switch {
            commit,
            update_to_remote,
        } => {
            let config = build_config(&cli)?;
            ReleaseOrchestrator::new(&repository, &config, &transport)
                .switch_release(commit.as_deref(), update_to_remote.as_deref())?;
            println!("{}", "switched".green());
        }
        Commands::Tag { name } => {
            let config = build_config(&cli)?;
            let oid =
                ReleaseOrchestrator::new(&repository, &config, &transport).tag(name)?;
            println!("{} {name} at {}", "tagged".green(), oid.to_short_oid());
        }
        Commands::Tags => {
            for tag in repository.refs().list_tags()? {
                println!("{tag}");
            }
        }
    }

    Ok(())
}
