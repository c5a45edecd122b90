//! Upgrade a forked codebase to a new upstream release.
//!
//! Must be run against a checkout with a clean head. Starts a merge of the
//! target reference and auto-accepts the incoming version of every conflict in
//! a file the fork never touched; the rest is left for `git mergetool`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use upmerge::exit_codes;
use upmerge::io::config::{default_config_path, load_config};
use upmerge::io::git::Git;
use upmerge::logging;
use upmerge::upgrade::{UpgradeOptions, UpgradeRequest, run_upgrade};

#[derive(Parser, Debug)]
#[command(
    name = "upmerge",
    version,
    about = "Merge an upstream release into a fork, auto-accepting conflicts in files the fork never touched"
)]
struct Cli {
    /// Git remote where the upstream references are held.
    remote: String,
    /// Upstream reference (usually a tag) to upgrade from.
    from: String,
    /// Upstream reference (usually a tag) to upgrade to.
    to: String,
    /// Repository to operate on.
    #[arg(short = 'C', long, value_name = "PATH", default_value = ".")]
    repo: PathBuf,
    /// Config file. Defaults to `.upmerge.toml` in the repository.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Refuse to start unless the worktree is clean.
    #[arg(long)]
    require_clean: bool,
    /// Print the full upgrade report as JSON instead of the summary.
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit_codes::USAGE
            } else {
                exit_codes::OK
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    logging::init();
    if let Err(err) = run(cli) {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::FATAL);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(&cli.repo));
    let cfg = load_config(&config_path)?;
    debug!(?cfg, repo = %cli.repo.display(), "resolved configuration");

    let git = Git::new(&cli.repo)
        .binary(cfg.git_binary.clone())
        .timeout(cfg.command_timeout());
    let request = UpgradeRequest {
        remote: cli.remote,
        from: cli.from,
        to: cli.to,
    };
    let options = UpgradeOptions {
        require_clean: cli.require_clean || cfg.require_clean,
    };

    let report = run_upgrade(&git, &request, options)?;

    if cli.json {
        let payload = serde_json::to_string_pretty(&report).context("serialize report")?;
        println!("{payload}");
    } else {
        println!("{}", report.summary());
    }
    Ok(())
}
