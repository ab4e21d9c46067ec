//! Implementation of sizetrack subcommands.
//!
//! Thin orchestration over the library modules: resolve paths against
//! the working directory, obtain the build-label, then run the
//! requested operation.

use std::path::{Path, PathBuf};

use crate::cli::{Cli, Commands};
use crate::error::{Result, SizeError};
use crate::git;
use crate::ledger::{self, ArtifactSizes, HistoryOptions};
use crate::logging::Logger;
use crate::persist;
use crate::report::{self, ReportInputs};
use crate::scan::Scanner;
use crate::toolchain;

/// Execute commands based on the parsed CLI arguments.
pub fn execute(cli: &Cli) -> Result<()> {
    execute_with_dir(cli, None)
}

/// Execute commands with an explicit working directory.
///
/// Relative file options (ledgers, template, output) resolve against the
/// working directory, so callers don't have to chdir.
pub fn execute_with_dir(cli: &Cli, working_dir: Option<&Path>) -> Result<()> {
    let opts = cli.global_opts();
    let logger = Logger::new(opts.verbose(), opts.quiet());

    let dir = match working_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().map_err(|source| SizeError::IoError {
            path: PathBuf::from("."),
            source,
        })?,
    };

    let scanner = Scanner::new(&dir)
        .artifact_exts(opts.artifact_ext().iter().cloned())
        .build_subdir(opts.build_dir());

    let label = match opts.label() {
        Some(label) => label.to_string(),
        None => toolchain::compiler_version(&dir, opts.compiler())?,
    };
    logger.verbose(1, format!("build-label: {label}"));

    let ctx = Context {
        dir: &dir,
        scanner: &scanner,
        logger: &logger,
        label: &label,
        sizes_path: resolve(&dir, opts.sizes()),
        git_sizes_path: resolve(&dir, opts.git_sizes()),
        template_path: resolve(&dir, opts.template()),
        output_path: resolve(&dir, opts.output()),
    };

    match cli.command() {
        Commands::Generate => generate(cli, &ctx),
        Commands::Append => append(&ctx),
        Commands::History => history(cli, &ctx),
    }
}

struct Context<'a> {
    dir: &'a Path,
    scanner: &'a Scanner,
    logger: &'a Logger,
    label: &'a str,
    sizes_path: PathBuf,
    git_sizes_path: PathBuf,
    template_path: PathBuf,
    output_path: PathBuf,
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Update the recent-sizes ledger from the current tree and render the
/// report.
fn generate(cli: &Cli, ctx: &Context<'_>) -> Result<()> {
    let recent = update_recent(ctx)?;

    let git_sizes = persist::load_history(&ctx.git_sizes_path)?;
    let remote = git::remote_url(ctx.dir, cli.global_opts().remote())?;
    let remote = git::browse_url(&remote)?;

    report::generate(
        ReportInputs {
            git_sizes: &git_sizes,
            recent_sizes: &recent,
            compiler_version: ctx.label,
            remote_url: &remote,
        },
        &ctx.template_path,
        &ctx.output_path,
    )?;

    ctx.logger
        .verbose(1, format!("report written to {}", ctx.output_path.display()));
    Ok(())
}

/// Record the current tree's artifact sizes against HEAD, unless HEAD is
/// already in the ledger.
fn append(ctx: &Context<'_>) -> Result<()> {
    let mut git_sizes = persist::load_history(&ctx.git_sizes_path)?;

    let mut sizes = ArtifactSizes::new();
    for artifact in ctx.scanner.bin_files()? {
        sizes.insert(artifact.name, artifact.size);
    }

    let Some(info) = git::commit_log(ctx.dir, Some(1))?.into_iter().next() else {
        return Err(SizeError::BranchNotFound);
    };

    let hash = info.hash.clone();
    if git_sizes.append(ctx.label, sizes, info) {
        ctx.logger.verbose(1, format!("{hash} appended"));
    } else {
        ctx.logger.info(format!("{hash} already recorded"));
    }

    git_sizes.sort_by_date();
    persist::save_history(&git_sizes, &ctx.git_sizes_path)
}

/// Walk the branch history, persist the updated git-sizes ledger, then
/// refresh the recent ledger and the report.
fn history(cli: &Cli, ctx: &Context<'_>) -> Result<()> {
    let opts = cli.global_opts();
    let history_opts = HistoryOptions::new(ctx.label)
        .branch(opts.branch())
        .build(opts.build_argv())
        .restore(opts.clean_argv());

    let git_sizes = ledger::update_history(ctx.scanner, &history_opts, ctx.logger, &ctx.git_sizes_path)?;
    persist::save_history(&git_sizes, &ctx.git_sizes_path)?;

    generate(cli, ctx)
}

fn update_recent(ctx: &Context<'_>) -> Result<ledger::RecentLedger> {
    let mut recent = persist::load_recent(&ctx.sizes_path)?;
    let artifacts = ctx.scanner.bin_files()?;
    if recent.update(ctx.label, &artifacts) {
        ctx.logger
            .verbose(1, format!("recent sizes advanced to index {}", recent.counter));
    }
    persist::save_recent(&recent, &ctx.sizes_path)?;
    Ok(recent)
}
