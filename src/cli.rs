//! Command-line interface definitions for sizetrack.
//!
//! This module defines the CLI structure using clap: global options that
//! mirror the tool's file locations and git/build configuration, plus
//! the three subcommands. Running without a subcommand behaves like
//! `generate`.
//!
//! Every global option has a `SIZETRACK_*` environment fallback so CI
//! jobs can configure the tool without flag soup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

/// Main command-line interface for sizetrack.
#[derive(Parser)]
#[command(
    name = "sizetrack",
    bin_name = "sizetrack",
    author,
    version,
    about = "Track compiled binary artifact sizes across a repository's git history",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    global_opts: GlobalOpts,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Global options that apply to all sizetrack commands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Recent-sizes JSON file (input and output)
    #[arg(
        short = 's',
        long,
        global = true,
        default_value = "sizes/recent_sizes.json",
        env = "SIZETRACK_RECENT_SIZES"
    )]
    sizes: PathBuf,

    /// Git-sizes JSON file (input and output)
    #[arg(
        short = 'g',
        long,
        global = true,
        default_value = "sizes/git_sizes.json",
        env = "SIZETRACK_GIT_SIZES"
    )]
    git_sizes: PathBuf,

    /// Write HTML output to this file
    #[arg(
        short = 'o',
        long,
        global = true,
        default_value = "sizes/sizes.html",
        env = "SIZETRACK_OUTPUT"
    )]
    output: PathBuf,

    /// Read the HTML template from this file
    #[arg(
        short = 't',
        long,
        global = true,
        default_value = "sizes/sizes.template",
        env = "SIZETRACK_TEMPLATE"
    )]
    template: PathBuf,

    /// The git branch to walk (defaults to the current branch)
    #[arg(short = 'b', long, global = true, env = "SIZETRACK_BRANCH")]
    branch: Option<String>,

    /// The git remote the report links to
    #[arg(
        short = 'r',
        long,
        global = true,
        default_value = "origin",
        env = "SIZETRACK_REMOTE"
    )]
    remote: String,

    /// Compiler probed for the build-label version string
    #[arg(
        long,
        global = true,
        default_value = "avr-gcc",
        env = "SIZETRACK_COMPILER"
    )]
    compiler: String,

    /// Build-label override; skips the compiler probe
    #[arg(long, global = true, env = "SIZETRACK_LABEL")]
    label: Option<String>,

    /// From-scratch build command (whitespace-separated argv)
    #[arg(
        long,
        global = true,
        default_value = "make clean all",
        env = "SIZETRACK_BUILD_CMD"
    )]
    build_cmd: String,

    /// Best-effort clean command for the restore step
    #[arg(
        long,
        global = true,
        default_value = "make clean",
        env = "SIZETRACK_CLEAN_CMD"
    )]
    clean_cmd: String,

    /// Build-output subdirectory to scan for artifacts, in addition to
    /// the working directory
    #[arg(long, global = true, env = "SIZETRACK_BUILD_DIR")]
    build_dir: Option<PathBuf>,

    /// Artifact file extensions (comma-separated)
    #[arg(
        long,
        global = true,
        value_delimiter = ',',
        default_value = "bin",
        env = "SIZETRACK_ARTIFACT_EXT"
    )]
    artifact_ext: Vec<String>,

    /// Enable verbose output (use multiple times for more verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count, env = "SIZETRACK_VERBOSE")]
    verbose: u8,

    /// Silence all output except for errors
    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        env = "SIZETRACK_QUIET"
    )]
    quiet: bool,
}

impl GlobalOpts {
    /// Create a new builder for constructing `GlobalOpts`
    /// programmatically.
    pub fn builder() -> GlobalOptsBuilder {
        GlobalOptsBuilder::default()
    }

    pub fn sizes(&self) -> &Path {
        &self.sizes
    }

    pub fn git_sizes(&self) -> &Path {
        &self.git_sizes
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn template(&self) -> &Path {
        &self.template
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The build command as an argv vector.
    pub fn build_argv(&self) -> Vec<String> {
        split_argv(&self.build_cmd)
    }

    /// The restore-step clean command as an argv vector.
    pub fn clean_argv(&self) -> Vec<String> {
        split_argv(&self.clean_cmd)
    }

    pub fn build_dir(&self) -> Option<&Path> {
        self.build_dir.as_deref()
    }

    pub fn artifact_ext(&self) -> &[String] {
        &self.artifact_ext
    }

    pub fn verbose(&self) -> u8 {
        self.verbose
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }
}

fn split_argv(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

/// Builder for constructing `GlobalOpts` programmatically, without going
/// through command-line parsing. Useful for testing and library usage.
#[derive(Debug, Default)]
pub struct GlobalOptsBuilder {
    sizes: Option<PathBuf>,
    git_sizes: Option<PathBuf>,
    output: Option<PathBuf>,
    template: Option<PathBuf>,
    branch: Option<String>,
    remote: Option<String>,
    compiler: Option<String>,
    label: Option<String>,
    build_cmd: Option<String>,
    clean_cmd: Option<String>,
    build_dir: Option<PathBuf>,
    artifact_ext: Option<Vec<String>>,
    verbose: u8,
    quiet: bool,
}

impl GlobalOptsBuilder {
    pub fn sizes(mut self, path: impl Into<PathBuf>) -> Self {
        self.sizes = Some(path.into());
        self
    }

    pub fn git_sizes(mut self, path: impl Into<PathBuf>) -> Self {
        self.git_sizes = Some(path.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn template(mut self, path: impl Into<PathBuf>) -> Self {
        self.template = Some(path.into());
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = Some(remote.into());
        self
    }

    pub fn compiler(mut self, compiler: impl Into<String>) -> Self {
        self.compiler = Some(compiler.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn build_cmd(mut self, command: impl Into<String>) -> Self {
        self.build_cmd = Some(command.into());
        self
    }

    pub fn clean_cmd(mut self, command: impl Into<String>) -> Self {
        self.clean_cmd = Some(command.into());
        self
    }

    pub fn build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = Some(dir.into());
        self
    }

    pub fn artifact_ext(mut self, exts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.artifact_ext = Some(exts.into_iter().map(Into::into).collect());
        self
    }

    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn build(self) -> GlobalOpts {
        GlobalOpts {
            sizes: self
                .sizes
                .unwrap_or_else(|| PathBuf::from("sizes/recent_sizes.json")),
            git_sizes: self
                .git_sizes
                .unwrap_or_else(|| PathBuf::from("sizes/git_sizes.json")),
            output: self
                .output
                .unwrap_or_else(|| PathBuf::from("sizes/sizes.html")),
            template: self
                .template
                .unwrap_or_else(|| PathBuf::from("sizes/sizes.template")),
            branch: self.branch,
            remote: self.remote.unwrap_or_else(|| "origin".to_string()),
            compiler: self.compiler.unwrap_or_else(|| "avr-gcc".to_string()),
            label: self.label,
            build_cmd: self.build_cmd.unwrap_or_else(|| "make clean all".to_string()),
            clean_cmd: self.clean_cmd.unwrap_or_else(|| "make clean".to_string()),
            build_dir: self.build_dir,
            artifact_ext: self
                .artifact_ext
                .unwrap_or_else(|| vec!["bin".to_string()]),
            verbose: self.verbose,
            quiet: self.quiet,
        }
    }
}

impl Cli {
    /// Get the global options
    pub fn global_opts(&self) -> &GlobalOpts {
        &self.global_opts
    }

    /// The subcommand to run; `generate` when none was given.
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Generate)
    }

    /// Create a builder for programmatic construction
    pub fn builder() -> CliBuilder {
        CliBuilder::default()
    }

    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Builder for [`Cli`]
#[derive(Debug, Default)]
pub struct CliBuilder {
    global_opts: GlobalOptsBuilder,
    command: Option<Commands>,
}

impl CliBuilder {
    pub fn global_opts(mut self, builder: GlobalOptsBuilder) -> Self {
        self.global_opts = builder;
        self
    }

    pub fn command(mut self, command: Commands) -> Self {
        self.command = Some(command);
        self
    }

    pub fn build(self) -> Cli {
        Cli {
            global_opts: self.global_opts.build(),
            command: self.command,
        }
    }
}

/// Available sizetrack subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Update the recent-sizes ledger from the current tree and render
    /// the HTML report (the default)
    Generate,

    /// Record the current tree's artifact sizes against HEAD in the
    /// git-sizes ledger
    Append,

    /// Walk the branch history: rebuild every unrecorded revision,
    /// record its artifact sizes, then regenerate the report
    History,
}
