//! # sizetrack CLI
//!
//! Command-line entry point. Tracks compiled binary artifact sizes
//! across a repository's git history and renders them into an HTML
//! report.
//!
//! ## Commands
//!
//! - **generate** (default): update the recent-sizes ledger from the
//!   current tree and render the report
//! - **append**: record the current tree's sizes against HEAD
//! - **history**: rebuild and measure every unrecorded revision of the
//!   branch, then regenerate the report
//!
//! ## Environment Variables
//!
//! Every global option has a `SIZETRACK_*` fallback; see `--help`.

use std::io::IsTerminal;

use sizetrack::cli::Cli;

fn main() -> miette::Result<()> {
    // Install miette's fancy panic and error report handler
    miette::set_panic_hook();

    // Configure miette handler based on terminal capabilities
    if std::io::stderr().is_terminal() {
        miette::set_hook(Box::new(|_| {
            Box::new(
                miette::GraphicalReportHandler::new()
                    .with_theme(miette::GraphicalTheme::unicode_nocolor())
                    .with_context_lines(3),
            )
        }))?;
    } else {
        // Use a simpler handler for non-TTY environments (CI, logs, etc.)
        miette::set_hook(Box::new(|_| {
            Box::new(
                miette::GraphicalReportHandler::new()
                    .with_theme(miette::GraphicalTheme::none())
                    .with_context_lines(0),
            )
        }))?;
    }

    let cli = Cli::parse_args();
    sizetrack::commands::execute(&cli).map_err(Into::into)
}
