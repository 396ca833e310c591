//! =============================================================================
//! xpick - Application principale
//! xpick - Main application
//! =============================================================================
//!
//! Cette application capture le pointeur et affiche la couleur sous le curseur
//! au moment du clic.
//!
//! This application grabs the pointer and prints the color under the cursor
//! when the mouse is clicked.
//!
//! # Contrôles / Controls
//! - Clic gauche / Left click: Affiche la couleur / Print the color
//! - Clic droit / Right click: Quitter / Exit
//! - `-m`: Continue après chaque clic / Keep picking after each click

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use xpick_lib::cli::Cli;
use xpick_lib::picker;

// =============================================================================
// LOGGING
// =============================================================================

/// Initialize logging based on CLI verbosity settings.
///
/// Logs go to stderr; stdout only carries picked colors.
fn initialize_logging(verbose: bool) {
    use tracing_subscriber::filter::Directive;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if verbose { "debug" } else { "warn" };
    let mut filter = EnvFilter::from_default_env();
    for target in ["xpick", "xpick_lib"] {
        if let Ok(directive) = format!("{target}={level}").parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init();
}

// =============================================================================
// POINT D'ENTRÉE
// ENTRY POINT
// =============================================================================

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help goes to stdout with status 0, usage errors to stderr with 1
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if cli.version {
        println!("{}", Cli::version_string());
        return ExitCode::SUCCESS;
    }

    initialize_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("xpick: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let picked = picker::run(cli.config(), &mut out).context("color picking failed")?;
    debug!(picked, "done");
    Ok(())
}
