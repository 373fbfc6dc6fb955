//! motifpipe-setup - main entry point

use anyhow::{Context, Result};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use motifpipe_setup::cli::Cli;
use motifpipe_setup::pipeline::{self, BuildContext};
use motifpipe_setup::Layout;

/// Initialize logging: level, file and line; `RUST_LOG` overrides the default.
fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let layout = Layout::from_cli(cli).context("failed to resolve directory layout")?;
    debug!("layout: {:?}", layout);

    let ctx = pipeline::run(BuildContext::new(layout), cli.command)
        .with_context(|| format!("{:?} failed", cli.command))?;

    if cli.json {
        println!("{}", ctx.report.to_json().context("failed to render run report")?);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse_args();
    init_logger(cli.verbose);
    info!("motifpipe-setup {} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}
