pub mod cli;
pub mod commands;
pub mod config;
pub mod notify;
pub mod render;
pub mod store;
pub mod sync;
pub mod task;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);
    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting tasksheet CLI"
    );

    let mut cfg = config::Config::load(cli.rcfile.as_deref())?;
    cfg.apply_overrides(cli.rc_overrides.into_iter().map(|kv| (kv.key, kv.value)));

    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;

    let store = store::Store::open(&data_dir)
        .with_context(|| format!("failed to open store at {}", data_dir.display()))?;

    let mut renderer = render::Renderer::new(&cfg);

    let command = cli.command.unwrap_or(cli::Command::List);
    debug!(?command, "resolved command");

    commands::dispatch(&store, &cfg, &mut renderer, command)?;

    info!("done");
    Ok(())
}
