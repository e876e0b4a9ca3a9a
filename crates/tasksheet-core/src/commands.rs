use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, anyhow};
use tracing::{debug, info, instrument};

use crate::cli::Command;
use crate::config::Config;
use crate::notify::{DEFAULT_NOTICE_MS, Notice};
use crate::render::{self, Renderer};
use crate::store::Store;
use crate::sync;

#[instrument(skip(store, cfg, renderer, command))]
pub fn dispatch(
    store: &Store,
    cfg: &Config,
    renderer: &mut Renderer,
    command: Command,
) -> anyhow::Result<()> {
    debug!(?command, "dispatching command");

    match command {
        Command::Add { title, status } => cmd_add(store, cfg, renderer, &title, status.as_deref()),
        Command::Remove { id } => cmd_remove(store, renderer, id),
        Command::List => cmd_list(store, renderer),
        Command::Export { out } => cmd_export(store, out),
        Command::Show => cmd_show(cfg),
    }
}

#[instrument(skip(store, cfg, renderer, title, status))]
fn cmd_add(
    store: &Store,
    cfg: &Config,
    renderer: &mut Renderer,
    title: &str,
    status: Option<&str>,
) -> anyhow::Result<()> {
    info!("command add");

    let status = match status {
        Some(status) => status.to_string(),
        None => cfg.default_status(),
    };

    let allowed = cfg.status_values();
    if !allowed.iter().any(|value| value == &status) {
        return Err(anyhow!(
            "invalid status {status:?}; expected one of: {}",
            allowed.join(", ")
        ));
    }

    let tasks = store.load()?;
    let (tasks, task) = store.add(tasks, title, &status)?;

    println!("Created task {}.", task.id);
    renderer.print_task_table(&tasks)?;

    // Local state is already saved and rendered; the mirror is
    // strictly best-effort from here on.
    if let Some(adapter) = sync::from_config(cfg)? {
        let outcome = adapter.notify_created(&task);
        info!(?outcome, "sync attempt finished");

        let mut notice = Notice::new(notice_delay(cfg)?);
        notice.show(outcome.notice_text());
        if let Some(text) = notice.visible_at(Instant::now()) {
            println!("{text}");
        }
    }

    Ok(())
}

#[instrument(skip(store, renderer))]
fn cmd_remove(store: &Store, renderer: &mut Renderer, id: i64) -> anyhow::Result<()> {
    info!("command remove");

    let tasks = store.load()?;
    let tasks = store.remove(tasks, id)?;

    println!("Removed task {id}.");
    renderer.print_task_table(&tasks)?;
    Ok(())
}

#[instrument(skip(store, renderer))]
fn cmd_list(store: &Store, renderer: &mut Renderer) -> anyhow::Result<()> {
    info!("command list");

    let tasks = store.load()?;
    renderer.print_task_table(&tasks)?;
    Ok(())
}

#[instrument(skip(store, out))]
fn cmd_export(store: &Store, out: Option<PathBuf>) -> anyhow::Result<()> {
    info!("command export");

    let tasks = store.load()?;
    let html = render::render_page(&tasks);

    match out {
        Some(path) => {
            fs::write(&path, html)
                .with_context(|| format!("failed writing {}", path.display()))?;
            println!("Wrote {}.", path.display());
        }
        None => print!("{html}"),
    }
    Ok(())
}

#[instrument(skip(cfg))]
fn cmd_show(cfg: &Config) -> anyhow::Result<()> {
    let mut entries: Vec<(String, String)> = cfg
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    entries.sort();

    for (key, value) in entries {
        println!("{key}={value}");
    }
    Ok(())
}

fn notice_delay(cfg: &Config) -> anyhow::Result<Duration> {
    Ok(Duration::from_millis(
        cfg.get_u64("notice.delay.ms")?.unwrap_or(DEFAULT_NOTICE_MS),
    ))
}
