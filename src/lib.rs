// src/lib.rs

pub mod cli;
pub mod compose;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod paths;
pub mod reload;
pub mod server;
pub mod tasks;
pub mod transform;
pub mod types;
pub mod watch;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::{CliArgs, TaskCommand};
use crate::config::{ConfigFile, load_or_default};
use crate::paths::PathTable;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the path table for the project directory
/// - config loading
/// - the composite or single task named on the command line
pub async fn run(args: CliArgs) -> Result<()> {
    let paths = PathTable::for_project(&args.project_dir);
    let config = load_or_default(args.config.as_deref(), paths.project_root())?;

    if args.dry_run {
        print_dry_run(&paths, &config, args.task);
        return Ok(());
    }

    match args.task {
        TaskCommand::WatchChanges => compose::watch_changes(paths, config).await?,
        TaskCommand::Build => {
            let report = compose::build(paths, config).await?;
            info!(tasks = report.succeeded.len(), "build complete");
        }
        other => {
            if let Some(kind) = other.single_task() {
                compose::run_task(kind, paths, config).await?;
                info!(task = %kind, "task complete");
            }
        }
    }
    Ok(())
}

/// Print the layout, stage graph and settings without running anything.
fn print_dry_run(paths: &PathTable, cfg: &ConfigFile, task: TaskCommand) {
    println!("sitepipe dry-run");
    println!("  project: {}", paths.project_root().display());
    println!("  output:  {}", paths.output_root().display());
    println!("  task:    {task:?}");
    println!();

    println!("layout:");
    for entry in paths.entries() {
        println!("  - {}", entry.class);
        println!("      sources: {:?}", entry.sources);
        if !entry.watch.is_empty() {
            println!("      watch: {:?}", entry.watch);
        }
        println!("      output: {}", entry.output.display());
    }
    println!("  - otf2ttf");
    println!("      sources: {:?}", paths.otf_sources());
    println!("      output: {}", paths.otf_output().display());
    println!();

    println!("stages ({}):", cfg.stages().len());
    for (name, after) in cfg.stages() {
        if after.is_empty() {
            println!("  - {name}");
        } else {
            println!("  - {name} (after {})", after.join(", "));
        }
    }
    println!();

    println!("settings:");
    println!("  config.triggered_while_running_behaviour = {:?}", cfg.behaviour);
    println!("  config.queue_length = {}", cfg.queue_length);
    println!("  server = {}:{}", cfg.server.host, cfg.server.port);
    println!("  css.browsers = {:?}", cfg.css.browsers);
    println!(
        "  images.webp_quality = {}, images.jpeg_quality = {}",
        cfg.images.webp_quality, cfg.images.jpeg_quality
    );
    println!("  js.bundle_cmd = {}", cfg.js.bundle_cmd);
    println!("  js.minify_cmd = {}", cfg.js.minify_cmd);
    println!("  fonts.otf2ttf_cmd = {}", cfg.fonts.otf2ttf_cmd);
    println!(
        "  watch.debounce_ms = {}, watch.use_hash = {}",
        cfg.watch.debounce_ms, cfg.watch.use_hash
    );

    debug!("dry-run complete (no execution)");
}
