//! TileMirror CLI
//!
//! Reconciles a local tile repository against an HTTP source, fetches what
//! is missing or stale and writes the run manifest.

mod args;
mod error;
mod progress;

use std::process;

use clap::Parser;
use console::style;
use tilemirror::config::{ConfigFile, MirrorConfig};
use tilemirror::job::{MirrorJob, RunSummary};
use tilemirror::logging;
use tilemirror::tile::{load_tiles, shard, TileSource};
use tracing::error;

use args::{Cli, Shard};
use error::CliError;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("{} {}", style("Error:").red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let file: ConfigFile = cli.load_config_file()?;
    let log_file = cli.log_file(&file);
    let bar = progress::bar();
    let _log_guard = logging::init_with_console(
        &cli.log_level(&file.logging.level),
        log_file.as_deref(),
        progress::BarWriter::new(bar.clone()),
    )?;

    let config = cli.mirror_config(&file)?;
    let source = cli.tile_source();

    let mut tiles = load_tiles(&source);
    if let Some(s) = cli.shard {
        tiles = shard(&tiles, s.index, s.count);
    }

    print_banner(&config, &source, cli.shard, tiles.len());

    if tiles.is_empty() {
        config.validate()?;
        println!("no tiles specified");
        return Ok(());
    }

    progress::start(&bar, tiles.len());
    let result = MirrorJob::new(config).run(&tiles, Some(progress::callback(bar.clone())));
    bar.finish_and_clear();

    print_summary(&result?);
    Ok(())
}

fn print_banner(config: &MirrorConfig, source: &TileSource, shard: Option<Shard>, tiles: usize) {
    println!(
        "{} {}",
        style("TileMirror").bold(),
        style(tilemirror::VERSION).dim()
    );
    println!("  Local repository: {}", config.local_dir.display());
    println!("  Output directory: {}", config.output_dir.display());
    println!("  Base URL:         {}", config.base_url);
    println!(
        "  Suffix:           {}",
        config.suffix.as_deref().unwrap_or("(none)")
    );
    println!("  Workers:          {}", config.workers);
    println!("  Copy local:       {}", config.copy_local);
    println!("  Tag:              {}", style(&config.tag).cyan());
    match source {
        TileSource::Builtin => println!("  Tiles:            {} (built-in catalogue)", tiles),
        TileSource::File(path) => println!("  Tiles:            {} ({})", tiles, path.display()),
    }
    if let Some(shard) = shard {
        println!("  Shard:            {}", shard);
    }
    println!();
}

fn print_summary(summary: &RunSummary) {
    println!("{}", style("Run complete").green().bold());
    println!("  Downloaded:        {}", summary.downloaded);
    println!("  Download failures: {}", summary.download_failures);
    println!("  Copied:            {}", summary.copied);
    println!("  Copy failures:     {}", summary.copy_failures);
    println!("  Skipped:           {}", summary.skipped);
    if summary.probe_failures > 0 {
        println!(
            "  {} {} tiles could not be checked remotely",
            style("!").yellow(),
            summary.probe_failures
        );
    }
    if !summary.unprocessed.is_empty() {
        println!(
            "  {} {} tiles were not processed",
            style("!").red(),
            summary.unprocessed.len()
        );
    }
    if let Some(paths) = &summary.manifest {
        println!("  Manifest:          {}", paths.snapshot.display());
    }
    println!("Time elapsed: {:.3} s", summary.elapsed.as_secs_f64());
}
