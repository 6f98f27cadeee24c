mod cli;
mod config;
mod progress;
mod serial;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use espfs_lib::progress::no_op_progress_callback;
use espfs_lib::{DownloadParams, DownloadReport, EntryKind, FlashRegion, FsDownloader};
use std::process;

use crate::cli::{Cli, Commands, merge_config};
use crate::config::EspFsConfig;
use crate::progress::create_progress_callback;

fn print_region(region: &FlashRegion) {
    println!("{}", region);
    println!(
        "Block count {} ({} bytes per block)",
        region.block_count(),
        region.block_size()
    );
}

fn display_fs(report: &DownloadReport) {
    println!("Extracted files from filesystem image:");
    println!();
    for entry in &report.entries {
        match entry.kind {
            EntryKind::Dir => println!("  [DIR]  {}/", entry.path.display()),
            EntryKind::File { size } => {
                println!("  [FILE] {} ({} bytes)", entry.path.display(), size)
            }
        }
    }
    println!(
        "\nExtracted {} file(s) from filesystem into {}.",
        report.file_count(),
        report.unpack_dir.display()
    );
}

fn run(args: Cli) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            let config = EspFsConfig::from_file(path)
                .map_err(|e| anyhow!("Failed to load config file '{}': {}", path, e))?;
            config
                .validate()
                .map_err(|e| anyhow!("Invalid config file '{}': {}", path, e))?;
            Some(config)
        }
        None => None,
    };

    let settings = merge_config(&args, config)?;
    let source = settings.region_source()?;

    // The linker script path never touches the device when only resolving
    let port = if settings.needs_device(&args.command) {
        serial::resolve_port(settings.port.as_deref())?
    } else {
        settings.port.clone().unwrap_or_default()
    };

    let progress = if settings.quiet {
        no_op_progress_callback()
    } else {
        create_progress_callback()
    };
    let mut downloader = FsDownloader::with_progress(
        settings.esptool_reader(port),
        settings.extractor(),
        progress,
    );

    match args.command {
        Commands::Resolve => {
            let region = downloader
                .resolve(&source)
                .context("Failed to resolve the filesystem region")?;
            print_region(&region);
        }
        Commands::Download => {
            let params = DownloadParams {
                build_dir: settings.build_dir.clone(),
                unpack_dir: settings.unpack_dir.clone(),
            };
            let report = downloader
                .run(&source, &params)
                .context("Failed to download the filesystem")?;
            println!();
            display_fs(&report);
        }
    }

    Ok(())
}

fn main() {
    // Log level can be controlled by setting the RUST_LOG environment variable, e.g.:
    // RUST_LOG=debug, RUST_LOG=espfs_lib=trace, RUST_LOG=info
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    let args = Cli::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
