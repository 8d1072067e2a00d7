//! Command-line front end for workspace documents and geometry files.
//!
//! Usage:
//!   pulto ping
//!   pulto inspect session.ipynb
//!   pulto geometry scan.ply
//!   pulto bundle a.obj b.stl --out session.ipynb
//!   pulto load session.ipynb

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use pulto_core::document::{deserialize, read_export_summary, SequentialIds};
use pulto_core::logging::LoggingOptions;
use pulto_core::{
    default_log_level, import_geometry, init_logging_with, ImportService, LoadMode,
    SharedWorkspace, WorkspaceConfig,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pulto")]
#[command(about = "Inspect and assemble spatial workspace documents")]
struct Cli {
    /// Write rolling logs into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    /// trace, debug, info, warn or error
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// JSON workspace config; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the core library is linked
    Ping,
    /// Print the export summary and decode results of a document
    Inspect { document: PathBuf },
    /// Decode one geometry file and print mesh statistics
    Geometry { file: PathBuf },
    /// Import files into a fresh workspace and save it as a document
    Bundle {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Restore a document into an empty workspace and report the outcome
    Load { document: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        let dir = absolute(dir)?;
        let options = LoggingOptions {
            mirror_warnings_to_stderr: true,
        };
        init_logging_with(level, &dir, options).context("failed to start logging")?;
    }
    let config = match &cli.config {
        Some(path) => WorkspaceConfig::load(path)?,
        None => WorkspaceConfig::default(),
    };

    match cli.command {
        Commands::Ping => {
            println!("pulto_core ping={}", pulto_core::ping());
            println!("pulto_core version={}", pulto_core::core_version());
            Ok(())
        }
        Commands::Inspect { document } => inspect(&document),
        Commands::Geometry { file } => geometry(&file),
        Commands::Bundle { files, out } => bundle(config, &files, &out),
        Commands::Load { document } => load(config, &document),
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("cannot resolve working directory")?;
    Ok(cwd.join(path))
}

fn inspect(document: &Path) -> Result<()> {
    let bytes = std::fs::read(document)
        .with_context(|| format!("cannot read `{}`", document.display()))?;
    let summary = read_export_summary(&bytes)?;
    if summary.is_null() {
        println!("no export summary");
    } else {
        println!("{summary}");
    }

    let decoded = deserialize(&bytes, &mut SequentialIds::default())?;
    println!(
        "cells: {} restorable, {} failed, {} skipped",
        decoded.windows.len(),
        decoded.errors.len(),
        decoded.skipped_cells
    );
    for window in &decoded.windows {
        println!(
            "  {} at ({}, {}, {}) {}x{} tags=[{}]",
            window.title(),
            window.placement.x,
            window.placement.y,
            window.placement.z,
            window.placement.width,
            window.placement.height,
            window.tags.join(", ")
        );
    }
    for error in &decoded.errors {
        println!("  {error}");
    }
    Ok(())
}

fn geometry(file: &Path) -> Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("cannot read `{}`", file.display()))?;
    let extension = file
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    let imported = import_geometry(&bytes, extension)?;
    let mesh = &imported.mesh;
    println!(
        "format={} placeholder={}",
        imported.format.extension(),
        imported.placeholder
    );
    println!(
        "vertices={} faces={} triangles={} materials={}",
        mesh.vertex_count(),
        mesh.face_count(),
        mesh.triangle_count(),
        mesh.materials.len()
    );
    if let Some(bounds) = mesh.bounds() {
        let size = bounds.size();
        println!("size={:.3} x {:.3} x {:.3}", size.x, size.y, size.z);
    }
    Ok(())
}

fn bundle(config: WorkspaceConfig, files: &[PathBuf], out: &Path) -> Result<()> {
    let service = ImportService::new(SharedWorkspace::from_config(&config), config);
    let outcomes = service.import_files(files);
    for outcome in &outcomes {
        match &outcome.result {
            Ok(record) => println!("imported {} as {}", outcome.path.display(), record.title()),
            Err(err) => eprintln!("skipped {}: {err}", outcome.path.display()),
        }
    }
    let written = service.save_workspace(out)?;
    info!(
        "event=cli_bundle module=cli status=ok windows={} out={}",
        written,
        out.display()
    );
    println!("wrote {} windows to {}", written, out.display());
    Ok(())
}

fn load(config: WorkspaceConfig, document: &Path) -> Result<()> {
    let service = ImportService::new(SharedWorkspace::from_config(&config), config);
    let summary = service.load_workspace(document, LoadMode::Replace)?;
    println!("{}", summary.message());
    for error in &summary.errors {
        println!("  {error}");
    }
    Ok(())
}
