use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use obbkit_core::{AssetSource, ByteSource, FileSource, Progress, Result, RewriteJob};

mod args;
mod config;

use args::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Extract {
            input,
            bundle,
            output,
            delete_source,
        } => extract(&input, bundle, &output, delete_source),
        Commands::Stage {
            input,
            bundle,
            output,
        } => stage(&input, bundle, &output),
        Commands::List { input } => list(&input),
        Commands::Rewrite {
            archive,
            password,
            entry,
            content,
            server_url,
            scratch,
            config,
        } => rewrite(archive, password, entry, content, server_url, scratch, config),
    }
}

fn resolve_source(input: &str, bundle: Option<PathBuf>) -> Box<dyn ByteSource> {
    match bundle {
        Some(dir) => Box::new(AssetSource::new(dir, input)),
        None => Box::new(FileSource::new(input)),
    }
}

/// Determinate byte bar when the total is known, spinner otherwise.
fn progress_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(total) => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} {msg}")
                    .unwrap()
                    .progress_chars("=>-"),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner} {bytes} {msg}")
                    .unwrap(),
            );
            pb
        }
    }
}

fn extract(input: &str, bundle: Option<PathBuf>, output: &Path, delete_source: bool) -> Result<()> {
    let source = resolve_source(input, bundle);
    info!("Found source: {}", source.identity());

    let total = source.length();
    let stream = source.open()?;

    info!("Extracting to '{}'...", output.display());
    let pb = progress_bar(total);
    obbkit_core::extract_stream(stream, total, output, |p: Progress| {
        pb.set_position(p.bytes);
    })?;
    pb.finish_with_message("Extraction complete");
    info!("Extraction complete: {}", output.display());

    if delete_source {
        if source.try_delete() {
            info!("Original archive deleted.");
        } else {
            warn!("Original archive could not be deleted (read-only asset or permission).");
        }
    }
    Ok(())
}

fn stage(input: &str, bundle: Option<PathBuf>, output: &Path) -> Result<()> {
    let source = resolve_source(input, bundle);
    info!("Staging {} to '{}'...", source.identity(), output.display());

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let pb = progress_bar(source.length());
    let copied = obbkit_core::copy_with_progress(source.as_ref(), output, |p: Progress| {
        pb.set_position(p.bytes);
    })?;
    pb.finish_with_message("Copy complete");
    info!("Staged {} bytes to {}", copied, output.display());
    Ok(())
}

fn list(input: &Path) -> Result<()> {
    let entries = obbkit_core::list_entries(input)?;

    println!("{:<10} | {:<3} | {:<3} | Path", "Size", "Dir", "Enc");
    println!("{:-<10}-+-{:-<3}-+-{:-<3}-+-{:-<20}", "", "", "", "");
    for entry in &entries {
        println!(
            "{:<10} | {:<3} | {:<3} | {}",
            entry.size,
            if entry.is_dir { "yes" } else { "" },
            if entry.encrypted { "yes" } else { "" },
            entry.path
        );
    }
    println!("{} entries", entries.len());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn rewrite(
    archive: Option<PathBuf>,
    password: Option<String>,
    entry: Option<String>,
    content: Option<PathBuf>,
    server_url: Option<String>,
    scratch: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut cfg = match config_path {
        Some(path) => config::parse_config(&path)?,
        None => config::RewriteConfig::default(),
    };

    // Flags take precedence over job-file values.
    cfg.archive = archive.or(cfg.archive);
    cfg.password = password.or(cfg.password);
    cfg.entry = entry.or(cfg.entry);
    cfg.content_file = content.or(cfg.content_file);
    cfg.server_url = server_url.or(cfg.server_url);
    cfg.scratch = scratch.or(cfg.scratch);

    let archive_path = cfg.archive.ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "No archive path specified")
    })?;
    let password = cfg.password.ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "No password specified")
    })?;
    let entry_name = cfg.entry.unwrap_or_else(|| "setting.cfg".to_string());

    let entry_content = match (&cfg.content_file, &cfg.server_url) {
        (Some(path), _) => fs::read(path)?,
        (None, Some(url)) => config::render_settings(url).into_bytes(),
        (None, None) => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "No replacement content: pass --content or --server-url",
            )
            .into());
        }
    };

    let scratch_dir = cfg
        .scratch
        .unwrap_or_else(|| std::env::temp_dir().join("obbkit-rewrite"));

    info!(
        "Rewriting entry '{}' in {}...",
        entry_name,
        archive_path.display()
    );

    let job = RewriteJob {
        archive_path,
        password,
        scratch_dir,
        entry_name,
        entry_content,
    };
    job.run()?;

    info!("Rewrite complete: {}", job.archive_path.display());
    Ok(())
}
