use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use livemusic::config::{AnalyzeConfig, AnalyzeOptions, AppConfig, ScanConfig, ScanOptions};
use livemusic::sink::OutputFormat;
use livemusic::source::SourceKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lm", version, about = "Live music manager")]
struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan folders for music and publish the file list
    Scan {
        /// Folders to scan
        #[arg(required = true)]
        folders: Vec<String>,

        /// Filename for output destination
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Output destination (defaults to file with --dest, else stdout)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Only scan the top level of each folder
        #[arg(long)]
        no_recursive: bool,

        /// Recurse into subfolders (the default)
        #[arg(short, long, hide = true, conflicts_with = "no_recursive")]
        recursive: bool,

        /// Overwrite existing destination file
        #[arg(short, long)]
        overwrite: bool,

        /// Queue to publish file paths to
        #[arg(short, long)]
        queue: Option<String>,

        /// Profile selecting the channel location
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Read tags from audio files and store normalized records
    Analyze {
        /// Files to analyze before reading the source
        files: Vec<String>,

        /// Source of files to analyze
        #[arg(short, long, value_enum, default_value = "cli")]
        source: SourceKind,

        /// Filename containing a list of files to analyze
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Queue to read file paths from
        #[arg(short, long)]
        queue: Option<String>,

        /// Document store connection string (sqlite://path or a path)
        #[arg(short = 'm', long)]
        store_uri: Option<String>,

        /// Profile selecting the channel location
        #[arg(short, long)]
        profile: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let app = AppConfig::load();

    match cli.command {
        Commands::Scan {
            folders,
            dest,
            format,
            no_recursive,
            recursive: _,
            overwrite,
            queue,
            profile,
        } => {
            let config = ScanConfig::resolve(
                ScanOptions {
                    folders,
                    dest,
                    format,
                    recursive: !no_recursive,
                    overwrite,
                    queue,
                    profile,
                },
                &app,
            )?;

            let mut sink = livemusic::sink::build_sink(&config)
                .context("Failed to open output destination")?;
            let result = livemusic::scanner::scan(&config.roots, config.recursive, sink.as_mut())
                .context("Scan failed")?;
            eprintln!("Found {} files, wrote {}", result.found, result.written);
        }

        Commands::Analyze {
            files,
            source,
            file,
            queue,
            store_uri,
            profile,
        } => {
            let env_store_uri = std::env::var(livemusic::config::STORE_URI_ENV).ok();
            let config = AnalyzeConfig::resolve(
                AnalyzeOptions {
                    files,
                    source,
                    list_file: file,
                    queue,
                    store_uri,
                    profile,
                },
                &app,
                env_store_uri,
            )?;
            log::info!("Store: {}", config.store_path.display());

            let mut db = livemusic::db::Database::open(&config.store_path).with_context(|| {
                format!("Failed to open document store {}", config.store_path.display())
            })?;
            let mut source = livemusic::source::build_source(&config)
                .context("Failed to open file source")?;

            let result = livemusic::ingest::Ingester::new(&mut db)
                .run(&config.files, source.as_deref_mut())
                .context("Analysis failed")?;
            if let Some(source) = source.as_mut() {
                source.close().context("Failed to close file source")?;
            }

            println!(
                "Analysis complete: {} processed, {} saved, {} failed, {} warnings",
                result.processed, result.saved, result.failed, result.warnings
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_no_recursive(args: &[&str]) -> bool {
        match Cli::try_parse_from(args).unwrap().command {
            Commands::Scan { no_recursive, .. } => no_recursive,
            Commands::Analyze { .. } => panic!("expected scan"),
        }
    }

    #[test]
    fn test_scan_recurses_by_default() {
        assert!(!scan_no_recursive(&["lm", "scan", "/music"]));
        assert!(!scan_no_recursive(&["lm", "scan", "-r", "/music"]));
        assert!(scan_no_recursive(&["lm", "scan", "--no-recursive", "/music"]));
    }
}
