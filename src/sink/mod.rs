//! Destinations for discovered file paths.

pub mod file;
pub mod queue;
pub mod stdout;

use crate::channel::ChannelError;
use crate::config::{ConfigError, ScanConfig};
use crate::db::Database;
use crate::db::queue::SqliteChannel;
use clap::ValueEnum;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Output file {0} already exists (use --overwrite to replace it)")]
    Exists(PathBuf),
    #[error("Output file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error sending queue message for {path:?} to {queue}: {source}")]
    Send {
        path: String,
        queue: String,
        #[source]
        source: ChannelError,
    },
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Channel setup failed: {0}")]
    Setup(#[from] crate::db::DbError),
}

/// Consumes discovered paths one at a time.
pub trait Sink {
    fn add_file(&mut self, path: &str) -> Result<(), SinkError>;

    /// Flush and release whatever the sink holds.
    fn close(&mut self) -> Result<(), SinkError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    File,
    Queue,
    Stdout,
}

/// Construct the configured sink.
pub fn build_sink(config: &ScanConfig) -> Result<Box<dyn Sink>, SinkError> {
    match config.output {
        OutputFormat::File => {
            let dest = config.dest.as_ref().ok_or(ConfigError::MissingDest)?;
            log::info!("Writing file list to {}", dest.display());
            Ok(Box::new(file::FileSink::create(dest, config.overwrite)?))
        }
        OutputFormat::Queue => {
            let ch = config.channel.as_ref().ok_or(ConfigError::MissingQueue)?;
            let db = Database::open(&ch.path)?;
            let channel = SqliteChannel::new(db, &ch.queue, ch.settings.visibility_timeout());
            Ok(Box::new(queue::QueueSink::new(channel)))
        }
        OutputFormat::Stdout => Ok(Box::new(stdout::StdoutSink::new(std::io::stdout()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::testing::FakeChannel;

    const PATHS: &[&str] = &[
        "/music/gd1977-05-08/d1t01.shn",
        "/music/gd1977-05-08/d1t02.shn",
        "/music/gd1977-05-08/d1t03.shn",
        "/music/ph1997-12-31/01 Tweezer.flac",
        "/music/ph1997-12-31/02 Auld Lang Syne.flac",
    ];

    fn feed(sink: &mut dyn Sink) {
        for p in PATHS {
            sink.add_file(p).unwrap();
        }
        sink.close().unwrap();
    }

    #[test]
    fn test_fan_out_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("files.txt");
        let mut file_sink = file::FileSink::create(&dest, false).unwrap();
        feed(&mut file_sink);
        let written = std::fs::read_to_string(&dest).unwrap();
        assert_eq!(written.lines().collect::<Vec<_>>(), PATHS);

        let mut queue_sink = queue::QueueSink::new(FakeChannel::default());
        feed(&mut queue_sink);
        assert_eq!(queue_sink.channel().sent, PATHS);

        let mut stdout_sink = stdout::StdoutSink::new(Vec::new());
        feed(&mut stdout_sink);
        let out = String::from_utf8(stdout_sink.into_inner()).unwrap();
        let expected: Vec<String> = PATHS.iter().map(|p| format!("{p:?}")).collect();
        assert_eq!(out.lines().collect::<Vec<_>>(), expected);
    }
}
