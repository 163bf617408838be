//! Origins of filenames to ingest.
//!
//! A source is built once from the validated [`AnalyzeConfig`] and then driven
//! through [`Source::analyze_files`]; the driver never looks at which kind it
//! is holding.

pub mod file_list;
pub mod queue;

use crate::channel::ChannelError;
use crate::config::{AnalyzeConfig, ConfigError};
use crate::db::queue::SqliteChannel;
use crate::db::{Database, DbError};
use crate::ingest::IngestError;
use clap::ValueEnum;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Error opening list file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error reading list file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error reading messages from {queue}: {source}")]
    Receive {
        queue: String,
        #[source]
        source: ChannelError,
    },
    #[error("Error deleting message {message_id} from {queue}: {source}")]
    Acknowledge {
        queue: String,
        message_id: String,
        #[source]
        source: ChannelError,
    },
    #[error("Aborted: {0}")]
    Aborted(#[source] Box<IngestError>),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Channel setup failed: {0}")]
    Setup(#[from] DbError),
}

/// Per-filename work handed to a source. An `Err` means that one file failed.
pub type FileCallback<'a> = dyn FnMut(&str) -> Result<(), IngestError> + 'a;

pub trait Source {
    /// Short description for log lines.
    fn name(&self) -> &str;

    /// Invoke `callback` once per filename, in delivery order.
    ///
    /// A callback error is handled per variant; an error the callback marks
    /// as fatal ends the run with [`SourceError::Aborted`].
    fn analyze_files(&mut self, callback: &mut FileCallback<'_>) -> Result<(), SourceError>;

    fn close(&mut self) -> Result<(), SourceError>;
}

/// Where `analyze` takes its filenames from, besides the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Only the filenames given as arguments
    #[default]
    Cli,
    /// A list file, one filename per line
    File,
    /// A message queue, one filename per message
    #[value(alias = "queue")]
    Sqs,
}

/// Construct the configured source. `Cli` has no formal source.
pub fn build_source(config: &AnalyzeConfig) -> Result<Option<Box<dyn Source>>, SourceError> {
    match config.source {
        SourceKind::Cli => Ok(None),
        SourceKind::File => {
            let path = config.list_file.as_ref().ok_or(ConfigError::MissingListFile)?;
            Ok(Some(Box::new(file_list::FileListSource::open(path)?)))
        }
        SourceKind::Sqs => {
            let ch = config.channel.as_ref().ok_or(ConfigError::MissingQueue)?;
            let db = Database::open(&ch.path)?;
            let channel = SqliteChannel::new(db, &ch.queue, ch.settings.visibility_timeout());
            Ok(Some(Box::new(queue::QueueSource::new(
                channel,
                ch.settings.batch_size,
                ch.settings.wait(),
            ))))
        }
    }
}
