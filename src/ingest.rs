//! Ingestion driver: filenames in, normalized records out.
//!
//! Files are processed one at a time, in delivery order. A file that cannot
//! be read or stored is reported and skipped; only a store failure that
//! makes the store itself unusable ends the run.

use std::path::Path;
use thiserror::Error;

use crate::db::DbError;
use crate::db::store::RecordStore;
use crate::normalize::normalize;
use crate::scanner::ScanError;
use crate::scanner::metadata::{self, RawTagSet};
use crate::source::{Source, SourceError};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Error reading tags from {path}: {source}")]
    Tags {
        path: String,
        #[source]
        source: ScanError,
    },
    #[error("Error saving {id}: {source}")]
    Store {
        id: String,
        #[source]
        source: DbError,
    },
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl IngestError {
    /// Fatal errors end the run instead of skipping one file.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Store { source, .. } => source.is_fatal(),
            Self::Tags { .. } => false,
            Self::Source(_) => true,
        }
    }
}

/// Reads the raw tags of one file.
pub type TagReader = fn(&Path) -> Result<RawTagSet, ScanError>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestResult {
    pub processed: u64,
    pub saved: u64,
    pub failed: u64,
    pub warnings: u64,
}

impl IngestResult {
    fn tally(&mut self, outcome: &Result<usize, IngestError>) {
        self.processed += 1;
        match outcome {
            Ok(warnings) => {
                self.saved += 1;
                self.warnings += *warnings as u64;
            }
            Err(_) => self.failed += 1,
        }
    }
}

pub struct Ingester<'a> {
    store: &'a mut dyn RecordStore,
    read_tags: TagReader,
}

impl<'a> Ingester<'a> {
    pub fn new(store: &'a mut dyn RecordStore) -> Self {
        Self::with_reader(store, metadata::read_tags)
    }

    pub fn with_reader(store: &'a mut dyn RecordStore, read_tags: TagReader) -> Self {
        Self { store, read_tags }
    }

    /// Read, normalize and store one file. Returns the number of soft
    /// warnings raised while normalizing.
    pub fn analyze_file(&mut self, filename: &str) -> Result<usize, IngestError> {
        log::info!("Processing {filename}");
        let path = Path::new(filename);

        let tags = (self.read_tags)(path).map_err(|e| IngestError::Tags {
            path: filename.to_string(),
            source: e,
        })?;

        let base = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());
        let normalized = normalize(&base, &tags);
        for warning in &normalized.warnings {
            log::warn!("{warning} for {base}");
        }

        self.store
            .save(&normalized.record)
            .map_err(|e| IngestError::Store {
                id: normalized.record.id.clone(),
                source: e,
            })?;
        log::debug!("Saved {}", normalized.record.id);

        Ok(normalized.warnings.len())
    }

    /// Ingest the command-line filenames, then everything `source` yields.
    pub fn run(
        &mut self,
        files: &[String],
        source: Option<&mut (dyn Source + 'static)>,
    ) -> Result<IngestResult, IngestError> {
        let mut result = IngestResult::default();

        for filename in files {
            let outcome = self.analyze_file(filename);
            result.tally(&outcome);
            if let Err(e) = outcome {
                if e.is_fatal() {
                    return Err(e);
                }
                log::warn!("Skipping {filename}: {e}");
            }
        }

        if let Some(source) = source {
            log::info!("Reading filenames from {}", source.name());
            source.analyze_files(&mut |filename| {
                let outcome = self.analyze_file(filename);
                result.tally(&outcome);
                outcome.map(|_| ())
            })?;
        }

        Ok(result)
    }
}
