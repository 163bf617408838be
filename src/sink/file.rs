use super::{Sink, SinkError};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes one path per line to a local file.
///
/// Output is buffered; nothing is guaranteed on disk until `close`.
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    pub fn create(path: &Path, overwrite: bool) -> Result<Self, SinkError> {
        let mut opts = OpenOptions::new();
        opts.write(true);
        if overwrite {
            opts.create(true).truncate(true);
        } else {
            opts.create_new(true);
        }

        let file = opts.open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                SinkError::Exists(path.to_path_buf())
            } else {
                SinkError::File {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
        })
    }

    fn io_err(&self, source: std::io::Error) -> SinkError {
        SinkError::File {
            path: self.path.clone(),
            source,
        }
    }
}

impl Sink for FileSink {
    fn add_file(&mut self, path: &str) -> Result<(), SinkError> {
        let result = match self.writer.as_mut() {
            Some(w) => writeln!(w, "{path}"),
            None => Err(std::io::Error::other("sink already closed")),
        };
        result.map_err(|e| self.io_err(e))
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        let file = writer.into_inner().map_err(|e| self.io_err(e.into_error()))?;
        file.sync_all().map_err(|e| self.io_err(e))
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if self.writer.is_some() {
            if let Err(e) = self.close() {
                log::warn!("{e}");
            }
        }
    }
}
