use super::{FileCallback, Source, SourceError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Filenames from a newline-delimited list file, read once top to bottom.
pub struct FileListSource {
    path: PathBuf,
    name: String,
    reader: Option<BufReader<File>>,
}

impl FileListSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|e| SourceError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            name: format!("list file {}", path.display()),
            reader: Some(BufReader::new(file)),
        })
    }
}

impl Source for FileListSource {
    fn name(&self) -> &str {
        &self.name
    }

    /// Failures for one line are logged and the next line is processed;
    /// nothing is retried.
    fn analyze_files(&mut self, callback: &mut FileCallback<'_>) -> Result<(), SourceError> {
        // Terminal once consumed
        let Some(reader) = self.reader.take() else {
            return Ok(());
        };

        for line in reader.lines() {
            let line = line.map_err(|e| SourceError::Read {
                path: self.path.clone(),
                source: e,
            })?;
            let filename = line.trim_end_matches('\r');
            if filename.is_empty() {
                continue;
            }
            if let Err(e) = callback(filename) {
                if e.is_fatal() {
                    return Err(SourceError::Aborted(Box::new(e)));
                }
                log::warn!("Skipping {filename}: {e}");
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), SourceError> {
        self.reader = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::IngestError;
    use crate::scanner::ScanError;

    fn list_file(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("files.txt");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_yields_lines_in_order_skipping_blanks() {
        let (_dir, path) = list_file("/music/a.flac\n\n/music/b.shn\r\n/music/c.mp3");
        let mut source = FileListSource::open(&path).unwrap();

        let mut seen = Vec::new();
        source
            .analyze_files(&mut |f| {
                seen.push(f.to_string());
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec!["/music/a.flac", "/music/b.shn", "/music/c.mp3"]);
    }

    #[test]
    fn test_callback_failure_does_not_stop_iteration() {
        let (_dir, path) = list_file("/music/a.flac\n/music/bad.flac\n/music/c.flac\n");
        let mut source = FileListSource::open(&path).unwrap();

        let mut seen = Vec::new();
        source
            .analyze_files(&mut |f| {
                seen.push(f.to_string());
                if f.contains("bad") {
                    Err(IngestError::Tags {
                        path: f.to_string(),
                        source: ScanError::Io(std::io::Error::other("boom")),
                    })
                } else {
                    Ok(())
                }
            })
            .unwrap();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_source_is_terminal() {
        let (_dir, path) = list_file("/music/a.flac\n");
        let mut source = FileListSource::open(&path).unwrap();
        let mut count = 0;
        source
            .analyze_files(&mut |_| {
                count += 1;
                Ok(())
            })
            .unwrap();
        source
            .analyze_files(&mut |_| {
                count += 1;
                Ok(())
            })
            .unwrap();
        source.close().unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_missing_list_file() {
        let err = FileListSource::open(Path::new("/no/such/list.txt")).err().unwrap();
        assert!(matches!(err, SourceError::Open { .. }));
    }
}
