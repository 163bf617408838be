pub mod metadata;

use crate::MEDIA_EXTENSIONS;
use crate::sink::{Sink, SinkError};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Folder not found: {0}")]
    NotFound(String),
    #[error("Invalid folder (not a directory): {0}")]
    NotADirectory(String),
    #[error("Metadata error for {path}: {message}")]
    Metadata { path: String, message: String },
    #[error("Output error: {0}")]
    Sink(#[from] SinkError),
}

pub struct ScanResult {
    pub found: u64,
    pub written: u64,
}

/// Collect media files under `roots`, deduplicated and sorted by path string.
///
/// Every root is checked before any walking starts, so one bad argument
/// fails the whole invocation. Subfolders are walked unless `recursive` is
/// false, in which case only the immediate children of each root count.
pub fn discover(roots: &[String], recursive: bool) -> Result<Vec<String>, ScanError> {
    for root in roots {
        check_root(Path::new(root))?;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {pos} files found {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let mut files = BTreeSet::new();
    for root in roots {
        log::info!("Processing folder {root}");
        pb.set_message(root.clone());

        let mut walker = WalkDir::new(root).follow_links(true);
        if !recursive {
            walker = walker.max_depth(1);
        }
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    log::debug!("Skipping unreadable entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_media_file(entry.path()) {
                continue;
            }
            if files.insert(entry.path().to_string_lossy().into_owned()) {
                pb.inc(1);
            }
        }
    }

    pb.finish_and_clear();
    Ok(files.into_iter().collect())
}

/// Discover media under `roots` and hand every path to `sink`, in order.
/// The sink is closed afterwards, flushing any buffered output.
pub fn scan(
    roots: &[String],
    recursive: bool,
    sink: &mut dyn Sink,
) -> Result<ScanResult, ScanError> {
    let files = discover(roots, recursive)?;
    log::info!("Found {} files", files.len());

    let mut result = ScanResult {
        found: files.len() as u64,
        written: 0,
    };
    for path in &files {
        sink.add_file(path)?;
        result.written += 1;
    }
    sink.close()?;

    Ok(result)
}

fn check_root(root: &Path) -> Result<(), ScanError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ScanError::NotADirectory(root.display().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ScanError::NotFound(root.display().to_string()))
        }
        Err(e) => Err(ScanError::Io(e)),
    }
}

/// Suffix match on the file name only; contents are never sniffed.
fn is_media_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| MEDIA_EXTENSIONS.iter().any(|ext| name.ends_with(ext)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::stdout::StdoutSink;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("gd1977-05-08/disc2")).unwrap();
        fs::write(root.join("gd1977-05-08/d1t01.shn"), b"").unwrap();
        fs::write(root.join("gd1977-05-08/d1t02.flac"), b"").unwrap();
        fs::write(root.join("gd1977-05-08/info.txt"), b"").unwrap();
        fs::write(root.join("gd1977-05-08/cover.jpg"), b"").unwrap();
        fs::write(root.join("gd1977-05-08/disc2/d2t01.mp3"), b"").unwrap();
        fs::write(root.join("loose.mp3"), b"").unwrap();
        fs::write(root.join("upper.FLAC"), b"").unwrap();
        dir
    }

    fn root_str(dir: &tempfile::TempDir) -> String {
        dir.path().to_string_lossy().to_string()
    }

    #[test]
    fn test_is_media_file() {
        assert!(is_media_file(Path::new("/a/b/track.flac")));
        assert!(is_media_file(Path::new("track.shn")));
        assert!(is_media_file(Path::new("track.mp3")));
        assert!(!is_media_file(Path::new("track.flac.txt")));
        assert!(!is_media_file(Path::new("track.ogg")));
        assert!(!is_media_file(Path::new("flac")));
    }

    #[test]
    fn test_discover_recursive_sorted() {
        let dir = fixture();
        let files = discover(&[root_str(&dir)], true).unwrap();
        let rel: Vec<String> = files
            .iter()
            .map(|p| {
                Path::new(p)
                    .strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .to_string()
            })
            .collect();
        assert_eq!(
            rel,
            vec![
                "gd1977-05-08/d1t01.shn",
                "gd1977-05-08/d1t02.flac",
                "gd1977-05-08/disc2/d2t01.mp3",
                "loose.mp3",
            ]
        );
    }

    #[test]
    fn test_discover_finds_nested_only_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("show/disc1")).unwrap();
        fs::write(dir.path().join("show/disc1/d1t01.flac"), b"").unwrap();

        let track = dir.path().join("show/disc1/d1t01.flac");
        let files = discover(&[root_str(&dir)], true).unwrap();
        assert_eq!(files, vec![track.to_string_lossy().to_string()]);
        assert!(discover(&[root_str(&dir)], false).unwrap().is_empty());
    }

    #[test]
    fn test_discover_non_recursive() {
        let dir = fixture();
        let loose = dir.path().join("loose.mp3");
        let files = discover(&[root_str(&dir)], false).unwrap();
        assert_eq!(files, vec![loose.to_string_lossy().to_string()]);
    }

    #[test]
    fn test_discover_is_deterministic() {
        let dir = fixture();
        let a = discover(&[root_str(&dir)], true).unwrap();
        let b = discover(&[root_str(&dir)], true).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_overlapping_roots_dedup() {
        let dir = fixture();
        let show = dir.path().join("gd1977-05-08").to_string_lossy().to_string();
        let files = discover(&[root_str(&dir), show.clone(), show], true).unwrap();
        assert_eq!(files.len(), 4);
        let unique: BTreeSet<_> = files.iter().collect();
        assert_eq!(unique.len(), files.len());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = fixture();
        let missing = dir.path().join("nope").to_string_lossy().to_string();
        let err = discover(&[root_str(&dir), missing], true).unwrap_err();
        assert!(matches!(err, ScanError::NotFound(_)));
    }

    #[test]
    fn test_file_root_is_fatal() {
        let dir = fixture();
        let file = dir.path().join("loose.mp3").to_string_lossy().to_string();
        let err = discover(&[file], true).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory(_)));
    }

    #[test]
    fn test_scan_feeds_sink_in_order() {
        let dir = fixture();
        let mut sink = StdoutSink::new(Vec::new());
        let result = scan(&[root_str(&dir)], true, &mut sink).unwrap();
        assert_eq!(result.found, 4);
        assert_eq!(result.written, 4);

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("d1t01.shn\""));
        assert!(lines[3].ends_with("loose.mp3\""));
    }
}
