//! Atomic artifact replacement.

use std::fs;
use std::io::Write;
use std::path::Path;

/// Replace `path` atomically: create the parent directory if needed, write
/// a sibling temporary file, then rename over the target.
///
/// A reader holding the old file keeps a consistent view; a reader opening
/// after the rename sees the complete new content.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => path.with_file_name(format!(".{name}.tmp")),
        None => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "artifact path has no file name",
            ))
        }
    };
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)
}

/// Append a line to a history file, creating the parent as needed.
pub fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut f = fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(f, "{line}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_parent_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geomag").join("kindex.txt");
        write_atomic(&path, b"first\n").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"first\n");
        write_atomic(&path, b"second\n").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second\n");
        // no stray temp file left behind
        let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn concurrent_reader_never_sees_partial_file() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.txt");
        let a = vec![b'a'; 64 * 1024];
        let b = vec![b'b'; 64 * 1024];
        write_atomic(&path, &a).unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let reader = {
            let path = path.clone();
            let stop = stop.clone();
            std::thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    let data = fs::read(&path).unwrap();
                    assert_eq!(data.len(), 64 * 1024);
                    let first = data[0];
                    assert!(data.iter().all(|&c| c == first));
                }
            })
        };

        for _ in 0..50 {
            write_atomic(&path, &b).unwrap();
            write_atomic(&path, &a).unwrap();
        }
        stop.store(true, Ordering::Relaxed);
        reader.join().unwrap();
    }
}
