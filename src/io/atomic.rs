//! Write-to-temp-then-rename.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Write bytes atomically: a hidden sibling file is written and synced,
/// then renamed over the target. Readers see the old or the new content.
///
/// The sibling lives in the target's directory so the rename never crosses
/// filesystems; its name carries the process id and a per-process sequence
/// number. Existing permissions are carried over.
pub fn write_bytes_atomically(target_path: &Path, data: &[u8]) -> io::Result<()> {
    let file_name = target_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "target has no file name"))?;
    let sequence = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let temp_path =
        target_path.with_file_name(format!(".{file_name}.lintpilot-{}-{sequence}", std::process::id()));

    let written = fs::File::create(&temp_path).and_then(|mut file| {
        file.write_all(data)?;
        file.sync_all()?;
        if let Ok(metadata) = fs::metadata(target_path) {
            fs::set_permissions(&temp_path, metadata.permissions())?;
        }
        fs::rename(&temp_path, target_path)
    });

    if written.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.contains(".lintpilot-"))
            .collect()
    }

    #[test]
    fn replaces_content_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("state.json");
        fs::write(&target, "old").unwrap();

        write_bytes_atomically(&target, b"new").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn concurrent_writers_leave_one_whole_version() {
        let dir = TempDir::new().unwrap();
        let target = Arc::new(dir.path().join("app.py"));
        let writers: Vec<_> = (0..8)
            .map(|i| {
                let target = Arc::clone(&target);
                thread::spawn(move || write_bytes_atomically(&target, format!("v{i}\n").repeat(100).as_bytes()))
            })
            .collect();
        for writer in writers {
            writer.join().unwrap().unwrap();
        }

        let content = fs::read_to_string(target.as_path()).unwrap();
        let first = content.lines().next().unwrap();
        assert!(content.lines().all(|line| line == first));
        assert_eq!(content.lines().count(), 100);
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn missing_directory_fails_without_leftovers() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("absent").join("x.py");
        assert!(write_bytes_atomically(&target, b"x").is_err());
        assert!(leftovers(dir.path()).is_empty());
    }
}
