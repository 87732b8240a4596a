//! Size-based log file rotation
//!
//! When the next write would push the active file past `max_bytes`, backups
//! are shifted (`name.1` → `name.2`, …), the active file becomes `name.1`
//! and a fresh file is opened. At most `backup_count` backups are kept; with
//! a count of zero the active file is truncated instead.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Log file writer with a size limit and a fixed number of backups.
#[derive(Debug)]
pub struct RotatingFileWriter {
    path: PathBuf,
    /// 0 disables rotation
    max_bytes: u64,
    backup_count: u32,
    file: File,
    written: u64,
}

impl RotatingFileWriter {
    /// Open (or create) `path` for appending.
    ///
    /// Parent directories are created if needed.
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backup_count: u32) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create log directory {}", parent.display()))?;
        }

        let file = open_append(&path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        let written = file
            .metadata()
            .context("failed to get log file metadata")?
            .len();

        Ok(Self {
            path,
            max_bytes,
            backup_count,
            file,
            written,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the `index`th backup.
    pub fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn should_rotate(&self, incoming: usize) -> bool {
        self.max_bytes > 0 && self.written > 0 && self.written + incoming as u64 > self.max_bytes
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backup_count == 0 {
            self.file.set_len(0)?;
            self.written = 0;
            return Ok(());
        }

        let oldest = self.backup_path(self.backup_count);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.backup_count).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                fs::rename(&from, self.backup_path(index + 1))?;
            }
        }
        fs::rename(&self.path, self.backup_path(1))?;

        self.file = open_append(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.should_rotate(buf.len()) {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_count(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("logs").join("PkgBot.log");

        let mut writer = RotatingFileWriter::open(&log_path, 1024, 2).unwrap();
        writer.write_all(b"hello\n").unwrap();

        assert_eq!(fs::read_to_string(&log_path).unwrap(), "hello\n");
    }

    #[test]
    fn test_rotates_when_size_exceeded() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("app.log");

        let mut writer = RotatingFileWriter::open(&log_path, 16, 3).unwrap();
        writer.write_all(b"0123456789\n").unwrap();
        writer.write_all(b"abcdefghij\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(&log_path).unwrap(), "abcdefghij\n");
        assert_eq!(
            fs::read_to_string(writer.backup_path(1)).unwrap(),
            "0123456789\n"
        );
    }

    #[test]
    fn test_keeps_at_most_backup_count_files() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("app.log");

        let mut writer = RotatingFileWriter::open(&log_path, 8, 2).unwrap();
        for line in ["first..\n", "second.\n", "third..\n", "fourth.\n"] {
            writer.write_all(line.as_bytes()).unwrap();
        }
        writer.flush().unwrap();

        // active + two backups
        assert_eq!(file_count(temp_dir.path()), 3);
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "fourth.\n");
        assert_eq!(fs::read_to_string(writer.backup_path(1)).unwrap(), "third..\n");
        assert_eq!(fs::read_to_string(writer.backup_path(2)).unwrap(), "second.\n");
    }

    #[test]
    fn test_zero_backups_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("app.log");

        let mut writer = RotatingFileWriter::open(&log_path, 8, 0).unwrap();
        writer.write_all(b"aaaaaaa\n").unwrap();
        writer.write_all(b"bbbbbbb\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(file_count(temp_dir.path()), 1);
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "bbbbbbb\n");
    }

    #[test]
    fn test_zero_max_bytes_never_rotates() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("app.log");

        let mut writer = RotatingFileWriter::open(&log_path, 0, 5).unwrap();
        for _ in 0..50 {
            writer.write_all(b"0123456789\n").unwrap();
        }
        writer.flush().unwrap();

        assert_eq!(file_count(temp_dir.path()), 1);
    }

    #[test]
    fn test_existing_file_size_counts() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("app.log");
        fs::write(&log_path, b"previous run\n").unwrap();

        let mut writer = RotatingFileWriter::open(&log_path, 16, 1).unwrap();
        writer.write_all(b"new run\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(
            fs::read_to_string(writer.backup_path(1)).unwrap(),
            "previous run\n"
        );
    }
}
