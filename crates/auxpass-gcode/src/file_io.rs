//! Program file I/O
//!
//! Reads slicer output into lines and writes processed programs back out.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};

/// Read buffer for slicer output, which is often tens of megabytes
const READ_BUFFER_BYTES: usize = 256 * 1024;

/// Files above this size trigger a warning before being loaded
const LARGE_FILE_BYTES: u64 = 500 * 1024 * 1024;

/// What a [`ProgramReader::read_lines`] call consumed
#[derive(Debug, Clone)]
pub struct FileReadStats {
    /// Bytes consumed, one terminator byte counted per line
    pub bytes_read: u64,
    /// Lines read, the empty final line after a trailing `\n` not counted
    pub lines_read: u64,
    /// Size on disk when the reader was opened
    pub file_size: u64,
    /// Wall-clock time spent reading (milliseconds)
    pub read_time_ms: u64,
}

/// Reader for slicer-generated programs
pub struct ProgramReader {
    path: PathBuf,
    file_size: u64,
}

impl ProgramReader {
    /// Open a program for reading.
    ///
    /// Fails when `path` is missing or names a directory.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                bail!("Program {} does not exist", path.display())
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Cannot stat {}", path.display()))
            }
        };
        if !metadata.is_file() {
            bail!("{} is not a file", path.display());
        }

        Ok(Self {
            path: path.to_path_buf(),
            file_size: metadata.len(),
        })
    }

    /// File size in bytes, as seen when the reader was opened
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Path of the program being read
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every line, without terminators
    ///
    /// # Errors
    /// Returns error if file cannot be read or is not valid UTF-8
    pub fn read_lines(&self) -> Result<(Vec<String>, FileReadStats)> {
        if self.file_size > LARGE_FILE_BYTES {
            tracing::warn!(
                path = %self.path.display(),
                megabytes = self.file_size >> 20,
                "Loading a very large program into memory"
            );
        }

        let start = Instant::now();
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let reader = BufReader::with_capacity(READ_BUFFER_BYTES, file);

        let mut lines = Vec::with_capacity((self.file_size / 32) as usize);
        let mut bytes_read: u64 = 0;
        for (i, line) in reader.lines().enumerate() {
            let line = line.with_context(|| {
                format!("Failed to read line {} of {}", i + 1, self.path.display())
            })?;
            bytes_read += line.len() as u64 + 1;
            lines.push(line);
        }

        let stats = FileReadStats {
            lines_read: lines.len() as u64,
            bytes_read,
            file_size: self.file_size,
            read_time_ms: start.elapsed().as_millis() as u64,
        };
        tracing::debug!(
            path = %self.path.display(),
            lines = stats.lines_read,
            ms = stats.read_time_ms,
            "Program read"
        );
        Ok((lines, stats))
    }
}

/// Write lines to `path`, each terminated by `\n`
pub fn write_program<S: AsRef<str>>(path: impl AsRef<Path>, lines: &[S]) -> Result<()> {
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writer.write_all(line.as_ref().as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
