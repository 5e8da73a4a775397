//! Flat-file sink
//!
//! Every write opens its target, writes the whole batch as one buffer and
//! closes it again. Appends use `O_APPEND`, so concurrent workers writing to
//! the same file never overwrite each other's lines.

use crate::storage::traits::StorageResult;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// How a write treats existing file content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Add lines after the existing content
    Append,

    /// Replace the file content
    Truncate,
}

/// Writes line batches to named files under a base directory
#[derive(Debug, Clone)]
pub struct FileSink {
    base: PathBuf,
}

impl FileSink {
    /// Creates a sink rooted at `base`, creating the directory if absent
    pub fn new(base: impl Into<PathBuf>) -> StorageResult<Self> {
        let base = base.into();
        std::fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    /// The directory all files are written under
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Full path of the named file
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }

    /// Writes `lines` to the named file, one per line
    ///
    /// An empty batch in append mode does not touch the file.
    pub fn write_lines<S: AsRef<str>>(
        &self,
        name: &str,
        lines: &[S],
        mode: WriteMode,
    ) -> StorageResult<()> {
        if lines.is_empty() && mode == WriteMode::Append {
            return Ok(());
        }

        let mut buffer = String::new();
        for line in lines {
            buffer.push_str(line.as_ref());
            buffer.push('\n');
        }

        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            WriteMode::Append => options.append(true),
            WriteMode::Truncate => options.write(true).truncate(true),
        };

        let mut file = options.open(self.path_of(name))?;
        file.write_all(buffer.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}
