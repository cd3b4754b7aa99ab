use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use engine_logging::{engine_debug, engine_info};
use headline_core::{Entry, SeenSet};
use thiserror::Error;

/// Seen-set log used when no path is configured, relative to the working directory.
pub const DEFAULT_SEEN_LOG: &str = "titles.txt";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to read seen log {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to append to seen log {path:?}: {source}")]
    Append { path: PathBuf, source: io::Error },
}

/// Append-only, line-oriented log of entries already reported.
///
/// The file never shrinks. Concurrent runs against the same file are not
/// synchronized; the scheduler must not overlap them.
#[derive(Debug, Clone)]
pub struct SeenStore {
    path: PathBuf,
}

impl SeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every non-blank line. A missing file is a first run and yields an empty set.
    pub fn load(&self) -> Result<SeenSet, PersistError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                engine_info!("No seen log at {:?}; starting empty", self.path);
                return Ok(SeenSet::new());
            }
            Err(source) => return Err(self.read_error(source)),
        };

        let mut lines = Vec::new();
        for line in BufReader::new(file).lines() {
            lines.push(line.map_err(|source| self.read_error(source))?);
        }
        let seen = SeenSet::from_lines(lines.iter().map(String::as_str));
        engine_debug!("Loaded {} seen entries from {:?}", seen.len(), self.path);
        Ok(seen)
    }

    /// Appends one line per entry, creating the file (and its directory) if absent.
    ///
    /// Lines are written in [`log_order`], not discovery order.
    pub fn append(&self, entries: &[Entry]) -> Result<(), PersistError> {
        if entries.is_empty() {
            return Ok(());
        }
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.append_error(source))?;
        let mut writer = BufWriter::new(file);
        for entry in log_order(entries) {
            writeln!(writer, "{entry}").map_err(|source| self.append_error(source))?;
        }
        writer.flush().map_err(|source| self.append_error(source))?;
        engine_debug!("Appended {} entries to {:?}", entries.len(), self.path);
        Ok(())
    }

    fn ensure_parent_dir(&self) -> Result<(), PersistError> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
                fs::create_dir_all(dir).map_err(|source| self.append_error(source))
            }
            _ => Ok(()),
        }
    }

    fn read_error(&self, source: io::Error) -> PersistError {
        PersistError::Read {
            path: self.path.clone(),
            source,
        }
    }

    fn append_error(&self, source: io::Error) -> PersistError {
        PersistError::Append {
            path: self.path.clone(),
            source,
        }
    }
}

/// Order in which a run's new entries land in the log: newest-discovered first.
///
/// The notification lists entries in discovery order; the log gets the reverse.
/// Existing logs were written this way, so keep it.
pub fn log_order(entries: &[Entry]) -> impl Iterator<Item = &Entry> {
    entries.iter().rev()
}
