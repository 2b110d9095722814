//! Destinations for a finished sequence
//!
//! A sink accepts exactly one script. [`FileSink`] writes it to a temporary
//! file next to the destination and renames it into place, so an interrupted
//! write never leaves a truncated `.scs` behind.

use crate::directive::FinishedSequence;
use crate::error::SinkError;
use std::io::Write;
use std::path::{Path, PathBuf};

pub trait SequenceSink {
    /// Write the whole script; a second call fails with [`SinkError::AlreadyWritten`]
    fn write(&mut self, sequence: &FinishedSequence) -> Result<(), SinkError>;
}

/// Writes the script to a file
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    written: bool,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            written: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, reason: impl ToString) -> SinkError {
        SinkError::Io {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl SequenceSink for FileSink {
    fn write(&mut self, sequence: &FinishedSequence) -> Result<(), SinkError> {
        if self.written {
            return Err(SinkError::AlreadyWritten);
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut staging = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        staging
            .write_all(sequence.render().as_bytes())
            .and_then(|_| staging.flush())
            .map_err(|e| self.io_error(e))?;
        staging.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        self.written = true;
        tracing::info!("Wrote {} lines to {}", sequence.lines().len(), self.path.display());
        Ok(())
    }
}

/// Keeps the rendered script in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    contents: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered script, if one was written
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl SequenceSink for MemorySink {
    fn write(&mut self, sequence: &FinishedSequence) -> Result<(), SinkError> {
        if self.contents.is_some() {
            return Err(SinkError::AlreadyWritten);
        }
        self.contents = Some(sequence.render());
        Ok(())
    }
}
