//! Struct archiving functionality
//!
//! An [`Archiver`] appends one CSV row per call to [`Archiver::serialise`]. Records must be flat
//! (no nested structs or maps), which is a restriction of the `csv` serializer.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use std::{
    fs::{File, OpenOptions},
    path::Path,
};
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
#[derive(Default)]
pub struct Archiver {
    writer: Option<Writer<File>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Cannot create the archive file: {0}")]
    CreateError(std::io::Error),

    #[error("Cannot write the record: {0}")]
    WriteError(csv::Error),

    #[error("Cannot flush the archive: {0}")]
    FlushError(std::io::Error),

    #[error("The archiver has not been initialised")]
    NotInit,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    pub fn from_path<P: AsRef<Path>>(session: &Session, path: P) -> Result<Self, ArchiveError> {
        Self::new(session.arch_root.join(path))
    }

    /// Create a new archiver writing to the given file, truncating it if it already exists.
    pub fn new<P: AsRef<Path>>(full_path: P) -> Result<Self, ArchiveError> {
        if let Some(parent) = full_path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(ArchiveError::CreateError)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(full_path)
            .map_err(ArchiveError::CreateError)?;

        let w = WriterBuilder::new().has_headers(true).from_writer(file);

        Ok(Self { writer: Some(w) })
    }

    /// Serialise a record into the archive.
    pub fn serialise<T: Serialize>(&mut self, record: T) -> Result<(), ArchiveError> {
        match self.writer {
            Some(ref mut w) => {
                w.serialize(record).map_err(ArchiveError::WriteError)?;
                w.flush().map_err(ArchiveError::FlushError)
            }
            None => Err(ArchiveError::NotInit),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        tick: u64,
        throttle: f64,
        mode: &'static str,
    }

    #[test]
    fn test_archiver() {
        let path = std::env::temp_dir().join("util_archive_test").join("rows.csv");

        let mut arch = Archiver::new(&path).unwrap();
        arch.serialise(Row { tick: 0, throttle: 0.2, mode: "Forward" }).unwrap();
        arch.serialise(Row { tick: 1, throttle: 0.0, mode: "Stop" }).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["tick,throttle,mode", "0,0.2,Forward", "1,0.0,Stop"]);

        let mut empty = Archiver::default();
        assert!(matches!(empty.serialise(0u8), Err(ArchiveError::NotInit)));
    }
}
