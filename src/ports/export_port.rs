//! Export sink port trait.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::domain::error::KeibalogError;
use crate::domain::race::Race;
use crate::domain::ticket::Ticket;

/// Paths of a completed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub races_path: PathBuf,
    pub tickets_path: PathBuf,
}

/// Port for writing snapshot exports.
pub trait ExportPort {
    /// Write one races file and one tickets file into `out_dir`, named with
    /// a timestamp derived from `now`.
    fn write_files(
        &self,
        races: &[Race],
        tickets: &[Ticket],
        out_dir: &Path,
        now: DateTime<Utc>,
    ) -> Result<ExportedFiles, KeibalogError>;
}
