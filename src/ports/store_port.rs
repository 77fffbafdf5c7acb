//! Snapshot supply port trait.

use crate::domain::error::KeibalogError;
use crate::domain::profile::Profile;
use crate::domain::race::Race;
use crate::domain::ticket::Ticket;

/// Supplies the immutable snapshot the engine runs over.
pub trait StorePort {
    /// The single profile, or `None` when none has been saved yet.
    fn fetch_profile(&self) -> Result<Option<Profile>, KeibalogError>;

    /// All races with their tickets nested.
    fn list_races(&self) -> Result<Vec<Race>, KeibalogError>;

    /// All tickets flat, including any with no owning race, for export.
    fn list_tickets(&self) -> Result<Vec<Ticket>, KeibalogError>;
}
