//! Spreadsheet importers for athlete roster data

pub mod roster_importer;

// Re-export commonly used items
pub use roster_importer::{
    AthleteRecord, AthleteSheet, HeaderIndex, RosterImportError, RosterImporter,
};
