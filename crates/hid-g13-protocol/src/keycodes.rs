//! Keycode table: symbolic button names mapped to report bit locations.
//!
//! The table is plain data so alternate hardware revisions can substitute
//! their own layout (for example from a configuration file).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ids::INPUT_REPORT_LEN;
use crate::input::{FIRST_BUTTON_BYTE, RawReport};
use crate::{ProtocolError, ProtocolResult};

/// Location of one button inside a [`RawReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyLocation {
    pub byte: u8,
    pub bit: u8,
}

impl KeyLocation {
    pub const fn new(byte: u8, bit: u8) -> Self {
        Self { byte, bit }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeycodeEntry {
    pub name: String,
    #[serde(flatten)]
    pub location: KeyLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeycodeTable {
    entries: Vec<KeycodeEntry>,
}

/// Stock G13 layout, one row per report byte.
const G13_LAYOUT: [(u8, &[&str]); 5] = [
    (3, &["G1", "G2", "G3", "G4", "G5", "G6", "G7", "G8"]),
    (4, &["G9", "G10", "G11", "G12", "G13", "G14", "G15", "G16"]),
    (5, &["G17", "G18", "G19", "G20", "G21", "G22"]),
    (6, &["BD", "L1", "L2", "L3", "L4", "M1", "M2", "M3"]),
    (7, &["MR", "THUMB_LEFT", "THUMB_RIGHT", "THUMB_STICK"]),
];

impl KeycodeTable {
    /// Build a table from entries, rejecting duplicate names and locations
    /// outside the button bytes.
    pub fn new(entries: Vec<KeycodeEntry>) -> ProtocolResult<Self> {
        let table = Self { entries };
        table.validate()?;
        Ok(table)
    }

    /// The stock G13 table.
    pub fn g13() -> Self {
        let entries = G13_LAYOUT
            .iter()
            .flat_map(|(byte, names)| {
                names.iter().zip(0u8..).map(|(name, bit)| KeycodeEntry {
                    name: (*name).to_string(),
                    location: KeyLocation::new(*byte, bit),
                })
            })
            .collect();
        Self { entries }
    }

    pub fn validate(&self) -> ProtocolResult<()> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            let byte = usize::from(entry.location.byte);
            if !(FIRST_BUTTON_BYTE..INPUT_REPORT_LEN).contains(&byte) || entry.location.bit >= 8 {
                return Err(ProtocolError::InvalidKeycodeTable(format!(
                    "{} at byte {} bit {} is outside the button bytes",
                    entry.name, entry.location.byte, entry.location.bit
                )));
            }
            if entry.name.is_empty() {
                return Err(ProtocolError::InvalidKeycodeTable(
                    "empty keycode name".to_string(),
                ));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ProtocolError::InvalidKeycodeTable(format!(
                    "duplicate keycode {}",
                    entry.name
                )));
            }
        }
        Ok(())
    }

    pub fn location(&self, name: &str) -> Option<KeyLocation> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.location)
    }

    /// Names of every button asserted in `report`.
    pub fn asserted<'a>(&'a self, report: &'a RawReport) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(|entry| report.bit(entry.location.byte, entry.location.bit))
            .map(|entry| entry.name.as_str())
    }

    pub fn entries(&self) -> &[KeycodeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for KeycodeTable {
    fn default() -> Self {
        Self::g13()
    }
}
