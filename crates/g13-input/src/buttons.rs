//! Edge-triggered button decoding.

use std::collections::BTreeSet;

use hid_g13_protocol::{KeycodeTable, RawReport};

use crate::events::{EventSink, InputEvent};

/// Tracks which keys are held and emits press/release edges.
///
/// The diff is a set difference, so the result does not depend on the
/// order of the keycode table. Releases are emitted before presses.
#[derive(Debug, Clone)]
pub struct ButtonDecoder {
    table: KeycodeTable,
    held: BTreeSet<String>,
}

impl ButtonDecoder {
    pub fn new(table: KeycodeTable) -> Self {
        Self {
            table,
            held: BTreeSet::new(),
        }
    }

    /// Keys asserted in `report`.
    pub fn seen(&self, report: &RawReport) -> BTreeSet<String> {
        self.table.asserted(report).map(str::to_string).collect()
    }

    pub fn decode(&mut self, report: &RawReport, sink: &mut impl EventSink) {
        let seen = self.seen(report);

        for released in self.held.difference(&seen) {
            sink.emit(InputEvent::KeyReleased(released.clone()));
        }
        for pressed in seen.difference(&self.held) {
            sink.emit(InputEvent::KeyPressed(pressed.clone()));
        }

        self.held = seen;
    }

    pub fn held(&self) -> &BTreeSet<String> {
        &self.held
    }

    pub fn table(&self) -> &KeycodeTable {
        &self.table
    }
}
