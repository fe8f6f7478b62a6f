//! Key mapping: what a key press means.
//!
//! A [`MappingTable`] is plain data (key name to [`KeyAction`]) so it can be
//! loaded from configuration. Behaviours are referenced by id and resolved
//! through a [`BehaviorRegistry`] of named handlers at dispatch time.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::events::InputEvent;
use crate::{InputError, InputResult};

/// Name of a registered behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BehaviorId(String);

impl BehaviorId {
    pub const END_PROGRAM: &'static str = "end_program";
    pub const LOG_EVENT: &'static str = "log_event";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BehaviorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    /// Keys pressed in order and released in reverse, on press only
    StaticChord(Vec<String>),
    Behavior(BehaviorId),
}

/// What dispatching an event produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// No mapping, or the handler chose to do nothing
    Ignored,
    /// Handled with no further effect
    Handled,
    /// A chord for an external injector
    Chord(Vec<String>),
    /// Request a controlled shutdown
    Shutdown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingTable {
    entries: BTreeMap<String, KeyAction>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock mapping: `BD` ends the program.
    pub fn g13_default() -> Self {
        let mut table = Self::new();
        table.insert("BD", KeyAction::Behavior(BehaviorId::new(BehaviorId::END_PROGRAM)));
        table
    }

    pub fn insert(&mut self, key: impl Into<String>, action: KeyAction) -> Option<KeyAction> {
        self.entries.insert(key.into(), action)
    }

    pub fn action(&self, key: &str) -> Option<&KeyAction> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &KeyAction)> {
        self.entries.iter().map(|(key, action)| (key.as_str(), action))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every behaviour reference resolves in `registry`.
    pub fn validate(&self, registry: &BehaviorRegistry) -> InputResult<()> {
        for (key, action) in &self.entries {
            if let KeyAction::Behavior(id) = action
                && !registry.contains(id)
            {
                return Err(InputError::UnknownBehavior {
                    key: key.clone(),
                    behavior: id.to_string(),
                });
            }
        }
        Ok(())
    }
}

pub type BehaviorHandler = Box<dyn Fn(&InputEvent) -> Dispatch + Send + Sync>;

/// Dispatch table of named behaviours.
#[derive(Default)]
pub struct BehaviorRegistry {
    handlers: HashMap<BehaviorId, BehaviorHandler>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `end_program` and `log_event`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(BehaviorId::END_PROGRAM, |event| {
            if event.is_press() {
                info!(event = %event, "End program requested");
                Dispatch::Shutdown
            } else {
                Dispatch::Ignored
            }
        });
        registry.register(BehaviorId::LOG_EVENT, |event| {
            info!(event = %event, "Key event");
            Dispatch::Handled
        });
        registry
    }

    pub fn register<F>(&mut self, id: impl Into<String>, handler: F)
    where
        F: Fn(&InputEvent) -> Dispatch + Send + Sync + 'static,
    {
        self.handlers.insert(BehaviorId::new(id), Box::new(handler));
    }

    pub fn contains(&self, id: &BehaviorId) -> bool {
        self.handlers.contains_key(id)
    }

    pub fn invoke(&self, id: &BehaviorId, event: &InputEvent) -> Option<Dispatch> {
        self.handlers.get(id).map(|handler| handler(event))
    }

    pub fn ids(&self) -> impl Iterator<Item = &BehaviorId> {
        self.handlers.keys()
    }
}

impl fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.handlers.keys().map(BehaviorId::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("BehaviorRegistry")
            .field("handlers", &ids)
            .finish()
    }
}

/// Resolves key events through a mapping table and behaviour registry.
#[derive(Debug)]
pub struct KeyMapper {
    table: MappingTable,
    registry: BehaviorRegistry,
}

impl KeyMapper {
    pub fn new(table: MappingTable, registry: BehaviorRegistry) -> InputResult<Self> {
        table.validate(&registry)?;
        Ok(Self { table, registry })
    }

    pub fn dispatch(&self, event: &InputEvent) -> Dispatch {
        let Some(key) = event.key() else {
            return Dispatch::Ignored;
        };
        match self.table.action(key) {
            None => Dispatch::Ignored,
            Some(KeyAction::StaticChord(keys)) if event.is_press() => Dispatch::Chord(keys.clone()),
            Some(KeyAction::StaticChord(_)) => Dispatch::Ignored,
            Some(KeyAction::Behavior(id)) => self.registry.invoke(id, event).unwrap_or_else(|| {
                warn!(behavior = %id, "Behavior vanished from registry");
                Dispatch::Ignored
            }),
        }
    }

    pub fn table(&self) -> &MappingTable {
        &self.table
    }
}
