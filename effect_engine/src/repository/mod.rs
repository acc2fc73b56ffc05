//! Effect repository - the catalog of effect definitions and the
//! behaviors bound to them.
//!
//! Definitions come from a JSON array. Behaviors (commit actions and
//! lifecycle hooks) are bound by explicit registration calls at startup;
//! binding the same thing twice is a configuration error.

mod factory;

pub use factory::*;

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;

use tracing::{debug, info};

use event_bus::{EventData, EventType, Handler};

use crate::config::EngineConfig;
use crate::effects::{CommitFn, Effect, EffectDefinition, DESCRIPTION_KEY};
use crate::error::{EffectError, Result};

/// One catalog entry: the constructor data plus bound behaviors.
#[derive(Clone)]
pub struct EffectRepositoryRow {
    pub data: EffectDefinition,
    pub commit: Option<CommitFn>,
    pub events: HashMap<EventType, Handler>,
}

impl EffectRepositoryRow {
    fn new(data: EffectDefinition) -> Self {
        Self {
            data,
            commit: None,
            events: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for EffectRepositoryRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRepositoryRow")
            .field("data", &self.data)
            .field("commit", &self.commit.is_some())
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The shared catalog of effects, keyed by name.
///
/// Owned by whoever builds effects and lent to an [`EffectFactory`].
#[derive(Debug, Default)]
pub struct EffectRepository {
    rows: HashMap<String, EffectRepositoryRow>,
    /// Names in definition order.
    order: Vec<String>,
    unique_types: HashSet<String>,
}

impl EffectRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository from definitions. Fails as a whole on the first
    /// invalid entry.
    pub fn from_definitions(definitions: impl IntoIterator<Item = EffectDefinition>) -> Result<Self> {
        let mut repo = Self::new();
        for mut definition in definitions {
            definition.fold_description();
            if !definition.metadata.contains_key(DESCRIPTION_KEY) {
                return Err(EffectError::MissingMetadata {
                    effect: definition.name,
                    key: DESCRIPTION_KEY,
                });
            }
            if repo.rows.contains_key(&definition.name) {
                return Err(EffectError::DuplicateEffect(definition.name));
            }
            if definition.unique && !repo.unique_types.insert(definition.effect_type.clone()) {
                return Err(EffectError::DuplicateUniqueType(definition.effect_type));
            }

            repo.order.push(definition.name.clone());
            repo.rows
                .insert(definition.name.clone(), EffectRepositoryRow::new(definition));
        }
        Ok(repo)
    }

    /// Parse a JSON array of definitions.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let definitions: Vec<EffectDefinition> = serde_json::from_str(raw)?;
        let repo = Self::from_definitions(definitions)?;
        debug!(count = repo.len(), "Loaded effect definitions");
        Ok(repo)
    }

    /// Load definitions from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repo = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), count = repo.len(), "Effect repository loaded");
        Ok(repo)
    }

    /// Load the file named by the config, or start empty if it names none.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        match &config.definitions {
            Some(path) => Self::from_path(path),
            None => Ok(Self::new()),
        }
    }

    /// Bind the commit action of an effect.
    pub fn implement<F>(&mut self, name: &str, commit: F) -> Result<()>
    where
        F: Fn(&Effect, &EventData) + 'static,
    {
        let row = self
            .rows
            .get_mut(name)
            .ok_or_else(|| EffectError::UnknownEffect(name.to_string()))?;
        if row.commit.is_some() {
            return Err(EffectError::CommitAlreadyBound(name.to_string()));
        }
        row.commit = Some(Rc::new(commit));
        debug!(effect = %name, "Commit bound");
        Ok(())
    }

    /// Bind a lifecycle hook of an effect. The hook is registered on the
    /// listener of every effect the factory builds from this row.
    pub fn on<F>(&mut self, name: &str, event_type: &str, handler: F) -> Result<()>
    where
        F: Fn(&EventData) + 'static,
    {
        let event_type = EventType::parse(event_type)?;
        let row = self
            .rows
            .get_mut(name)
            .ok_or_else(|| EffectError::UnknownEffect(name.to_string()))?;
        if row.events.contains_key(&event_type) {
            return Err(EffectError::EventHandlerAlreadyBound {
                effect: name.to_string(),
                event_type: event_type.to_string(),
            });
        }
        debug!(effect = %name, %event_type, "Event handler bound");
        row.events.insert(event_type, Rc::new(handler));
        Ok(())
    }

    /// Get a row by effect name.
    pub fn get(&self, name: &str) -> Option<&EffectRepositoryRow> {
        self.rows.get(name)
    }

    /// Check if an effect is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.rows.contains_key(name)
    }

    /// Whether some definition declared this type unique.
    pub fn is_unique_type(&self, effect_type: &str) -> bool {
        self.unique_types.contains(effect_type)
    }

    /// Effect names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of defined effects.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if no effects are defined.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
