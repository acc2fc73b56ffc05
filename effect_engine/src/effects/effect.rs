//! Effects - value objects with one bound behavior and their own listener.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::rc::Rc;
use tracing::trace;
use uuid::Uuid;

use event_bus::{EventData, EventListener};

use super::{EffectDefinition, Metadata, DESCRIPTION_KEY};
use crate::error::{EffectError, Result};

/// Unique identifier for a live effect instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectId(pub Uuid);

impl EffectId {
    /// Create a new random effect ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The action an effect performs when executed. Receives the effect itself
/// and auxiliary data from the caller.
pub type CommitFn = Rc<dyn Fn(&Effect, &EventData)>;

/// A buff, debuff or status condition.
///
/// An effect carries its magnitude and its stacking policy, and it listens
/// for its own lifecycle events (applied, refreshed, removed) through an
/// embedded [`EventListener`]. Dropping the effect tears that listener down.
pub struct Effect {
    id: EffectId,

    pub name: String,
    pub effect_type: String,
    pub trait_name: String,
    pub power: f64,

    pub refreshable: bool,
    pub stackable: bool,
    /// Always at least 1.
    pub stacks: u32,
    pub max_stacks: Option<u32>,
    pub unique: bool,

    pub interval: u32,
    /// Always at least 1.
    pub ticks: u32,

    /// Bucket priority, honored only by prioritized handlers.
    pub priority: i32,

    pub metadata: Metadata,

    commit: Option<CommitFn>,
    events: EventListener,
}

impl Effect {
    /// Build an effect from its definition.
    ///
    /// Fails if the metadata has no `description`.
    pub fn new(mut definition: EffectDefinition) -> Result<Self> {
        definition.fold_description();
        if !definition.metadata.contains_key(DESCRIPTION_KEY) {
            return Err(EffectError::MissingMetadata {
                effect: definition.name,
                key: DESCRIPTION_KEY,
            });
        }

        Ok(Self {
            id: EffectId::new(),
            name: definition.name,
            effect_type: definition.effect_type,
            trait_name: definition.trait_name,
            power: definition.power,
            refreshable: definition.refreshable,
            stackable: definition.stackable,
            stacks: definition.stacks.max(1),
            max_stacks: definition.max_stacks,
            unique: definition.unique,
            interval: definition.interval,
            ticks: definition.ticks.max(1),
            priority: 0,
            metadata: definition.metadata,
            commit: None,
            events: EventListener::new(),
        })
    }

    /// ID of this live instance. Every factory call yields a new one.
    pub fn id(&self) -> EffectId {
        self.id
    }

    /// The listener that receives this effect's lifecycle events.
    pub fn events(&self) -> &EventListener {
        &self.events
    }

    /// The `description` from metadata.
    pub fn description(&self) -> &str {
        self.metadata
            .get(DESCRIPTION_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Bind the commit action, replacing any previous one.
    pub fn bind_commit(&mut self, commit: CommitFn) {
        self.commit = Some(commit);
    }

    /// Check if a commit action is bound.
    pub fn is_bound(&self) -> bool {
        self.commit.is_some()
    }

    /// Run the commit action with auxiliary data.
    pub fn execute(&self, aux: &EventData) -> Result<()> {
        let commit = self
            .commit
            .as_ref()
            .ok_or_else(|| EffectError::CommitNotBound(self.name.clone()))?;
        trace!(effect = %self.name, id = %self.id, "Executing effect");
        commit(self, aux);
        Ok(())
    }

    /// Retarget the effect at another trait.
    pub fn for_trait(mut self, trait_name: impl Into<String>) -> Self {
        self.trait_name = trait_name.into();
        self
    }

    /// Override the strength of the effect.
    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    /// Set the bucket priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// JSON view of the effect's data, as injected into lifecycle events.
    pub fn snapshot(&self) -> Value {
        json!({
            "id": self.id.0.to_string(),
            "name": self.name,
            "type": self.effect_type,
            "trait": self.trait_name,
            "power": self.power,
            "refreshable": self.refreshable,
            "stackable": self.stackable,
            "stacks": self.stacks,
            "max_stacks": self.max_stacks,
            "unique": self.unique,
            "interval": self.interval,
            "ticks": self.ticks,
            "priority": self.priority,
            "metadata": self.metadata,
        })
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name, self.effect_type, self.description())
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("effect_type", &self.effect_type)
            .field("power", &self.power)
            .field("stacks", &self.stacks)
            .field("unique", &self.unique)
            .field("refreshable", &self.refreshable)
            .field("stackable", &self.stackable)
            .field("bound", &self.is_bound())
            .finish()
    }
}
