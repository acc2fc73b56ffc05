//! Effect definitions - the data half of an effect, as stored in the
//! definition source.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Free-form effect metadata. Must carry a `description`.
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata key every effect is required to have.
pub const DESCRIPTION_KEY: &str = "description";

/// Constructor arguments for an [`Effect`](super::Effect).
///
/// Boolean flags accept JSON booleans or case-insensitive `"true"`/`"false"`
/// strings. A top-level `description` is folded into `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDefinition {
    /// Unique name within a repository (e.g., "poison").
    pub name: String,

    /// Bucket key inside a handler (e.g., "dot").
    #[serde(rename = "type")]
    pub effect_type: String,

    /// Trait (stat, skill, etc.) that is affected.
    #[serde(rename = "trait", default)]
    pub trait_name: String,

    /// Strength of the effect.
    #[serde(default, alias = "magnitude")]
    pub power: f64,

    /// A second application replaces a unique occupant instead of being rejected.
    #[serde(default, deserialize_with = "flag")]
    pub refreshable: bool,

    /// Repeated applications accumulate stacks.
    #[serde(default, deserialize_with = "flag")]
    pub stackable: bool,

    #[serde(default = "one")]
    pub stacks: u32,

    /// Ceiling for `stacks`; the engine config's ceiling applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stacks: Option<u32>,

    /// Only one effect of this type may be live per handler.
    #[serde(default, deserialize_with = "flag")]
    pub unique: bool,

    /// Seconds between recurring applications. Data only.
    #[serde(default)]
    pub interval: u32,

    /// How many times the effect applies over time. Data only.
    #[serde(default = "one")]
    pub ticks: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub metadata: Metadata,
}

fn one() -> u32 {
    1
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(D::Error::custom(format!(
                "expected \"true\" or \"false\", found {other:?}"
            ))),
        },
    }
}

impl EffectDefinition {
    /// Create a definition with defaults for everything but the essentials.
    pub fn new(
        name: impl Into<String>,
        effect_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(DESCRIPTION_KEY.to_string(), Value::String(description.into()));
        Self {
            name: name.into(),
            effect_type: effect_type.into(),
            trait_name: String::new(),
            power: 0.0,
            refreshable: false,
            stackable: false,
            stacks: 1,
            max_stacks: None,
            unique: false,
            interval: 0,
            ticks: 1,
            description: None,
            metadata,
        }
    }

    /// Set the affected trait.
    pub fn with_trait(mut self, trait_name: impl Into<String>) -> Self {
        self.trait_name = trait_name.into();
        self
    }

    /// Set the strength of the effect.
    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    /// Mark the effect's type as unique within a handler.
    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Allow the effect to replace a unique occupant.
    pub fn with_refreshable(mut self, refreshable: bool) -> Self {
        self.refreshable = refreshable;
        self
    }

    /// Make the effect stackable, optionally with its own ceiling.
    pub fn with_stacking(mut self, max_stacks: Option<u32>) -> Self {
        self.stackable = true;
        self.max_stacks = max_stacks;
        self
    }

    /// Set the starting stack count.
    pub fn with_stacks(mut self, stacks: u32) -> Self {
        self.stacks = stacks;
        self
    }

    /// Set the recurrence interval and tick count.
    pub fn with_timing(mut self, interval: u32, ticks: u32) -> Self {
        self.interval = interval;
        self.ticks = ticks;
        self
    }

    /// Drop both the top-level and the metadata description.
    pub fn without_description(mut self) -> Self {
        self.description = None;
        self.metadata.remove(DESCRIPTION_KEY);
        self
    }

    /// Move a top-level `description` into `metadata` unless metadata
    /// already has one.
    pub fn fold_description(&mut self) {
        if let Some(description) = self.description.take() {
            self.metadata
                .entry(DESCRIPTION_KEY.to_string())
                .or_insert(Value::String(description));
        }
    }

    /// Check for a description at either level.
    pub fn has_description(&self) -> bool {
        self.description.is_some() || self.metadata.contains_key(DESCRIPTION_KEY)
    }
}
