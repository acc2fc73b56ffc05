//! Effect handler - the per-owner store of active effects and the
//! stacking/uniqueness/refresh state machine.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use event_bus::{EntityRef, Event, EventData, EventTopic, EventType};

use crate::config::EngineConfig;
use crate::effects::Effect;
use crate::error::Result;

/// Index of a bucket: effects are grouped by priority, then by type.
///
/// The derived ordering (priority ascending, then type) is the order in
/// which buckets are iterated and executed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketKey {
    pub priority: i32,
    pub effect_type: String,
}

impl BucketKey {
    /// Create a key from a priority and an effect type.
    pub fn new(priority: i32, effect_type: impl Into<String>) -> Self {
        Self {
            priority,
            effect_type: effect_type.into(),
        }
    }
}

impl std::fmt::Display for BucketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.priority, self.effect_type)
    }
}

/// Effects of one key, most recently applied first.
///
/// A unique bucket never holds more than one effect.
#[derive(Debug)]
pub struct Bucket {
    unique: bool,
    effects: VecDeque<Effect>,
}

impl Bucket {
    fn new(unique: bool) -> Self {
        Self {
            unique,
            effects: VecDeque::new(),
        }
    }

    /// Check if the bucket holds a unique type.
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// The most recently applied effect.
    pub fn front(&self) -> Option<&Effect> {
        self.effects.front()
    }

    /// Effects from most to least recent.
    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    /// Number of effects in the bucket.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Check if the bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Result of [`EffectHandler::add`].
#[derive(Debug)]
pub enum AddOutcome {
    /// The effect joined its bucket. `APPLIED` was emitted.
    Applied,

    /// The effect replaced the unique occupant. `REFRESHED` was emitted.
    Refreshed,

    /// The effect merged with a same-named occupant. `REFRESHED` was
    /// emitted with the new stack count.
    Stacked { stacks: u32 },

    /// The bucket is unique, occupied, and the effect is not refreshable.
    /// Nothing changed; the rejected effect is handed back.
    UniqueNoRefresh(Effect),
}

impl AddOutcome {
    /// Whether the effect is now live in the handler.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, AddOutcome::UniqueNoRefresh(_))
    }
}

/// Manages the active effects of one owner entity.
///
/// Every accepted transition is emitted as a lifecycle event to the
/// affected effect's own listener and then relayed through the handler's
/// topic, named `"<owner>-EffectHandler"`, to any external subscriber.
pub struct EffectHandler {
    owner: EntityRef,
    store: BTreeMap<BucketKey, Bucket>,
    topic: EventTopic,
    config: EngineConfig,
}

impl EffectHandler {
    /// Create a handler with the default configuration.
    pub fn new(owner: EntityRef) -> Self {
        Self::with_config(owner, EngineConfig::default())
    }

    /// Create a handler with explicit engine settings.
    pub fn with_config(owner: EntityRef, config: EngineConfig) -> Self {
        let topic = EventTopic::new(format!("{}-EffectHandler", owner.name));
        Self {
            owner,
            store: BTreeMap::new(),
            topic,
            config,
        }
    }

    /// The entity whose effects this handler manages.
    pub fn owner(&self) -> &EntityRef {
        &self.owner
    }

    /// Channel carrying this handler's lifecycle events.
    pub fn topic(&self) -> &EventTopic {
        &self.topic
    }

    /// Engine settings in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Bucket key an effect lands in. Priority counts only when the
    /// handler is prioritized.
    pub fn key_for(&self, effect: &Effect) -> BucketKey {
        let priority = if self.config.prioritized {
            effect.priority
        } else {
            0
        };
        BucketKey::new(priority, effect.effect_type.clone())
    }

    /// Apply an effect.
    ///
    /// - A stackable effect never enters above its stack ceiling.
    /// - A stackable effect whose bucket is fronted by an effect of the same
    ///   name takes it over, carrying the stacks forward up to the ceiling.
    ///   The `REFRESHED` payload carries the new `stacks` count.
    /// - An occupied unique bucket is refreshed if the new effect is
    ///   refreshable, and otherwise rejects it.
    /// - Everything else is pushed to the front of its bucket.
    pub fn add(&mut self, mut effect: Effect, mut data: EventData) -> AddOutcome {
        let key = self.key_for(&effect);
        let ceiling = effect.max_stacks.unwrap_or(self.config.stack_ceiling).max(1);
        if effect.stackable {
            effect.stacks = effect.stacks.min(ceiling);
        }
        let bucket = self
            .store
            .entry(key.clone())
            .or_insert_with(|| Bucket::new(effect.unique));

        let same_name = bucket
            .front()
            .filter(|occupant| occupant.name == effect.name)
            .map(|occupant| occupant.stacks);

        let (outcome, status) = match same_name {
            Some(previous) if effect.stackable => {
                let stacks = previous.saturating_add(effect.stacks).min(ceiling);
                effect.stacks = stacks;
                data.insert("stacks".to_string(), stacks.into());
                bucket.effects.pop_front();
                bucket.effects.push_front(effect);
                (AddOutcome::Stacked { stacks }, EventType::Refreshed)
            }
            _ if bucket.unique && !bucket.is_empty() => {
                if !effect.refreshable {
                    debug!(owner = %self.owner, effect = %effect.name, bucket = %key, "Unique effect present, add rejected");
                    return AddOutcome::UniqueNoRefresh(effect);
                }
                bucket.effects.pop_front();
                bucket.effects.push_front(effect);
                (AddOutcome::Refreshed, EventType::Refreshed)
            }
            _ => {
                bucket.effects.push_front(effect);
                (AddOutcome::Applied, EventType::Applied)
            }
        };

        if let Some(effect) = self.store.get(&key).and_then(Bucket::front) {
            debug!(owner = %self.owner, effect = %effect.name, bucket = %key, %status, "Effect added");
            self.announce(effect, status, data);
        }
        outcome
    }

    /// Remove the most recently applied effect of a type.
    ///
    /// With priorities in play the lowest-priority bucket of the type is
    /// used. Returns `None`, emitting nothing, if no such effect is live.
    pub fn remove(&mut self, effect_type: &str, data: EventData) -> Option<Effect> {
        let key = self
            .store
            .keys()
            .find(|key| key.effect_type == effect_type)
            .cloned()?;
        self.remove_at(&key, data)
    }

    /// Remove the most recently applied effect of an exact bucket.
    pub fn remove_at(&mut self, key: &BucketKey, data: EventData) -> Option<Effect> {
        let bucket = self.store.get_mut(key)?;
        let effect = bucket.effects.pop_front()?;
        if bucket.is_empty() {
            self.store.remove(key);
        }

        debug!(owner = %self.owner, effect = %effect.name, bucket = %key, "Effect removed");
        self.announce(&effect, EventType::Removed, data);
        Some(effect)
    }

    /// Remove every effect, emitting `REMOVED` for each.
    pub fn clear(&mut self, data: EventData) -> Vec<Effect> {
        let store = std::mem::take(&mut self.store);
        let mut removed = Vec::new();
        for bucket in store.into_values() {
            for effect in bucket.effects {
                self.announce(&effect, EventType::Removed, data.clone());
                removed.push(effect);
            }
        }
        removed
    }

    /// Build a lifecycle event and deliver it to the effect's own listener
    /// only.
    ///
    /// `source` defaults to the owner unless the caller supplied one;
    /// `target` is always the owner and `self` is the effect's snapshot.
    pub fn emit_to(&self, effect: &Effect, status: EventType, data: EventData) -> Event {
        let mut payload = data;
        payload
            .entry("source")
            .or_insert_with(|| self.owner.to_value());
        payload.insert("target".to_string(), self.owner.to_value());
        payload.insert("self".to_string(), effect.snapshot());

        let event = Event::new(status, payload);
        effect.events().on_notify(&event);
        event
    }

    /// Forward an event to the handler's topic subscribers.
    pub fn notify(&self, event: &Event) {
        self.topic.on_notify(event);
    }

    fn announce(&self, effect: &Effect, status: EventType, data: EventData) {
        let event = self.emit_to(effect, status, data);
        self.notify(&event);
    }

    /// Execute every live effect in bucket order, most recent first within
    /// a bucket. Stops at the first failure.
    pub fn execute_all(&self, aux: &EventData) -> Result<()> {
        for effect in self.store.values().flat_map(Bucket::iter) {
            effect.execute(aux)?;
        }
        Ok(())
    }

    /// Buckets in priority order, then by type.
    pub fn buckets(&self) -> impl Iterator<Item = (&BucketKey, &Bucket)> {
        self.store.iter()
    }

    /// Effect types grouped by ascending priority, sorted within a group.
    pub fn types_by_priority(&self) -> Vec<(i32, Vec<String>)> {
        let mut grouped: Vec<(i32, Vec<String>)> = Vec::new();
        for key in self.store.keys() {
            match grouped.last_mut() {
                Some((priority, types)) if *priority == key.priority => {
                    types.push(key.effect_type.clone());
                }
                _ => grouped.push((key.priority, vec![key.effect_type.clone()])),
            }
        }
        grouped
    }

    /// Most recently applied effect of a type.
    pub fn get(&self, effect_type: &str) -> Option<&Effect> {
        self.store
            .iter()
            .find(|(key, _)| key.effect_type == effect_type)
            .and_then(|(_, bucket)| bucket.front())
    }

    /// All live effects of a type, across priorities.
    pub fn effects<'a>(&'a self, effect_type: &'a str) -> impl Iterator<Item = &'a Effect> + 'a {
        self.store
            .iter()
            .filter(move |(key, _)| key.effect_type == effect_type)
            .flat_map(|(_, bucket)| bucket.iter())
    }

    /// Get a bucket by exact key.
    pub fn bucket(&self, key: &BucketKey) -> Option<&Bucket> {
        self.store.get(key)
    }

    /// Number of live effects of a type, across priorities.
    pub fn bucket_len(&self, effect_type: &str) -> usize {
        self.effects(effect_type).count()
    }

    /// Check if any effect of a type is live.
    pub fn contains(&self, effect_type: &str) -> bool {
        self.get(effect_type).is_some()
    }

    /// Total number of live effects.
    pub fn len(&self) -> usize {
        self.store.values().map(Bucket::len).sum()
    }

    /// Check if no effects are live.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl std::fmt::Debug for EffectHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandler")
            .field("owner", &self.owner)
            .field("store", &self.store)
            .field("topic", &self.topic.name())
            .finish()
    }
}
