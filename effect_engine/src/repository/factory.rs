//! Effect factory - builds live effects from repository rows.

use tracing::debug;

use super::EffectRepository;
use crate::effects::Effect;
use crate::error::{EffectError, Result};

/// Builds effects from a borrowed [`EffectRepository`].
#[derive(Debug, Clone, Copy)]
pub struct EffectFactory<'a> {
    repo: &'a EffectRepository,
}

impl<'a> EffectFactory<'a> {
    /// Create a factory over a repository.
    pub fn new(repo: &'a EffectRepository) -> Self {
        Self { repo }
    }

    /// The repository this factory builds from.
    pub fn repository(&self) -> &'a EffectRepository {
        self.repo
    }

    /// Build a fresh effect for `name`, with its commit bound and its
    /// lifecycle hooks registered on the effect's own listener.
    ///
    /// Fails if the name is unknown or the row has no commit bound yet.
    pub fn create(&self, name: &str) -> Result<Effect> {
        let row = self
            .repo
            .get(name)
            .ok_or_else(|| EffectError::UnknownEffect(name.to_string()))?;
        let commit = row
            .commit
            .clone()
            .ok_or_else(|| EffectError::CommitNotBound(name.to_string()))?;

        let mut effect = Effect::new(row.data.clone())?;
        effect.bind_commit(commit);
        for (event_type, handler) in &row.events {
            if !effect.events().add_listener(event_type.clone(), handler.clone()) {
                debug!(effect = %name, %event_type, "Hook already bound on new effect, skipped");
            }
        }

        debug!(effect = %name, id = %effect.id(), hooks = row.events.len(), "Effect created");
        Ok(effect)
    }
}
