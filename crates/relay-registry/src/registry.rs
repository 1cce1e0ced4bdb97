//! The instance registry.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use relay_persist::JsonStore;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{RegistryError, Result};
use crate::token::TokenGenerator;
use crate::types::{Instance, InstanceUpdate, NewInstance, non_empty};

/// Snapshot name inside the state directory.
pub const SNAPSHOT_NAME: &str = "instances";

/// Token draws attempted before giving up on a unique token.
const MAX_TOKEN_ATTEMPTS: usize = 16;

/// Registry handle shared between the webhook server and command handlers.
pub type SharedRegistry = Arc<RwLock<InstanceRegistry>>;

/// Name → instance mapping, optionally backed by a JSON snapshot.
#[derive(Debug)]
pub struct InstanceRegistry {
    instances: BTreeMap<String, Instance>,
    tokens: TokenGenerator,
    store: Option<JsonStore>,
}

impl InstanceRegistry {
    /// Opens the registry persisted in `state_dir`, starting empty when no
    /// snapshot exists yet.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Persist` if the snapshot exists but cannot be
    /// read.
    pub fn open(state_dir: &Path, tokens: TokenGenerator) -> Result<Self> {
        let store = JsonStore::new(state_dir, SNAPSHOT_NAME);
        let instances: BTreeMap<String, Instance> = store.try_load()?;
        info!(
            count = instances.len(),
            path = %store.path().display(),
            "loaded Grafana instances"
        );
        Ok(Self {
            instances,
            tokens,
            store: Some(store),
        })
    }

    /// Creates an empty registry that is never written to disk.
    #[must_use]
    pub fn in_memory(tokens: TokenGenerator) -> Self {
        Self {
            instances: BTreeMap::new(),
            tokens,
            store: None,
        }
    }

    /// Wraps the registry for sharing across tasks.
    #[must_use]
    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Registers a new instance with a freshly generated token.
    pub fn add(&mut self, request: NewInstance) -> Result<Instance> {
        request.validate()?;
        if self.instances.contains_key(&request.name) {
            return Err(RegistryError::AlreadyExists { name: request.name });
        }

        let token = self.unique_token()?;
        let now = Utc::now();
        let instance = Instance {
            name: request.name,
            token,
            room: request.room,
            show_images: request.show_images,
            link_regex_find: request.link_regex_find.and_then(non_empty),
            link_regex_replace: request.link_regex_replace,
            url: request.url,
            created_at: now,
            updated_at: now,
        };

        info!(
            name = %instance.name,
            room = %instance.room,
            token = %instance.token_hint(),
            "registered Grafana instance"
        );
        self.instances
            .insert(instance.name.clone(), instance.clone());
        self.snapshot();
        Ok(instance)
    }

    /// Applies `update` to the named instance.
    pub fn update(&mut self, name: &str, update: InstanceUpdate) -> Result<Instance> {
        let instance = self
            .instances
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })?;

        // A rejected update leaves the stored record untouched.
        let mut updated = instance.clone();
        update.apply(&mut updated)?;
        *instance = updated.clone();

        info!(name = %name, room = %updated.room, "updated Grafana instance");
        self.snapshot();
        Ok(updated)
    }

    /// Removes the named instance, returning the room it posted to.
    pub fn delete(&mut self, name: &str) -> Result<String> {
        let removed = self
            .instances
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })?;

        info!(name = %name, room = %removed.room, "deleted Grafana instance");
        self.snapshot();
        Ok(removed.room)
    }

    /// All instances, ordered by name.
    pub fn list(&self) -> Vec<Instance> {
        self.instances.values().cloned().collect()
    }

    /// Looks up an instance by name.
    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.instances.get(name)
    }

    /// Finds the instance owning `token`.
    ///
    /// Every record is compared in constant time so response timing does not
    /// reveal how much of a guessed token was right.
    pub fn find_by_token(&self, token: &str) -> Result<&Instance> {
        if token.is_empty() {
            return Err(RegistryError::UnknownToken);
        }

        let mut found = None;
        for instance in self.instances.values() {
            if bool::from(instance.token.as_bytes().ct_eq(token.as_bytes())) {
                found = Some(instance);
            }
        }
        found.ok_or(RegistryError::UnknownToken)
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns true if no instance is registered.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// The token generator in use.
    pub const fn token_generator(&self) -> TokenGenerator {
        self.tokens
    }

    fn unique_token(&self) -> Result<String> {
        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let token = self.tokens.generate();
            if self.instances.values().all(|i| i.token != token) {
                return Ok(token);
            }
            debug!(attempt, "generated token collides, drawing again");
        }
        Err(RegistryError::TokenSpaceExhausted {
            attempts: MAX_TOKEN_ATTEMPTS,
        })
    }

    fn snapshot(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.instances) {
                warn!(error = %e, "failed to snapshot instance registry");
            }
        }
    }
}
