//! In-process [`DatabaseHandle`] that models a document database's
//! administrative surface.
//!
//! Collections start with the `_id_` index, index names follow the same
//! uniqueness rules as MongoDB, and creating an index on a missing
//! collection either creates the collection implicitly or fails, depending
//! on how the handle was built.

use crate::handle::{DatabaseHandle, HandleError};
use async_trait::async_trait;
use docseed_core::{
    CollectionSpec, IndexDescriptor, IndexKey, IndexSpec, RoleGrant, UserSpec,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct MemoryState {
    /// (database, username) -> role grants
    users: BTreeMap<(String, String), BTreeSet<RoleGrant>>,
    /// (database, collection) -> indexes
    collections: BTreeMap<(String, String), Vec<IndexDescriptor>>,
    mutations: usize,
}

#[derive(Debug)]
pub struct MemoryHandle {
    state: Mutex<MemoryState>,
    auto_create_collections: bool,
    denied_databases: HashSet<String>,
}

impl Default for MemoryHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHandle {
    /// A handle that creates collections implicitly on first index.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            auto_create_collections: true,
            denied_databases: HashSet::new(),
        }
    }

    /// A handle that requires collections to exist before indexing them.
    pub fn strict() -> Self {
        Self {
            auto_create_collections: false,
            ..Self::new()
        }
    }

    /// Reject every mutation targeting `database` with `PermissionDenied`.
    pub fn deny_database(mut self, database: impl Into<String>) -> Self {
        self.denied_databases.insert(database.into());
        self
    }

    /// Seed an existing collection with an extra index.
    pub async fn seed_index(&self, database: &str, collection: &str, index: IndexDescriptor) {
        let mut state = self.state.lock().await;
        state
            .collections
            .entry((database.to_string(), collection.to_string()))
            .or_insert_with(default_indexes)
            .push(index);
    }

    /// Number of successful mutations performed so far.
    pub async fn mutation_count(&self) -> usize {
        self.state.lock().await.mutations
    }

    pub async fn has_user(&self, database: &str, username: &str) -> bool {
        self.state
            .lock()
            .await
            .users
            .contains_key(&(database.to_string(), username.to_string()))
    }

    pub async fn has_collection(&self, database: &str, name: &str) -> bool {
        self.state
            .lock()
            .await
            .collections
            .contains_key(&(database.to_string(), name.to_string()))
    }

    fn check_access(&self, database: &str) -> Result<(), HandleError> {
        if self.denied_databases.contains(database) {
            return Err(HandleError::PermissionDenied(format!(
                "not authorized on {} to execute command",
                database
            )));
        }
        Ok(())
    }
}

fn default_indexes() -> Vec<IndexDescriptor> {
    vec![IndexDescriptor {
        name: "_id_".to_string(),
        keys: vec![IndexKey::asc("_id")],
        unique: false,
    }]
}

#[async_trait]
impl DatabaseHandle for MemoryHandle {
    async fn create_user(&self, user: &UserSpec) -> Result<(), HandleError> {
        self.check_access(&user.database)?;
        let mut state = self.state.lock().await;
        let key = (user.database.clone(), user.username.clone());
        if state.users.contains_key(&key) {
            return Err(HandleError::AlreadyExists(format!(
                "User \"{}@{}\" already exists",
                user.username, user.database
            )));
        }
        state.users.insert(key, user.roles.clone());
        state.mutations += 1;
        Ok(())
    }

    async fn create_collection(&self, collection: &CollectionSpec) -> Result<(), HandleError> {
        self.check_access(&collection.database)?;
        let mut state = self.state.lock().await;
        let key = (collection.database.clone(), collection.name.clone());
        if state.collections.contains_key(&key) {
            return Err(HandleError::AlreadyExists(format!(
                "Collection {}.{} already exists.",
                collection.database, collection.name
            )));
        }
        state.collections.insert(key, default_indexes());
        state.mutations += 1;
        Ok(())
    }

    async fn create_index(&self, index: &IndexSpec) -> Result<(), HandleError> {
        self.check_access(&index.database)?;
        let mut state = self.state.lock().await;
        let key = (index.database.clone(), index.collection.clone());

        if !state.collections.contains_key(&key) {
            if !self.auto_create_collections {
                return Err(HandleError::MissingDependency(format!(
                    "collection {}.{} does not exist",
                    index.database, index.collection
                )));
            }
            state.collections.insert(key.clone(), default_indexes());
        }

        let requested = IndexDescriptor::from(index);
        let indexes = state.collections.entry(key).or_insert_with(default_indexes);

        if let Some(found) = indexes.iter().find(|i| i.name == requested.name) {
            if *found == requested {
                return Err(HandleError::AlreadyExists(format!(
                    "index {} already exists",
                    requested.name
                )));
            }
            return Err(HandleError::DefinitionConflict(format!(
                "An existing index has the same name as the requested index: {}",
                requested.name
            )));
        }
        if let Some(found) = indexes.iter().find(|i| i.keys == requested.keys) {
            return Err(HandleError::DefinitionConflict(format!(
                "Index already exists with a different name: {}",
                found.name
            )));
        }

        indexes.push(requested);
        state.mutations += 1;
        Ok(())
    }

    async fn list_indexes(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<Vec<IndexDescriptor>, HandleError> {
        let state = self.state.lock().await;
        Ok(state
            .collections
            .get(&(database.to_string(), collection.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn user_exists(&self, database: &str, username: &str) -> Result<bool, HandleError> {
        Ok(self.has_user(database, username).await)
    }

    async fn collection_exists(&self, database: &str, name: &str) -> Result<bool, HandleError> {
        Ok(self.has_collection(database, name).await)
    }

    fn creates_collections_implicitly(&self) -> bool {
        self.auto_create_collections
    }
}
