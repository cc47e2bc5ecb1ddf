use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::credentials::PROTECTED_USER_FIELDS;
use crate::auth::Session;
use crate::error::{Result, StoreError};
use crate::record::{Collection, DeleteConfirmation, Record};
use crate::resource::{ResourceType, USERS};
use crate::seed::{self, NoSeeds, SeedSource};
use crate::storage::KeyValueStore;

/// Read-through, write-through store over named resource collections.
///
/// The store keeps no collection in memory between calls: every operation
/// reads the persisted collection, and every write persists the complete
/// collection again. Writes to one resource type are serialized by a
/// per-type async lock held across the read-modify-write.
pub struct ResourceStore<F = NoSeeds> {
    kv: Arc<dyn KeyValueStore>,
    seeds: F,
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<F: SeedSource> ResourceStore<F> {
    pub fn new(kv: Arc<dyn KeyValueStore>, seeds: F) -> Self {
        Self {
            kv,
            seeds,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.kv
    }

    // ===== Reads =====

    /// Return the whole collection for `path`, seeding the cache on a miss.
    ///
    /// Unknown resource types without a seed document resolve to an empty
    /// collection, which is persisted like any other.
    pub async fn fetch_collection(&self, path: &str) -> Result<Collection> {
        let resource = ResourceType::from_path(path)?;
        if let Some(records) = self.read_cached_or_discard(&resource)? {
            debug!(%resource, count = records.len(), "Cache hit");
            return Ok(records);
        }

        let lock = self.lock_for(&resource);
        let _guard = lock.lock().await;
        self.load(&resource).await
    }

    /// Look up one record by id. No session required.
    pub async fn get_record(&self, path: &str, id: &str) -> Result<Record> {
        let resource = ResourceType::from_path(path)?;
        self.fetch_collection(path)
            .await?
            .into_iter()
            .find(|record| record.id() == Some(id))
            .ok_or_else(|| StoreError::not_found(resource.as_str(), id))
    }

    /// Read-through filtered view of a collection
    pub async fn find_records<P>(&self, path: &str, predicate: P) -> Result<Collection>
    where
        P: Fn(&Record) -> bool,
    {
        let records = self.fetch_collection(path).await?;
        Ok(records.into_iter().filter(|record| predicate(record)).collect())
    }

    /// Whether the collection for `path` is currently cached
    pub fn is_cached(&self, path: &str) -> Result<bool> {
        let resource = ResourceType::from_path(path)?;
        self.kv.contains(&resource.cache_key())
    }

    // ===== Writes =====

    /// Append a record, assigning `id` and `createdAt` when absent.
    /// Plaintext passwords on `users` records are hashed before storing.
    pub async fn create_record(
        &self,
        session: Option<&Session>,
        path: &str,
        record: Record,
    ) -> Result<Record> {
        require_session(session)?;
        let resource = ResourceType::from_path(path)?;
        let prefix = resource.id_prefix();
        self.append(&resource, record, &prefix, |_| Ok(())).await
    }

    /// Shallow-merge `partial` into the record with `id` and stamp `updatedAt`.
    ///
    /// On `users`, credential and identity fields cannot be changed this way
    /// and are rejected with `InvalidInput`.
    pub async fn update_record(
        &self,
        session: Option<&Session>,
        path: &str,
        id: &str,
        partial: Record,
    ) -> Result<Record> {
        require_session(session)?;
        let resource = ResourceType::from_path(path)?;
        if resource.as_str() == USERS {
            if let Some(field) = PROTECTED_USER_FIELDS.iter().find(|field| partial.contains(field)) {
                return Err(StoreError::InvalidInput(format!(
                    "{} cannot be changed on users",
                    field
                )));
            }
        }
        let now = Utc::now();
        self.modify(&resource, |records| {
            let record = records
                .iter_mut()
                .find(|record| record.id() == Some(id))
                .ok_or_else(|| StoreError::not_found(resource.as_str(), id))?;
            record.merge(partial, now);
            Ok(record.clone())
        })
        .await
    }

    /// Remove the record with `id`. Removing a missing id is `NotFound`.
    pub async fn delete_record(
        &self,
        session: Option<&Session>,
        path: &str,
        id: &str,
    ) -> Result<DeleteConfirmation> {
        require_session(session)?;
        let resource = ResourceType::from_path(path)?;
        self.modify(&resource, |records| {
            let before = records.len();
            records.retain(|record| record.id() != Some(id));
            if records.len() == before {
                return Err(StoreError::not_found(resource.as_str(), id));
            }
            Ok(DeleteConfirmation {
                deleted: true,
                id: id.to_string(),
            })
        })
        .await
    }

    /// Drop the cached collection; the next read seeds it again.
    pub async fn clear_collection(&self, session: Option<&Session>, path: &str) -> Result<()> {
        require_session(session)?;
        let resource = ResourceType::from_path(path)?;
        let lock = self.lock_for(&resource);
        let _guard = lock.lock().await;
        self.kv.remove(&resource.cache_key())?;
        info!(%resource, "Collection cleared");
        Ok(())
    }

    /// Replace the cached collection with fresh seed data.
    ///
    /// Unlike `fetch_collection` this fails with `SeedUnavailable` when the
    /// type has neither a seed document nor a fallback, leaving the cache as
    /// it was.
    pub async fn refresh_collection(&self, path: &str) -> Result<Collection> {
        let resource = ResourceType::from_path(path)?;
        let lock = self.lock_for(&resource);
        let _guard = lock.lock().await;

        match seed::seed_collection(&self.seeds, &resource, Utc::now()).await? {
            Some((_, records)) => {
                self.persist(&resource, &records)?;
                Ok(records)
            }
            None => Err(StoreError::SeedUnavailable(resource.to_string())),
        }
    }

    /// Warm several collections at once. Returns each path with the
    /// resulting collection size or the error that stopped it.
    pub async fn seed_all(&self, paths: &[&str]) -> Vec<(String, Result<usize>)> {
        let loads = paths.iter().map(|path| async move {
            let result = self.fetch_collection(path).await.map(|records| records.len());
            (path.to_string(), result)
        });
        join_all(loads).await
    }

    // ===== Internals =====

    /// Append under the type lock. `check` sees the current collection
    /// first and can veto the insert. Generated ids are `<id_prefix><millis>`.
    pub(crate) async fn append<C>(
        &self,
        resource: &ResourceType,
        record: Record,
        id_prefix: &str,
        check: C,
    ) -> Result<Record>
    where
        C: FnOnce(&Collection) -> Result<()>,
    {
        let mut record = seed::prepare_record(resource, record)?;
        let now = Utc::now();
        self.modify(resource, |records| {
            check(records)?;
            if let Some(id) = record.id().filter(|id| !id.is_empty()) {
                if records.iter().any(|existing| existing.id() == Some(id)) {
                    return Err(StoreError::DuplicateId {
                        resource: resource.to_string(),
                        id: id.to_string(),
                    });
                }
            }
            record.stamp_created(|| generate_id(id_prefix, records, now), now)?;
            records.push(record.clone());
            Ok(record)
        })
        .await
    }

    /// Read-modify-write under the type lock. Nothing is persisted when
    /// `mutate` fails.
    pub(crate) async fn modify<T, M>(&self, resource: &ResourceType, mutate: M) -> Result<T>
    where
        M: FnOnce(&mut Collection) -> Result<T>,
    {
        let lock = self.lock_for(resource);
        let _guard = lock.lock().await;

        let mut records = self.load(resource).await?;
        let out = mutate(&mut records)?;
        self.persist(resource, &records)?;
        Ok(out)
    }

    /// Cached collection or freshly seeded one. Caller holds the type lock.
    async fn load(&self, resource: &ResourceType) -> Result<Collection> {
        // Re-check: another task may have seeded while we waited on the lock
        if let Some(records) = self.read_cached_or_discard(resource)? {
            return Ok(records);
        }

        let records = match seed::seed_collection(&self.seeds, resource, Utc::now()).await? {
            Some((_, records)) => records,
            None => {
                warn!(%resource, "No seed data or fallback, starting empty");
                Vec::new()
            }
        };
        self.persist(resource, &records)?;
        Ok(records)
    }

    /// Cached collection, discarding the key if its contents are corrupted
    fn read_cached_or_discard(&self, resource: &ResourceType) -> Result<Option<Collection>> {
        match self.read_cached(resource) {
            Err(StoreError::MalformedCache { key, reason }) => {
                warn!(%key, %reason, "Discarding corrupted cache entry");
                self.kv.remove(&key)?;
                Ok(None)
            }
            other => other,
        }
    }

    fn read_cached(&self, resource: &ResourceType) -> Result<Option<Collection>> {
        let key = resource.cache_key();
        let Some(contents) = self.kv.get(&key)? else {
            return Ok(None);
        };
        seed::parse_collection(&contents)
            .map(Some)
            .map_err(|e| StoreError::malformed(&key, e))
    }

    fn persist(&self, resource: &ResourceType, records: &Collection) -> Result<()> {
        let contents = serde_json::to_string(records)?;
        self.kv.set(&resource.cache_key(), &contents)
    }

    fn lock_for(&self, resource: &ResourceType) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(resource.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn require_session(session: Option<&Session>) -> Result<&Session> {
    match session {
        Some(session) if session.is_valid() => Ok(session),
        _ => Err(StoreError::AuthRequired),
    }
}

/// `<prefix><millis>`, advanced past any id already in the collection
fn generate_id(prefix: &str, records: &Collection, now: DateTime<Utc>) -> String {
    let mut millis = now.timestamp_millis();
    loop {
        let candidate = format!("{}{}", prefix, millis);
        if !records.iter().any(|record| record.id() == Some(candidate.as_str())) {
            return candidate;
        }
        millis += 1;
    }
}

// ============================================================================
// Tests
// ============================================================================
