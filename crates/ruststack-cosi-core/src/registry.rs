//! In-memory resource registry for buckets and account grants.
//!
//! The registry maps caller-supplied names to generated identifiers and
//! guarantees that concurrent duplicate requests converge on one record.
//!
//! Locking follows a fixed order: the bucket index lock is always taken
//! before any per-bucket account lock. Account mutations keep the bucket
//! index read-locked for their whole duration, so a bucket cannot disappear
//! between the existence check and the grant mutation. No lock is ever held
//! across an `.await`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use ruststack_cosi_model::Parameters;

use crate::error::RegistryError;

/// Identifier of a bucket record.
pub type BucketId = Uuid;

/// Identifier of an account grant, scoped to its bucket.
pub type AccountId = Uuid;

/// Outcome of an `ensure_*` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensured<T> {
    /// This call allocated the record.
    Created(T),
    /// An equal record was already live.
    Existing(T),
}

impl<T: Copy> Ensured<T> {
    /// The identifier, regardless of who allocated it.
    #[must_use]
    pub fn id(&self) -> T {
        match self {
            Self::Created(id) | Self::Existing(id) => *id,
        }
    }

    /// Whether this call allocated the record.
    #[must_use]
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// A live account grant.
#[derive(Debug)]
pub struct AccountRecord {
    /// Generated identifier.
    pub id: AccountId,
    /// Account name, unique within the bucket.
    pub name: String,
    /// Opaque access policy.
    pub access_policy: String,
    /// Grant parameters.
    pub parameters: Parameters,
    /// When the grant was recorded.
    pub created_at: DateTime<Utc>,
    confirmed: AtomicBool,
}

impl AccountRecord {
    fn new(name: &str, access_policy: &str, parameters: &Parameters) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            access_policy: access_policy.to_owned(),
            parameters: parameters.clone(),
            created_at: Utc::now(),
            confirmed: AtomicBool::new(false),
        }
    }

    /// Whether a backend grant has been confirmed for this record.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.confirmed.load(Ordering::Acquire)
    }

    /// Time since the grant was recorded.
    #[must_use]
    pub fn age(&self) -> TimeDelta {
        Utc::now() - self.created_at
    }
}

#[derive(Debug, Default)]
struct AccountIndex {
    by_name: HashMap<String, Arc<AccountRecord>>,
    by_id: HashMap<AccountId, Arc<AccountRecord>>,
}

impl AccountIndex {
    fn matching(
        &self,
        name: &str,
        access_policy: &str,
        parameters: &Parameters,
    ) -> Result<Option<AccountId>, RegistryError> {
        let Some(existing) = self.by_name.get(name) else {
            return Ok(None);
        };
        if existing.parameters != *parameters {
            return Err(RegistryError::AccountParametersConflict {
                name: name.to_owned(),
            });
        }
        if existing.access_policy != access_policy {
            return Err(RegistryError::AccountPolicyConflict {
                name: name.to_owned(),
            });
        }
        Ok(Some(existing.id))
    }

    fn remove(&mut self, id: AccountId) -> Option<Arc<AccountRecord>> {
        let record = self.by_id.remove(&id)?;
        self.by_name.remove(&record.name);
        Some(record)
    }
}

/// A live bucket and its grants.
#[derive(Debug)]
pub struct BucketRecord {
    /// Generated identifier.
    pub id: BucketId,
    /// Caller name, unique among live buckets.
    pub name: String,
    /// Bucket parameters, immutable for the lifetime of the identifier.
    pub parameters: Parameters,
    /// When the bucket was recorded.
    pub created_at: DateTime<Utc>,
    confirmed: AtomicBool,
    accounts: RwLock<AccountIndex>,
}

impl BucketRecord {
    fn new(name: &str, parameters: &Parameters) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            parameters: parameters.clone(),
            created_at: Utc::now(),
            confirmed: AtomicBool::new(false),
            accounts: RwLock::new(AccountIndex::default()),
        }
    }

    /// Whether the backend bucket has been confirmed for this record.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.confirmed.load(Ordering::Acquire)
    }

    /// Time since the bucket was recorded.
    #[must_use]
    pub fn age(&self) -> TimeDelta {
        Utc::now() - self.created_at
    }

    /// Number of live grants on this bucket.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.accounts.read().by_id.len()
    }

    /// Look up a grant by account name.
    #[must_use]
    pub fn account_by_name(&self, name: &str) -> Option<Arc<AccountRecord>> {
        self.accounts.read().by_name.get(name).cloned()
    }
}

#[derive(Debug, Default)]
struct BucketIndex {
    by_name: HashMap<String, Arc<BucketRecord>>,
    by_id: HashMap<BucketId, Arc<BucketRecord>>,
}

impl BucketIndex {
    fn matching(
        &self,
        name: &str,
        parameters: &Parameters,
    ) -> Result<Option<BucketId>, RegistryError> {
        match self.by_name.get(name) {
            None => Ok(None),
            Some(existing) if existing.parameters == *parameters => Ok(Some(existing.id)),
            Some(_) => Err(RegistryError::BucketConflict {
                name: name.to_owned(),
            }),
        }
    }

    fn remove(&mut self, id: BucketId) -> Option<Arc<BucketRecord>> {
        let record = self.by_id.remove(&id)?;
        self.by_name.remove(&record.name);
        Some(record)
    }
}

/// Registry of live buckets and their account grants.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    buckets: RwLock<BucketIndex>,
}

impl ResourceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the identifier of the live bucket named `name`, allocating one
    /// if no such bucket exists.
    ///
    /// Concurrent calls with the same name and parameters all observe the
    /// same identifier and exactly one of them gets [`Ensured::Created`].
    pub fn ensure_bucket(
        &self,
        name: &str,
        parameters: &Parameters,
    ) -> Result<Ensured<BucketId>, RegistryError> {
        {
            let index = self.buckets.read();
            if let Some(id) = index.matching(name, parameters)? {
                return Ok(Ensured::Existing(id));
            }
        }

        let mut index = self.buckets.write();
        // Another request may have allocated while we waited for the write lock.
        if let Some(id) = index.matching(name, parameters)? {
            return Ok(Ensured::Existing(id));
        }

        let record = Arc::new(BucketRecord::new(name, parameters));
        let id = record.id;
        index.by_name.insert(record.name.clone(), Arc::clone(&record));
        index.by_id.insert(id, record);
        tracing::debug!(bucket = %name, bucket_id = %id, "allocated bucket record");
        Ok(Ensured::Created(id))
    }

    /// Mark the bucket as backed by a real backend bucket.
    ///
    /// Returns `false` when the record is no longer live.
    pub fn confirm_bucket(&self, id: BucketId) -> bool {
        let index = self.buckets.read();
        index.by_id.get(&id).is_some_and(|record| {
            record.confirmed.store(true, Ordering::Release);
            true
        })
    }

    /// Remove a bucket and all of its grants. Absent ids are a no-op.
    pub fn forget_bucket(&self, id: BucketId) -> Option<Arc<BucketRecord>> {
        let removed = self.buckets.write().remove(id);
        if let Some(record) = &removed {
            tracing::debug!(bucket = %record.name, bucket_id = %id, "forgot bucket record");
        }
        removed
    }

    /// Remove a bucket only if no request has confirmed it yet.
    ///
    /// Returns `true` when the record was removed.
    pub fn forget_unconfirmed_bucket(&self, id: BucketId) -> bool {
        let mut index = self.buckets.write();
        match index.by_id.get(&id) {
            Some(record) if !record.is_confirmed() => index.remove(id).is_some(),
            _ => false,
        }
    }

    /// Return the identifier of the live grant for `account_name` on the
    /// bucket, allocating one if none exists.
    ///
    /// Parameters are compared before the access policy, so a request that
    /// differs in both reports a parameter conflict.
    pub fn ensure_account(
        &self,
        bucket_id: BucketId,
        account_name: &str,
        access_policy: &str,
        parameters: &Parameters,
    ) -> Result<Ensured<AccountId>, RegistryError> {
        let index = self.buckets.read();
        let bucket = index
            .by_id
            .get(&bucket_id)
            .ok_or(RegistryError::BucketNotFound(bucket_id))?;

        {
            let accounts = bucket.accounts.read();
            if let Some(id) = accounts.matching(account_name, access_policy, parameters)? {
                return Ok(Ensured::Existing(id));
            }
        }

        let mut accounts = bucket.accounts.write();
        if let Some(id) = accounts.matching(account_name, access_policy, parameters)? {
            return Ok(Ensured::Existing(id));
        }

        let record = Arc::new(AccountRecord::new(account_name, access_policy, parameters));
        let id = record.id;
        accounts
            .by_name
            .insert(record.name.clone(), Arc::clone(&record));
        accounts.by_id.insert(id, record);
        tracing::debug!(
            bucket_id = %bucket_id,
            account = %account_name,
            account_id = %id,
            "allocated account record",
        );
        Ok(Ensured::Created(id))
    }

    /// Mark the grant as backed by real backend credentials.
    ///
    /// Returns `false` when the bucket or the grant is no longer live.
    pub fn confirm_account(&self, bucket_id: BucketId, account_id: AccountId) -> bool {
        let index = self.buckets.read();
        let Some(bucket) = index.by_id.get(&bucket_id) else {
            return false;
        };
        bucket
            .accounts
            .read()
            .by_id
            .get(&account_id)
            .is_some_and(|record| {
                record.confirmed.store(true, Ordering::Release);
                true
            })
    }

    /// Remove a grant from its bucket.
    ///
    /// An absent bucket is an error; an absent grant is `Ok(None)`.
    pub fn forget_account(
        &self,
        bucket_id: BucketId,
        account_id: AccountId,
    ) -> Result<Option<Arc<AccountRecord>>, RegistryError> {
        let index = self.buckets.read();
        let bucket = index
            .by_id
            .get(&bucket_id)
            .ok_or(RegistryError::BucketNotFound(bucket_id))?;
        let removed = bucket.accounts.write().remove(account_id);
        if let Some(record) = &removed {
            tracing::debug!(
                bucket_id = %bucket_id,
                account = %record.name,
                account_id = %account_id,
                "forgot account record",
            );
        }
        Ok(removed)
    }

    /// Remove a grant only if no request has confirmed it yet.
    pub fn forget_unconfirmed_account(&self, bucket_id: BucketId, account_id: AccountId) -> bool {
        let index = self.buckets.read();
        let Some(bucket) = index.by_id.get(&bucket_id) else {
            return false;
        };
        let mut accounts = bucket.accounts.write();
        match accounts.by_id.get(&account_id) {
            Some(record) if !record.is_confirmed() => accounts.remove(account_id).is_some(),
            _ => false,
        }
    }

    /// Look up a live bucket by identifier.
    #[must_use]
    pub fn bucket(&self, id: BucketId) -> Option<Arc<BucketRecord>> {
        self.buckets.read().by_id.get(&id).cloned()
    }

    /// Look up a live bucket by name.
    #[must_use]
    pub fn bucket_by_name(&self, name: &str) -> Option<Arc<BucketRecord>> {
        self.buckets.read().by_name.get(name).cloned()
    }

    /// Look up a live grant.
    #[must_use]
    pub fn account(&self, bucket_id: BucketId, account_id: AccountId) -> Option<Arc<AccountRecord>> {
        let index = self.buckets.read();
        let bucket = index.by_id.get(&bucket_id)?;
        bucket.accounts.read().by_id.get(&account_id).cloned()
    }

    /// Number of live buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.read().by_id.len()
    }

    /// All live buckets, sorted by name.
    #[must_use]
    pub fn list_buckets(&self) -> Vec<Arc<BucketRecord>> {
        let mut buckets: Vec<_> = self.buckets.read().by_id.values().cloned().collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        buckets
    }

    /// Drop every record.
    pub fn reset(&self) {
        let mut index = self.buckets.write();
        index.by_name.clear();
        index.by_id.clear();
    }
}
