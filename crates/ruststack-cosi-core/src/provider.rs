//! COSI provider implementing the identity and provisioner operations.
//!
//! Every provisioner call first settles the registry, then converges the
//! backend. A record allocated by a request is rolled back if that request's
//! backend call fails or its future is dropped, unless a concurrent duplicate
//! has already confirmed it.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use ruststack_cosi_model::error::CosiError;
use ruststack_cosi_model::input::{
    DriverCreateBucketInput, DriverDeleteBucketInput, DriverGetInfoInput,
    DriverGrantBucketAccessInput, DriverRevokeBucketAccessInput,
};
use ruststack_cosi_model::operations::CosiOperation;
use ruststack_cosi_model::output::{
    DriverCreateBucketOutput, DriverDeleteBucketOutput, DriverGetInfoOutput,
    DriverGrantBucketAccessOutput, DriverRevokeBucketAccessOutput,
};
use ruststack_cosi_model::{Parameters, Protocol};

use crate::backend::ObjectStorageBackend;
use crate::config::CosiConfig;
use crate::error::{RegistryError, backend_error_to_cosi};
use crate::registry::{AccountId, BucketId, ResourceRegistry};

/// A registry allocation that must be undone unless the request completes.
#[derive(Debug, Clone, Copy)]
enum Allocation {
    Bucket(BucketId),
    Account(BucketId, AccountId),
}

/// Reverts an allocation on drop unless disarmed.
struct RollbackGuard<'a> {
    registry: &'a ResourceRegistry,
    allocation: Option<Allocation>,
}

impl<'a> RollbackGuard<'a> {
    fn new(registry: &'a ResourceRegistry, allocation: Option<Allocation>) -> Self {
        Self {
            registry,
            allocation,
        }
    }

    fn disarm(mut self) {
        self.allocation = None;
    }
}

impl Drop for RollbackGuard<'_> {
    fn drop(&mut self) {
        match self.allocation.take() {
            Some(Allocation::Bucket(id)) => {
                if self.registry.forget_unconfirmed_bucket(id) {
                    warn!(bucket_id = %id, "rolled back bucket allocation");
                }
            }
            Some(Allocation::Account(bucket_id, account_id)) => {
                if self
                    .registry
                    .forget_unconfirmed_account(bucket_id, account_id)
                {
                    warn!(%bucket_id, %account_id, "rolled back account allocation");
                }
            }
            None => {}
        }
    }
}

/// Parse a wire identifier.
fn parse_id(raw: &str, what: &str) -> Result<Uuid, CosiError> {
    Uuid::parse_str(raw).map_err(|_| CosiError::invalid_argument(format!("Invalid {what}: {raw:?}")))
}

fn no_such_bucket(id: BucketId) -> CosiError {
    CosiError::not_found(format!("No such bucket: {id}"))
}

/// COSI driver provider.
#[derive(Debug)]
pub struct RustStackCosi {
    /// Registry owning all bucket and grant records.
    pub registry: Arc<ResourceRegistry>,
    /// Configuration.
    pub config: Arc<CosiConfig>,
    backend: Arc<dyn ObjectStorageBackend>,
}

impl RustStackCosi {
    /// Create a provider over `backend` with an empty registry.
    #[must_use]
    pub fn new(config: CosiConfig, backend: Arc<dyn ObjectStorageBackend>) -> Self {
        Self {
            registry: Arc::new(ResourceRegistry::new()),
            config: Arc::new(config),
            backend,
        }
    }

    /// Fail with the configured error for `op`, if one is declared.
    fn inject(&self, op: CosiOperation) -> Result<(), CosiError> {
        match self.config.errors.for_operation(op) {
            Some(injected) => {
                warn!(operation = %op, code = %injected.code, "purposefully failing call");
                Err(injected.to_cosi_error())
            }
            None => Ok(()),
        }
    }

    /// Reject requests for a protocol the backend does not serve.
    fn validate_protocol(&self, requested: Option<&Protocol>) -> Result<Protocol, CosiError> {
        let supported = self.backend.protocol_info();
        match requested {
            Some(p) if p.kind() == supported.kind() => Ok(supported),
            Some(p) => Err(CosiError::invalid_argument(format!(
                "Only {} buckets are supported by this driver, got {}",
                supported.kind(),
                p.kind(),
            ))),
            None => Err(CosiError::invalid_argument("Protocol is required")),
        }
    }

    /// Make the backend bucket exist with `parameters`.
    async fn converge_bucket(&self, name: &str, parameters: &Parameters) -> Result<(), CosiError> {
        let exists = self
            .backend
            .bucket_exists(name)
            .await
            .map_err(backend_error_to_cosi)?;

        if exists {
            let equal = self
                .backend
                .is_bucket_equal(name, parameters)
                .await
                .map_err(backend_error_to_cosi)?;
            if !equal {
                return Err(CosiError::already_exists(format!(
                    "bucket already exists: {name}"
                )));
            }
            debug!(bucket = %name, "backend bucket already present");
            return Ok(());
        }

        self.backend
            .create_bucket(name, parameters)
            .await
            .map_err(backend_error_to_cosi)
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

impl RustStackCosi {
    /// Handle `DriverGetInfo`.
    pub fn handle_get_info(
        &self,
        _input: DriverGetInfoInput,
    ) -> Result<DriverGetInfoOutput, CosiError> {
        self.inject(CosiOperation::DriverGetInfo)?;

        if self.config.driver_name.is_empty() {
            return Err(CosiError::internal_error("empty driver name"));
        }
        Ok(DriverGetInfoOutput {
            name: self.config.driver_name.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Provisioner
// ---------------------------------------------------------------------------

impl RustStackCosi {
    /// Handle `DriverCreateBucket`.
    ///
    /// Returns the same identifier for every request with the same name and
    /// parameters while the bucket is live.
    pub async fn handle_create_bucket(
        &self,
        input: DriverCreateBucketInput,
    ) -> Result<DriverCreateBucketOutput, CosiError> {
        self.inject(CosiOperation::DriverCreateBucket)?;

        if input.name.is_empty() {
            return Err(CosiError::invalid_argument("Bucket name is required"));
        }
        let protocol = self.validate_protocol(input.protocol.as_ref())?;

        let ensured = self
            .registry
            .ensure_bucket(&input.name, &input.parameters)
            .inspect_err(|e| info!(bucket = %input.name, error = %e, "bucket create rejected"))?;
        let id = ensured.id();
        let guard = RollbackGuard::new(
            &self.registry,
            ensured.is_created().then_some(Allocation::Bucket(id)),
        );

        self.converge_bucket(&input.name, &input.parameters).await?;

        if !self.registry.confirm_bucket(id) {
            return Err(CosiError::internal_error(format!(
                "bucket {} was removed while being provisioned",
                input.name
            )));
        }
        guard.disarm();

        if ensured.is_created() {
            info!(bucket = %input.name, bucket_id = %id, "bucket created");
        } else {
            debug!(bucket = %input.name, bucket_id = %id, "bucket already exists");
        }

        Ok(DriverCreateBucketOutput {
            bucket_id: id.to_string(),
            bucket_info: Some(protocol),
        })
    }

    /// Handle `DriverDeleteBucket`. Deleting an absent bucket succeeds.
    pub async fn handle_delete_bucket(
        &self,
        input: DriverDeleteBucketInput,
    ) -> Result<DriverDeleteBucketOutput, CosiError> {
        self.inject(CosiOperation::DriverDeleteBucket)?;
        let id = parse_id(&input.bucket_id, "BucketId")?;

        let Some(record) = self.registry.bucket(id) else {
            debug!(bucket_id = %id, "bucket already absent");
            return Ok(DriverDeleteBucketOutput {});
        };

        self.backend
            .delete_bucket(&record.name)
            .await
            .map_err(backend_error_to_cosi)?;
        self.registry.forget_bucket(id);

        info!(
            bucket = %record.name,
            bucket_id = %id,
            age_secs = record.age().num_seconds(),
            "bucket deleted",
        );
        Ok(DriverDeleteBucketOutput {})
    }

    /// Handle `DriverGrantBucketAccess`.
    pub async fn handle_grant_bucket_access(
        &self,
        input: DriverGrantBucketAccessInput,
    ) -> Result<DriverGrantBucketAccessOutput, CosiError> {
        self.inject(CosiOperation::DriverGrantBucketAccess)?;
        let bucket_id = parse_id(&input.bucket_id, "BucketId")?;
        if input.account_name.is_empty() {
            return Err(CosiError::invalid_argument("Account name is required"));
        }

        let bucket = self
            .registry
            .bucket(bucket_id)
            .ok_or_else(|| no_such_bucket(bucket_id))?;

        let ensured = self
            .registry
            .ensure_account(
                bucket_id,
                &input.account_name,
                &input.access_policy,
                &input.parameters,
            )
            .inspect_err(|e| {
                info!(bucket = %bucket.name, account = %input.account_name, error = %e, "grant rejected");
            })?;
        let account_id = ensured.id();
        let guard = RollbackGuard::new(
            &self.registry,
            ensured
                .is_created()
                .then_some(Allocation::Account(bucket_id, account_id)),
        );

        let user = self
            .backend
            .create_bucket_access(&bucket.name, &input.account_name)
            .await
            .map_err(backend_error_to_cosi)?;

        if !self.registry.confirm_account(bucket_id, account_id) {
            return Err(CosiError::internal_error(format!(
                "access for {} was removed while being granted",
                input.account_name
            )));
        }
        guard.disarm();

        info!(
            bucket = %bucket.name,
            account = %input.account_name,
            %account_id,
            "bucket access granted",
        );
        Ok(DriverGrantBucketAccessOutput {
            account_id: account_id.to_string(),
            credentials: user.into_credential_map(),
        })
    }

    /// Handle `DriverRevokeBucketAccess`. Revoking an absent grant succeeds;
    /// revoking on an absent bucket is `NotFound`.
    pub async fn handle_revoke_bucket_access(
        &self,
        input: DriverRevokeBucketAccessInput,
    ) -> Result<DriverRevokeBucketAccessOutput, CosiError> {
        self.inject(CosiOperation::DriverRevokeBucketAccess)?;
        let bucket_id = parse_id(&input.bucket_id, "BucketId")?;
        let account_id = parse_id(&input.account_id, "AccountId")?;

        let bucket = self
            .registry
            .bucket(bucket_id)
            .ok_or_else(|| no_such_bucket(bucket_id))?;
        let Some(account) = self.registry.account(bucket_id, account_id) else {
            debug!(bucket = %bucket.name, %account_id, "access already revoked");
            return Ok(DriverRevokeBucketAccessOutput {});
        };

        self.backend
            .delete_bucket_access(&bucket.name, &account.name)
            .await
            .map_err(backend_error_to_cosi)?;

        match self.registry.forget_account(bucket_id, account_id) {
            // The bucket went away concurrently and took the grant with it.
            Ok(_) | Err(RegistryError::BucketNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        info!(
            bucket = %bucket.name,
            account = %account.name,
            age_secs = account.age().num_seconds(),
            "bucket access revoked",
        );
        Ok(DriverRevokeBucketAccessOutput {})
    }
}
