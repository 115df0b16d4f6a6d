//! Fetch-or-create, ownership check and at-most-once key fill for managed secrets.

use super::error::{SecretError, StoreError, StoreOperation};
use super::generators;
use super::spec::{SecretLabels, SecretSpec, SecretType};
use super::store::{SecretRecord, SecretStore};
use crate::traits::Output;

/// What a reconcile call did to the requested key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Generated,
    AlreadyPresent,
}

fn store_error(
    operation: StoreOperation,
    namespace: &str,
    name: &str,
) -> impl FnOnce(StoreError) -> SecretError {
    let namespace = namespace.to_string();
    let name = name.to_string();
    move |source| SecretError::Store {
        operation,
        namespace,
        name,
        source,
    }
}

/// Ensure `key` of secret `namespace/name` holds generated material of `secret_type`.
///
/// A missing secret is created empty with `labels`. An existing one must carry the
/// ownership label, otherwise nothing is written. Labels are always reset to
/// `labels`; a key that already has a value is never regenerated. The record is
/// written back with a single update in every successful path.
pub fn reconcile(
    store: &dyn SecretStore,
    labels: &SecretLabels,
    namespace: &str,
    name: &str,
    key: &str,
    secret_type: SecretType,
) -> Result<ReconcileOutcome, SecretError> {
    let fetched = store
        .get(namespace, name)
        .map_err(store_error(StoreOperation::Get, namespace, name))?;

    let mut record = match fetched {
        None => {
            let empty = SecretRecord::new(namespace, name, labels.as_map().clone());
            store
                .create(&empty)
                .map_err(store_error(StoreOperation::Create, namespace, name))?
        }
        Some(mut existing) => {
            if !SecretLabels::is_managed(&existing.labels) {
                return Err(SecretError::OwnershipViolation {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                });
            }
            existing.labels = labels.as_map().clone();
            existing
        }
    };

    let outcome = if record.data.contains_key(key) {
        ReconcileOutcome::AlreadyPresent
    } else {
        let value = generators::generate(secret_type).map_err(|e| SecretError::KeyGeneration {
            name: name.to_string(),
            key: key.to_string(),
            secret_type,
            message: format!("{:#}", e),
        })?;
        record.data.insert(key.to_string(), value);
        ReconcileOutcome::Generated
    };

    store
        .update(&record)
        .map_err(store_error(StoreOperation::Update, namespace, name))?;

    Ok(outcome)
}

/// Reconcile each spec in order, stopping at the first failure
pub fn reconcile_all(
    store: &dyn SecretStore,
    labels: &SecretLabels,
    namespace: &str,
    specs: &[SecretSpec],
    output: &dyn Output,
) -> Result<(), SecretError> {
    for spec in specs {
        let outcome = reconcile(
            store,
            labels,
            namespace,
            &spec.name,
            &spec.key,
            spec.secret_type,
        )?;

        match outcome {
            ReconcileOutcome::Generated => output.success(&format!(
                "Generated {} for secret {}:{}",
                spec.secret_type, spec.name, spec.key
            )),
            ReconcileOutcome::AlreadyPresent => output.dimmed(&format!(
                "Secret {}:{} already set, labels refreshed",
                spec.name, spec.key
            )),
        }
    }

    Ok(())
}
