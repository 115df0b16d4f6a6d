//! Kubernetes implementation of [`SecretStore`] on top of `kube`.
//!
//! The client configuration is inferred: kubeconfig when one is available,
//! otherwise the pod's service account. Calls are driven on a private
//! current-thread runtime so the rest of the tool stays synchronous.

use super::error::StoreError;
use super::store::{SecretRecord, SecretStore};
use crate::traits::FileSystem;
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client, api::PostParams};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tokio::runtime::{Builder, Runtime};

const SERVICE_ACCOUNT_NAMESPACE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// Secret store backed by the core/v1 Secrets API
pub struct KubernetesSecretStore {
    runtime: Runtime,
    client: Client,
    /// Last object seen per (namespace, name); updates start from it so fields
    /// not carried by [`SecretRecord`] are written back unchanged
    fetched: Mutex<BTreeMap<(String, String), Secret>>,
}

impl KubernetesSecretStore {
    /// Client from the inferred kubeconfig or in-cluster configuration
    pub fn try_default() -> Result<Self, StoreError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::Config(format!("runtime init: {}", e)))?;

        let client = runtime
            .block_on(Client::try_default())
            .map_err(|e| StoreError::Config(e.to_string()))?;

        Ok(Self {
            runtime,
            client,
            fetched: Mutex::new(BTreeMap::new()),
        })
    }

    /// Namespace of the running pod, if a service account is mounted
    pub fn in_cluster_namespace(fs: &dyn FileSystem) -> Option<String> {
        fs.read_to_string(Path::new(SERVICE_ACCOUNT_NAMESPACE))
            .ok()
            .map(|ns| ns.trim().to_string())
            .filter(|ns| !ns.is_empty())
    }

    fn api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn remember(&self, secret: &Secret) -> Result<SecretRecord, StoreError> {
        let record = record_from_secret(secret)?;
        self.fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((record.namespace.clone(), record.name.clone()), secret.clone());
        Ok(record)
    }

    fn last_seen(&self, record: &SecretRecord) -> Option<Secret> {
        self.fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(record.namespace.clone(), record.name.clone()))
            .cloned()
    }
}

impl SecretStore for KubernetesSecretStore {
    fn get(&self, namespace: &str, name: &str) -> Result<Option<SecretRecord>, StoreError> {
        let api = self.api(namespace);
        let found = self
            .runtime
            .block_on(api.get_opt(name))
            .map_err(StoreError::from)?;

        found.map(|secret| self.remember(&secret)).transpose()
    }

    fn create(&self, record: &SecretRecord) -> Result<SecretRecord, StoreError> {
        let api = self.api(&record.namespace);
        let secret = apply_record(Secret::default(), record);
        let created = self
            .runtime
            .block_on(api.create(&PostParams::default(), &secret))
            .map_err(StoreError::from)?;

        self.remember(&created)
    }

    fn update(&self, record: &SecretRecord) -> Result<SecretRecord, StoreError> {
        let api = self.api(&record.namespace);
        let base = self.last_seen(record).unwrap_or_default();
        let secret = apply_record(base, record);
        let replaced = self
            .runtime
            .block_on(api.replace(&record.name, &PostParams::default(), &secret))
            .map_err(StoreError::from)?;

        self.remember(&replaced)
    }
}

/// Write the record's name, labels, resource version and data over `base`
fn apply_record(mut base: Secret, record: &SecretRecord) -> Secret {
    base.metadata.name = Some(record.name.clone());
    base.metadata.namespace = Some(record.namespace.clone());
    base.metadata.labels = Some(record.labels.clone());
    if record.resource_version.is_some() {
        base.metadata.resource_version = record.resource_version.clone();
    }
    if base.type_.is_none() {
        base.type_ = Some("Opaque".to_string());
    }

    base.data = Some(
        record
            .data
            .iter()
            .map(|(key, value)| (key.clone(), ByteString(value.clone())))
            .collect(),
    );
    base.string_data = None;

    base
}

fn record_from_secret(secret: &Secret) -> Result<SecretRecord, StoreError> {
    let metadata = &secret.metadata;
    let name = metadata
        .name
        .clone()
        .ok_or_else(|| StoreError::Decode("secret without metadata.name".to_string()))?;

    Ok(SecretRecord {
        name,
        namespace: metadata.namespace.clone().unwrap_or_default(),
        labels: metadata.labels.clone().unwrap_or_default(),
        data: secret
            .data
            .iter()
            .flatten()
            .map(|(key, value)| (key.clone(), value.0.clone()))
            .collect(),
        resource_version: metadata.resource_version.clone(),
    })
}
