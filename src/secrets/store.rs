use super::error::StoreError;
use std::collections::BTreeMap;
#[cfg(test)]
use super::error::StoreOperation;
#[cfg(test)]
use std::sync::Mutex;

/// A named secret in a namespace: labels plus a byte-valued payload
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SecretRecord {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub data: BTreeMap<String, Vec<u8>>,
    pub resource_version: Option<String>,
}

impl SecretRecord {
    /// An empty record with the given labels
    pub fn new(namespace: &str, name: &str, labels: BTreeMap<String, String>) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            labels,
            ..Default::default()
        }
    }
}

/// CRUD boundary of the external secret store.
///
/// `get` returns `Ok(None)` when the record does not exist; every other failure
/// is an error. Nothing here retries.
pub trait SecretStore: Send + Sync {
    fn get(&self, namespace: &str, name: &str) -> Result<Option<SecretRecord>, StoreError>;

    fn create(&self, record: &SecretRecord) -> Result<SecretRecord, StoreError>;

    fn update(&self, record: &SecretRecord) -> Result<SecretRecord, StoreError>;
}

/// In-memory store for tests; counts calls and can fail a chosen operation
#[cfg(test)]
pub struct InMemorySecretStore {
    records: Mutex<BTreeMap<(String, String), SecretRecord>>,
    calls: Mutex<Vec<StoreOperation>>,
    fail_on: Mutex<Option<StoreOperation>>,
}

#[cfg(test)]
impl InMemorySecretStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            fail_on: Mutex::new(None),
        }
    }

    /// Seed a record, bypassing call accounting
    pub fn with_record(self, record: SecretRecord) -> Self {
        self.records.lock().unwrap().insert(
            (record.namespace.clone(), record.name.clone()),
            record,
        );
        self
    }

    /// Make every subsequent call of `operation` fail
    pub fn fail_on(&self, operation: StoreOperation) {
        *self.fail_on.lock().unwrap() = Some(operation);
    }

    pub fn record(&self, namespace: &str, name: &str) -> Option<SecretRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn calls(&self) -> Vec<StoreOperation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: StoreOperation) -> usize {
        self.calls().into_iter().filter(|c| *c == operation).count()
    }

    fn enter(&self, operation: StoreOperation) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(operation);
        if *self.fail_on.lock().unwrap() == Some(operation) {
            return Err(StoreError::Api {
                status: 503,
                reason: "ServiceUnavailable".to_string(),
                message: format!("{} rejected", operation),
            });
        }
        Ok(())
    }

    fn next_version(record: &SecretRecord) -> String {
        let current: u64 = record
            .resource_version
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        (current + 1).to_string()
    }
}

#[cfg(test)]
impl Default for InMemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl SecretStore for InMemorySecretStore {
    fn get(&self, namespace: &str, name: &str) -> Result<Option<SecretRecord>, StoreError> {
        self.enter(StoreOperation::Get)?;
        Ok(self.record(namespace, name))
    }

    fn create(&self, record: &SecretRecord) -> Result<SecretRecord, StoreError> {
        self.enter(StoreOperation::Create)?;
        let key = (record.namespace.clone(), record.name.clone());
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&key) {
            return Err(StoreError::Api {
                status: 409,
                reason: "AlreadyExists".to_string(),
                message: format!("secrets \"{}\" already exists", record.name),
            });
        }

        let mut stored = record.clone();
        stored.resource_version = Some(Self::next_version(record));
        records.insert(key, stored.clone());
        Ok(stored)
    }

    fn update(&self, record: &SecretRecord) -> Result<SecretRecord, StoreError> {
        self.enter(StoreOperation::Update)?;
        let key = (record.namespace.clone(), record.name.clone());
        let mut records = self.records.lock().unwrap();
        let Some(existing) = records.get(&key) else {
            return Err(StoreError::Api {
                status: 404,
                reason: "NotFound".to_string(),
                message: format!("secrets \"{}\" not found", record.name),
            });
        };

        let mut stored = record.clone();
        stored.resource_version = Some(Self::next_version(existing));
        records.insert(key, stored.clone());
        Ok(stored)
    }
}
