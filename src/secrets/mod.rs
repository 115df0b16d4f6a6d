//! Generated secrets for the homeserver deployment.
//!
//! Each requested `name:key:type` entry is reconciled against a secret store:
//! the secret is created when missing, must carry the ownership label when it
//! already exists, and a key is generated at most once for its lifetime.

mod error;
mod generators;
mod kubernetes;
mod reconciler;
mod spec;
mod store;

pub use kubernetes::KubernetesSecretStore;
pub use reconciler::reconcile_all;
pub use spec::{SecretLabels, SecretSpec};
pub use store::SecretStore;

#[cfg(test)]
pub use error::{SecretError, StoreOperation};
#[cfg(test)]
pub use spec::MANAGED_BY_LABEL;
#[cfg(test)]
pub use store::InMemorySecretStore;
