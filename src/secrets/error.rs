use super::spec::SecretType;
use std::fmt;
use thiserror::Error;

/// Store call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Get,
    Create,
    Update,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOperation::Get => "get",
            StoreOperation::Create => "create",
            StoreOperation::Update => "update",
        };
        write!(f, "{}", name)
    }
}

/// Errors at the secret store boundary
#[derive(Debug, Error)]
pub enum StoreError {
    /// The API server answered with an error status
    #[error("API server returned {status} {reason}: {message}")]
    Api {
        status: u16,
        reason: String,
        message: String,
    },

    #[error("kubernetes client error: {0}")]
    Client(#[source] kube::Error),

    #[error("invalid secret object: {0}")]
    Decode(String),

    #[error("kubernetes client configuration: {0}")]
    Config(String),
}

impl From<kube::Error> for StoreError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(response) => StoreError::Api {
                status: response.code,
                reason: response.reason,
                message: response.message,
            },
            other => StoreError::Client(other),
        }
    }
}

/// Errors raised while parsing secret specs or reconciling secrets
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("invalid generated secret format, expected <name:key:type>: {0}")]
    InvalidSecretSpec(String),

    #[error("unknown secret type '{tag}' for {name}:{key}")]
    UnknownSecretType {
        name: String,
        key: String,
        tag: String,
    },

    #[error("invalid label, expected <key=value>: {0}")]
    InvalidLabel(String),

    #[error("secret {namespace}/{name} is not managed by matrix-tools-init-secrets")]
    OwnershipViolation { namespace: String, name: String },

    #[error("failed to generate {secret_type} for {name}:{key}: {message}")]
    KeyGeneration {
        name: String,
        key: String,
        secret_type: SecretType,
        message: String,
    },

    #[error("failed to {operation} secret {namespace}/{name}: {source}")]
    Store {
        operation: StoreOperation,
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
    },
}
