//! `name:key:type` secret entries and label sets as given on the command line.

use super::error::SecretError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Label marking a secret as owned by this tool
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
/// Value of [`MANAGED_BY_LABEL`] identifying this tool
pub const MANAGED_BY_VALUE: &str = "matrix-tools-init-secrets";

/// Kind of key material to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretType {
    Rand32,
    SigningKey,
    Hex32,
    Rsa,
    EcdsaPrime256v1,
    EcdsaSecp256k1,
    EcdsaSecp384r1,
}

impl SecretType {
    pub const ALL: [SecretType; 7] = [
        SecretType::Rand32,
        SecretType::SigningKey,
        SecretType::Hex32,
        SecretType::Rsa,
        SecretType::EcdsaPrime256v1,
        SecretType::EcdsaSecp256k1,
        SecretType::EcdsaSecp384r1,
    ];

    /// Tag accepted on the command line (case-sensitive)
    pub fn tag(self) -> &'static str {
        match self {
            SecretType::Rand32 => "rand32",
            SecretType::SigningKey => "signingkey",
            SecretType::Hex32 => "hex32",
            SecretType::Rsa => "rsa",
            SecretType::EcdsaPrime256v1 => "ecdsaprime256v1",
            SecretType::EcdsaSecp256k1 => "ecdsasecp256k1",
            SecretType::EcdsaSecp384r1 => "ecdsasecp384r1",
        }
    }
}

impl FromStr for SecretType {
    type Err = String;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.tag() == tag)
            .ok_or_else(|| tag.to_string())
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// One `name:key:type` entry: generate `type` into `key` of secret `name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretSpec {
    pub name: String,
    pub key: String,
    pub secret_type: SecretType,
}

impl SecretSpec {
    pub fn parse(arg: &str) -> Result<Self, SecretError> {
        let parts: Vec<&str> = arg.split(':').collect();
        let [name, key, tag] = parts.as_slice() else {
            return Err(SecretError::InvalidSecretSpec(arg.to_string()));
        };

        if name.is_empty() || key.is_empty() {
            return Err(SecretError::InvalidSecretSpec(arg.to_string()));
        }

        let secret_type: SecretType =
            tag.parse().map_err(|tag| SecretError::UnknownSecretType {
                name: name.to_string(),
                key: key.to_string(),
                tag,
            })?;

        Ok(Self {
            name: name.to_string(),
            key: key.to_string(),
            secret_type,
        })
    }

    /// Parse a comma-separated list, preserving order
    pub fn parse_list(arg: &str) -> Result<Vec<Self>, SecretError> {
        arg.split(',').map(Self::parse).collect()
    }
}

/// Labels written to every managed secret; always carries the ownership label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretLabels {
    labels: BTreeMap<String, String>,
}

impl SecretLabels {
    /// Only the ownership label
    pub fn managed() -> Self {
        let mut labels = BTreeMap::new();
        labels.insert(MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string());
        Self { labels }
    }

    /// Parse `key=value,...`; an empty string yields only the ownership label
    pub fn parse(arg: &str) -> Result<Self, SecretError> {
        let mut result = Self::managed();
        if arg.is_empty() {
            return Ok(result);
        }

        for entry in arg.split(',') {
            let (key, value) = entry
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| SecretError::InvalidLabel(entry.to_string()))?;

            if key != MANAGED_BY_LABEL {
                result.labels.insert(key.to_string(), value.to_string());
            }
        }

        Ok(result)
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// Whether a label set marks its record as owned by this tool
    pub fn is_managed(labels: &BTreeMap<String, String>) -> bool {
        labels.get(MANAGED_BY_LABEL).map(String::as_str) == Some(MANAGED_BY_VALUE)
    }
}

impl Default for SecretLabels {
    fn default() -> Self {
        Self::managed()
    }
}
