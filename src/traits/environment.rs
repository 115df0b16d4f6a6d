use anyhow::{Context, Result, bail};
use std::env::VarError;
#[cfg(test)]
use std::collections::{HashMap, HashSet};

/// Read-only view of the process environment and host identity
pub trait Environment: Send + Sync {
    /// Look up an environment variable, `None` when unset.
    /// A value that is not valid unicode is an error.
    fn var(&self, name: &str) -> Result<Option<String>>;

    /// Hostname of the machine running the process
    fn hostname(&self) -> Result<String>;
}

/// Real environment backed by `std::env` and `whoami`
pub struct RealEnvironment;

impl Environment for RealEnvironment {
    fn var(&self, name: &str) -> Result<Option<String>> {
        env_value(name, std::env::var(name))
    }

    fn hostname(&self) -> Result<String> {
        whoami::fallible::hostname().context("Failed to determine hostname")
    }
}

fn env_value(name: &str, value: Result<String, VarError>) -> Result<Option<String>> {
    match value {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => {
            bail!("Environment variable {} is not valid unicode", name)
        }
    }
}

/// In-memory environment for tests
#[cfg(test)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
    non_unicode: HashSet<String>,
    hostname: String,
}

#[cfg(test)]
impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
            non_unicode: HashSet::new(),
            hostname: "synapse-main-0".to_string(),
        }
    }

    pub fn with_var(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }

    /// Make `name` look set to a value that is not valid unicode
    pub fn with_non_unicode_var(mut self, name: &str) -> Self {
        self.non_unicode.insert(name.to_string());
        self
    }

    pub fn with_hostname(mut self, hostname: &str) -> Self {
        self.hostname = hostname.to_string();
        self
    }
}

#[cfg(test)]
impl Default for MockEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl Environment for MockEnvironment {
    fn var(&self, name: &str) -> Result<Option<String>> {
        if self.non_unicode.contains(name) {
            return env_value(name, Err(VarError::NotUnicode("\u{FFFD}".into())));
        }
        Ok(self.vars.get(name).cloned())
    }

    fn hostname(&self) -> Result<String> {
        Ok(self.hostname.clone())
    }
}
