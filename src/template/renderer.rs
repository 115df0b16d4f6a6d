use super::error::RenderError;
use super::functions::TemplateFunctions;
use super::merge::deep_merge;
use super::substitution::EnvSubstitution;
use crate::traits::{Environment, FileSystem};
use serde_yaml::{Mapping, Value};
use std::path::PathBuf;
use std::sync::Arc;

/// A named YAML body, possibly containing `${NAME}` placeholders
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub name: String,
    pub body: String,
}

impl ConfigSource {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }
}

/// Renders an ordered list of config sources into one merged mapping
pub struct ConfigRenderer {
    fs: Arc<dyn FileSystem>,
    env: Arc<dyn Environment>,
    functions: TemplateFunctions,
}

impl ConfigRenderer {
    pub fn new(fs: Arc<dyn FileSystem>, env: Arc<dyn Environment>) -> Self {
        let functions = TemplateFunctions::new(Arc::clone(&fs), Arc::clone(&env));
        Self { fs, env, functions }
    }

    /// Render files in order. Directories are skipped, missing paths are fatal.
    pub fn render_files(&self, paths: &[PathBuf]) -> Result<Mapping, RenderError> {
        let mut sources = Vec::with_capacity(paths.len());

        for path in paths {
            if !self.fs.exists(path) {
                return Err(RenderError::SourceNotFound(path.clone()));
            }

            if self.fs.is_dir(path) {
                continue;
            }

            let body = self
                .fs
                .read_to_string(path)
                .map_err(|e| RenderError::Read {
                    path: path.clone(),
                    message: format!("{:#}", e),
                })?;

            sources.push(ConfigSource::new(path.display().to_string(), body));
        }

        self.render(&sources)
    }

    /// Render in-memory sources in order
    pub fn render(&self, sources: &[ConfigSource]) -> Result<Mapping, RenderError> {
        let mut merged = Mapping::new();

        for source in sources {
            self.render_source(source, &mut merged)?;
        }

        Ok(merged)
    }

    /// Substitute, parse and merge one source into `merged`
    fn render_source(
        &self,
        source: &ConfigSource,
        merged: &mut Mapping,
    ) -> Result<(), RenderError> {
        let substitution = EnvSubstitution::new(self.env.as_ref(), &self.functions);
        let text = substitution.substitute(&source.body, merged)?;

        let parsed: Value = serde_yaml::from_str(&text).map_err(|e| RenderError::Parse {
            source_name: source.name.clone(),
            text: text.clone(),
            source: e,
        })?;

        match parsed {
            Value::Mapping(mapping) => deep_merge(mapping, merged),
            // Empty or comment-only documents contribute nothing
            Value::Null => {}
            _ => return Err(RenderError::NotAMapping(source.name.clone())),
        }

        Ok(())
    }
}

/// Serialize a rendered config as YAML
pub fn to_yaml(config: &Mapping) -> Result<String, RenderError> {
    serde_yaml::to_string(config).map_err(RenderError::Serialize)
}
