use super::error::RenderError;
use super::functions::TemplateFunctions;
use super::merge::to_template_context;
use crate::traits::Environment;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_yaml::Mapping;
use std::collections::HashMap;

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\$\{([^}]+)\}").expect("Invalid placeholder regex");
}

/// Unique `${NAME}` identifiers in first-seen order
pub fn extract_placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for cap in PLACEHOLDER.captures_iter(text) {
        let name = &cap[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    names
}

/// Rewrites `${NAME}` placeholders with environment values rendered as templates
pub struct EnvSubstitution<'a> {
    env: &'a dyn Environment,
    functions: &'a TemplateFunctions,
}

impl<'a> EnvSubstitution<'a> {
    pub fn new(env: &'a dyn Environment, functions: &'a TemplateFunctions) -> Self {
        Self { env, functions }
    }

    /// Substitute every placeholder in `text`.
    ///
    /// Each value is evaluated with `merged` (the config accumulated so far) as
    /// template context. All values are resolved before any replacement, so text
    /// produced by one value is never scanned for further placeholders.
    pub fn substitute(&self, text: &str, merged: &Mapping) -> Result<String, RenderError> {
        let names = extract_placeholders(text);
        if names.is_empty() {
            return Ok(text.to_string());
        }

        let context = to_template_context(merged);
        let mut resolved: HashMap<String, String> = HashMap::with_capacity(names.len());

        for name in names {
            let value = self
                .env
                .var(&name)
                .map_err(|e| RenderError::InvalidEnvironmentVariable {
                    name: name.clone(),
                    message: format!("{:#}", e),
                })?
                .ok_or_else(|| RenderError::MissingEnvironmentVariable(name.clone()))?;

            let rendered = self
                .functions
                .evaluate(&value, &context)
                .map_err(|source| RenderError::TemplateEvaluation {
                    name: name.clone(),
                    source,
                })?;

            resolved.insert(name, rendered);
        }

        let output = PLACEHOLDER.replace_all(text, |caps: &Captures| match resolved.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        });

        Ok(output.into_owned())
    }
}
