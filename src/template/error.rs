use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while rendering configuration sources
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{0} is not present in the environment")]
    MissingEnvironmentVariable(String),

    #[error("environment variable {name} is unusable: {message}")]
    InvalidEnvironmentVariable { name: String, message: String },

    #[error("failed to evaluate template in {name}: {source}")]
    TemplateEvaluation {
        name: String,
        #[source]
        source: handlebars::RenderError,
    },

    #[error("post-processed YAML from {source_name} is invalid: {source}\n{text}")]
    Parse {
        source_name: String,
        text: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("post-processed YAML from {0} is not a mapping")]
    NotAMapping(String),

    #[error("config source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("failed to read config source {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("failed to serialize rendered config: {0}")]
    Serialize(#[source] serde_yaml::Error),
}
