use std::path::PathBuf;

/// Errors raised while assembling a [`crate::config::Config`] from the process environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("environment variable {name} has an invalid value {value:?}: {reason}")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors raised while enumerating `.sql` files under the configured script directories.
#[derive(Debug, thiserror::Error)]
pub enum ScriptLoadError {
    #[error("script directory {0} does not exist or is not a directory")]
    NotADirectory(PathBuf),
    #[error("script directory {0} contains no .sql files")]
    EmptyDirectory(PathBuf),
    #[error("failed to read script directory {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
