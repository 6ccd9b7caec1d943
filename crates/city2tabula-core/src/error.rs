/// Errors surfaced by [`crate::runner::Runner`]. A failed job aborts its owning
/// pipeline but never propagates to peer pipelines running on other workers
/// (spec §4.8/§5).
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("job {type_label:?} failed to read script {path:?}")]
    ScriptRead {
        type_label: String,
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("job {type_label:?} exhausted {attempts} attempt(s)")]
    RetryExhausted {
        type_label: String,
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },
}

impl RunnerError {
    pub fn type_label(&self) -> &str {
        match self {
            RunnerError::ScriptRead { type_label, .. } => type_label,
            RunnerError::RetryExhausted { type_label, .. } => type_label,
        }
    }
}
