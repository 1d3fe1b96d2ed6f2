use crate::config::ConfigError;

/// Errors that prevent a batch from starting
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// I/O error while preparing inputs or the output directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The result collector stopped unexpectedly
    #[error("Collector thread panicked")]
    Collector,
}
