use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    /// Non-zero exit from a lifecycle verb. Carries the combined log so
    /// callers can assert on the raw error text (the negative path depends
    /// on this).
    #[error("{verb} exited with code {code}\n{log}")]
    CommandFailed {
        verb: &'static str,
        code: i32,
        log: String,
    },

    #[error("failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{verb} timed out after {minutes} minutes")]
    Timeout { verb: &'static str, minutes: u64 },

    #[error("output '{0}' not present after apply")]
    OutputNotFound(String),

    #[error("output '{name}' has an unsupported shape: {detail}")]
    OutputShape { name: String, detail: String },

    #[error("apply failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("internal driver error: {0}")]
    Internal(String),
}
