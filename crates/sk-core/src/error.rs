use thiserror::Error;

/// Faults at the data boundaries of the core crate: JSON, files, config.
///
/// Interaction rejections (locked layer, unknown id) are not errors; those
/// operations report `false`/`None` and log.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid canvas JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("draft storage failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("invalid config: {0}")]
    Config(String),
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
