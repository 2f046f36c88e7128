use thiserror::Error;

pub type Result<T> = std::result::Result<T, MirrorcheckError>;

#[derive(Error, Debug)]
pub enum MirrorcheckError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Fixture error: {0}")]
    Fixture(String),

    #[error("Mount error: {0}")]
    Mount(String),

    #[error("Divergence in scenario '{scenario}' (seed {seed}): {detail}")]
    Divergence {
        scenario: String,
        seed: u64,
        detail: String,
    },

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("IO error: {0}")]
    Io(std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<std::io::Error> for MirrorcheckError {
    fn from(err: std::io::Error) -> Self {
        MirrorcheckError::Io(err)
    }
}

impl From<serde_json::Error> for MirrorcheckError {
    fn from(err: serde_json::Error) -> Self {
        MirrorcheckError::Json(err.to_string())
    }
}
