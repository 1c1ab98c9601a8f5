use crate::filters::FilterError;
use crate::model::CoreError;
use crate::storage::StorageError;
use crate::tool::ToolError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session specification parse failure: {0}")]
    Parse(String),

    #[error("session I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("session serialization failure: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("session YAML serialization failure: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),

    #[error("step {index} (`{step}`) failed: {source}")]
    Step {
        index: usize,
        step: &'static str,
        source: ToolError,
    },

    #[error("tool failure: {0}")]
    Tool(#[from] ToolError),

    #[error("volume construction failed: {0}")]
    Core(#[from] CoreError),

    #[error("region construction failed: {0}")]
    Filter(#[from] FilterError),

    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}
