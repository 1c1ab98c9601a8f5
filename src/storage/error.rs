use thiserror::Error;

use super::NodeId;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("node {0} is not in the data storage")]
    UnknownNode(NodeId),

    #[error("parent node {0} is not in the data storage")]
    UnknownParent(NodeId),
}
