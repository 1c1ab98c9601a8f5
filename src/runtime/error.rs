use crate::tool::ToolError;
use crate::workflow::SessionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("session service error: {0}")]
    Session(#[from] SessionError),

    #[error("algorithm service error: {0}")]
    Algorithm(#[from] ToolError),
}
