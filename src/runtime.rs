mod algorithm_service;
mod context;
mod error;
mod session_service;

#[cfg(test)]
mod tests;

pub use algorithm_service::AlgorithmService;
pub use context::AppContext;
pub use error::{AppError, Result};
pub use session_service::SessionService;
