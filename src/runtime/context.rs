use super::{AlgorithmService, SessionService};

#[derive(Debug, Clone, Default)]
pub struct AppContext {
    algorithm_service: AlgorithmService,
    session_service: SessionService,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn algorithm_service(&self) -> &AlgorithmService {
        &self.algorithm_service
    }

    pub fn session_service(&self) -> &SessionService {
        &self.session_service
    }
}
