use std::path::Path;

use tracing::info;

use crate::workflow::{SessionReport, SessionSpec, load_spec, run_session, save_report};

use super::{AlgorithmService, Result};

#[derive(Debug, Clone, Default)]
pub struct SessionService {
    algorithms: AlgorithmService,
}

impl SessionService {
    pub fn load_spec(&self, path: impl AsRef<Path>) -> Result<SessionSpec> {
        Ok(load_spec(path)?)
    }

    /// Loads `path` and validates the session and its algorithm without running it.
    pub fn check(&self, path: impl AsRef<Path>) -> Result<SessionSpec> {
        let spec = self.load_spec(path)?;
        self.algorithms.validate(&spec.tool.algorithm)?;
        Ok(spec)
    }

    pub fn run(&self, spec: &SessionSpec) -> Result<SessionReport> {
        self.algorithms.validate(&spec.tool.algorithm)?;
        let report = run_session(spec)?;
        info!(
            session = report.session_name.as_deref().unwrap_or("unnamed"),
            steps = report.steps.len(),
            "session completed"
        );
        Ok(report)
    }

    pub fn save_report(&self, path: impl AsRef<Path>, report: &SessionReport) -> Result<()> {
        save_report(path, report)?;
        Ok(())
    }
}
