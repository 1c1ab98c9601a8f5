use crate::tool::{AlgorithmSchema, AlgorithmSpec, list_algorithms};

use super::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct AlgorithmService;

impl AlgorithmService {
    pub fn list(&self) -> Vec<AlgorithmSchema> {
        let mut schemas = list_algorithms();
        schemas.sort_by(|left, right| left.name.cmp(&right.name));
        schemas
    }

    pub fn describe(&self, name: &str) -> Option<AlgorithmSchema> {
        self.list().into_iter().find(|schema| schema.name == name)
    }

    /// Checks that `spec` builds into preview hooks.
    pub fn validate(&self, spec: &AlgorithmSpec) -> Result<()> {
        spec.build()?;
        Ok(())
    }
}
