use std::fs;
use std::path::Path;

use super::{Result, SessionReport, SessionSpec};

fn is_yaml(path: &Path) -> bool {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    matches!(extension.as_str(), "yaml" | "yml")
}

pub fn load_spec(path: impl AsRef<Path>) -> Result<SessionSpec> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let spec = if is_yaml(path) {
        serde_yaml::from_str::<SessionSpec>(&raw)?
    } else {
        serde_json::from_str::<SessionSpec>(&raw)?
    };
    spec.validate()?;
    Ok(spec)
}

pub fn save_report(path: impl AsRef<Path>, report: &SessionReport) -> Result<()> {
    let path = path.as_ref();
    let serialized = if is_yaml(path) {
        serde_yaml::to_string(report)?
    } else {
        serde_json::to_string_pretty(report)?
    };
    fs::write(path, serialized)?;
    Ok(())
}
