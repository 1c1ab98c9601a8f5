mod error;
mod execute;
mod io;
mod report;
mod spec;

#[cfg(test)]
mod tests;

pub use error::{Result, SessionError};
pub use execute::{build_reference, build_working, run_session};
pub use io::{load_spec, save_report};
pub use report::{ResultSummary, SessionReport, StepReport};
pub use spec::{Phantom, ReferenceSpec, SessionSpec, SessionStep, ToolSpec, WorkingKind, WorkingSpec};
