use std::fs;

use crate::tool::AlgorithmSpec;

use super::{AppContext, AppError};

#[test]
fn algorithm_service_lists_and_describes_algorithms() {
    let app = AppContext::new();
    let names = app
        .algorithm_service()
        .list()
        .into_iter()
        .map(|schema| schema.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["noop", "otsu", "threshold"]);

    let threshold = app
        .algorithm_service()
        .describe("threshold")
        .expect("threshold schema");
    assert_eq!(threshold.params.len(), 2);
    assert!(app.algorithm_service().describe("watershed").is_none());
}

#[test]
fn algorithm_service_rejects_inverted_window() {
    let app = AppContext::new();
    let spec = AlgorithmSpec::Threshold {
        lower: 10.0,
        upper: 1.0,
    };
    assert!(matches!(
        app.algorithm_service().validate(&spec),
        Err(AppError::Algorithm(_))
    ));
}

#[test]
fn session_service_checks_and_runs_session_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = dir.path().join("session.yaml");
    fs::write(
        &session,
        r#"
reference:
  shape: [4, 4, 2]
tool:
  algorithm: { kind: threshold, lower: 2.0, upper: 3.0 }
steps:
  - step: activate
  - step: confirm
"#,
    )
    .expect("write session");

    let app = AppContext::new();
    let spec = app.session_service().check(&session).expect("check");
    assert_eq!(spec.steps.len(), 2);

    let report = app.session_service().run(&spec).expect("run");
    let report_path = dir.path().join("report.json");
    app.session_service()
        .save_report(&report_path, &report)
        .expect("save report");
    assert!(report_path.exists());
}

#[test]
fn session_service_check_fails_on_bad_algorithm() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = dir.path().join("session.json");
    fs::write(
        &session,
        r#"{
  "reference": { "shape": [4, 4] },
  "tool": { "algorithm": { "kind": "threshold", "lower": 5.0, "upper": 1.0 } },
  "steps": [{ "step": "activate" }]
}"#,
    )
    .expect("write session");

    let app = AppContext::new();
    assert!(matches!(
        app.session_service().check(&session),
        Err(AppError::Algorithm(_))
    ));
}
