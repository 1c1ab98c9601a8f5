use crate::tool::ToolError;

use super::{
    SessionError, SessionSpec, SessionStep, WorkingKind, load_spec, run_session, save_report,
};

fn parse(yaml: &str) -> SessionSpec {
    serde_yaml::from_str(yaml).expect("session yaml")
}

#[test]
fn threshold_session_commits_every_time_step() {
    let spec = parse(
        r#"
name: growing ball
reference:
  shape: [6, 6, 3]
  time_steps: 3
  phantom: { kind: sphere, radius: 1.5, growth: 0.5 }
tool:
  algorithm: { kind: threshold, lower: 50.0, upper: 200.0 }
steps:
  - step: activate
  - step: confirm
"#,
    );
    let report = run_session(&spec).expect("session");
    assert_eq!(report.algorithm, "threshold");
    assert_eq!(report.steps.len(), 2);
    assert!(report.steps[0].active);
    assert!(report.steps[0].preview_foreground.unwrap_or_default() > 0);

    let confirm = &report.steps[1];
    assert!(!confirm.active);
    let commit = confirm.commit.as_ref().expect("commit");
    assert_eq!(commit.transferred_time_steps, vec![0, 1, 2]);
    assert!(!commit.padded);

    let counts = &report.result.foreground_per_time_step;
    assert_eq!(counts.len(), 3);
    assert!(counts[0] > 0);
    assert!(counts.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(report.render_requests > 0);
    assert!(report.error_messages.is_empty());
}

#[test]
fn region_restricted_session_pads_result() {
    let spec = parse(
        r#"
reference:
  shape: [8, 8, 4]
tool:
  algorithm: { kind: threshold, lower: 0.0, upper: 1000.0 }
steps:
  - step: activate
  - step: set_roi
    min: [2, 2, 1]
    max: [5, 6, 3]
  - step: confirm
"#,
    );
    let report = run_session(&spec).expect("session");
    assert_eq!(report.steps[1].preview_foreground, Some(24));
    let commit = report.steps[2].commit.as_ref().expect("commit");
    assert!(commit.padded);
    assert_eq!(commit.result_extent, [8, 8, 4]);
    assert_eq!(report.result.extent, [8, 8, 4]);
    assert_eq!(report.result.foreground_per_time_step, vec![24]);
}

#[test]
fn lazy_session_commits_selected_time_step_only() {
    let spec = parse(
        r#"
reference:
  shape: [3, 3, 2]
  time_steps: 5
tool:
  algorithm: { kind: threshold, lower: 0.0, upper: 1000.0 }
  settings:
    lazy_dynamic_previews: true
    create_all_time_steps: false
steps:
  - step: activate
  - step: select_time_point
    time_point: 3.0
  - step: confirm
"#,
    );
    let report = run_session(&spec).expect("session");
    assert_eq!(report.steps[1].time_point, 3.0);
    assert_eq!(report.steps[1].preview_foreground, Some(36));
    let commit = report.steps[2].commit.as_ref().expect("commit");
    assert_eq!(commit.transferred_time_steps, vec![3]);
    assert_eq!(report.result.foreground_per_time_step, vec![0, 0, 0, 18, 0]);
}

#[test]
fn static_segmentation_over_dynamic_reference() {
    let spec = parse(
        r#"
reference:
  shape: [4, 4, 4]
  time_steps: 3
  phantom: { kind: sphere, radius: 1.0, growth: 1.0 }
working:
  static_segmentation: true
  active_label: 2
tool:
  algorithm: { kind: threshold, lower: 50.0, upper: 150.0 }
steps:
  - step: activate
  - step: select_time_point
    time_point: 2.0
  - step: confirm
"#,
    );
    let report = run_session(&spec).expect("session");
    assert_eq!(report.result.time_steps, 1);
    let commit = report.steps[2].commit.as_ref().expect("commit");
    assert_eq!(commit.transferred_time_steps, vec![0]);
    assert!(report.result.foreground_per_time_step[0] > 0);
}

#[test]
fn plain_two_dimensional_working_volume() {
    let spec = parse(
        r#"
reference:
  shape: [5, 4]
  pixel_type: f32
working:
  kind: volume
tool:
  algorithm: { kind: threshold, lower: 2.0, upper: 10.0 }
steps:
  - step: activate
  - step: update
  - step: confirm
"#,
    );
    assert_eq!(spec.working.kind, WorkingKind::Volume);
    let report = run_session(&spec).expect("session");
    assert!(report.steps[1].update.is_some());
    assert_eq!(report.result.extent, [5, 4, 1]);
    assert_eq!(report.result.foreground_per_time_step, vec![12]);
}

#[test]
fn mask_region_with_noop_algorithm_keeps_empty_preview() {
    let spec = parse(
        r#"
reference:
  shape: [8, 8, 4]
tool:
  name: passthrough
  algorithm: { kind: noop }
  settings: { keep_active_after_accept: true }
steps:
  - step: activate
  - step: set_roi_mask
    center: [3.0, 3.0, 1.0]
    radius: 1.0
  - step: clear_roi
  - step: deactivate
"#,
    );
    let report = run_session(&spec).expect("session");
    assert_eq!(report.tool, "passthrough");
    assert_eq!(report.steps[1].preview_foreground, Some(0));
    assert!(!report.steps[3].active);
    assert_eq!(report.steps[3].preview_foreground, None);
}

#[test]
fn failing_step_reports_its_index() {
    let spec = parse(
        r#"
reference:
  shape: [2, 2, 2]
steps:
  - step: update
"#,
    );
    let error = run_session(&spec).expect_err("update without activation");
    assert!(matches!(
        error,
        SessionError::Step {
            index: 0,
            step: "update",
            source: ToolError::InvalidState(_),
        }
    ));
}

#[test]
fn invalid_sessions_are_rejected() {
    let mut spec = parse(
        r#"
reference:
  shape: [2, 2, 2]
steps:
  - step: activate
"#,
    );
    assert!(spec.validate().is_ok());

    spec.steps.clear();
    assert!(matches!(spec.validate(), Err(SessionError::Parse(_))));

    spec.steps.push(SessionStep::SetRoi {
        min: [1, 0, 0],
        max: [1, 2, 2],
    });
    assert!(spec.validate().is_err());

    spec.steps = vec![SessionStep::Activate];
    spec.reference.shape = vec![4];
    assert!(spec.validate().is_err());
}

#[test]
fn specs_and_reports_round_trip_through_files() {
    let directory = tempfile::tempdir().expect("tempdir");
    let yaml_path = directory.path().join("session.yaml");
    std::fs::write(
        &yaml_path,
        "reference:\n  shape: [3, 3, 3]\nsteps:\n  - step: activate\n  - step: confirm\n",
    )
    .expect("write spec");
    let spec = load_spec(&yaml_path).expect("load yaml");
    assert_eq!(spec.steps, vec![SessionStep::Activate, SessionStep::Confirm]);

    let json_path = directory.path().join("session.json");
    std::fs::write(&json_path, serde_json::to_string(&spec).expect("json")).expect("write");
    assert_eq!(load_spec(&json_path).expect("load json"), spec);

    let report = run_session(&spec).expect("session");
    let report_path = directory.path().join("report.json");
    save_report(&report_path, &report).expect("save report");
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).expect("read")).expect("parse");
    assert_eq!(saved["algorithm"], "otsu");
    assert_eq!(saved["steps"].as_array().map(Vec::len), Some(2));

    let empty = directory.path().join("empty.yaml");
    std::fs::write(&empty, "reference:\n  shape: [3, 3, 3]\n").expect("write");
    assert!(matches!(load_spec(&empty), Err(SessionError::Parse(_))));
}
