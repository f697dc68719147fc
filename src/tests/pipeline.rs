use crate::{pipeline_exit_code, ExitStatus, Pipeline, PipelineError};

#[test]
fn single_stage_success() {
    let statuses = Pipeline::new(&["true"]).run().unwrap();
    assert_eq!(statuses, vec![ExitStatus::Exited(0)]);
}

#[test]
fn single_stage_failure() {
    let statuses = Pipeline::new(&["false"]).run().unwrap();
    assert_eq!(statuses, vec![ExitStatus::Exited(1)]);
    assert_eq!(pipeline_exit_code(&statuses), 1);
}

#[test]
fn empty_pipeline_is_rejected() {
    let err = Pipeline::new::<&str>(&[]).run().unwrap_err();
    assert!(matches!(err, PipelineError::Empty));
    assert_eq!(err.exit_code(), libc::EINVAL);
}

#[test]
fn first_failure_decides() {
    let statuses = Pipeline::new(&["false", "true"]).run().unwrap();
    assert_eq!(statuses.len(), 2);
    assert_eq!(pipeline_exit_code(&statuses), 1);
}

#[test]
fn late_failure_still_reported() {
    let statuses = Pipeline::new(&["true", "false"]).run().unwrap();
    assert_eq!(pipeline_exit_code(&statuses), 1);
}

#[test]
fn missing_program_reports_not_found() {
    let statuses = Pipeline::new(&["plumb-no-such-program"]).run().unwrap();
    assert_eq!(statuses, vec![ExitStatus::Exited(127)]);
}

#[test]
fn statuses_come_back_in_stage_order() {
    let statuses = Pipeline::new(&["true", "plumb-no-such-program", "true"])
        .run()
        .unwrap();
    assert_eq!(statuses[0], ExitStatus::Exited(0));
    assert_eq!(statuses[1], ExitStatus::Exited(127));
    assert_eq!(statuses[2], ExitStatus::Exited(0));
    assert_eq!(pipeline_exit_code(&statuses), 127);
}
