use crate::{pipeline_exit_code, ExitStatus};

#[test]
fn normal_exits_keep_their_code() {
    assert_eq!(ExitStatus::Exited(0).exit_code(), 0);
    assert_eq!(ExitStatus::Exited(13).exit_code(), 13);
    assert!(ExitStatus::Exited(0).success());
    assert!(!ExitStatus::Exited(13).success());
}

#[test]
fn sigpipe_death_counts_as_success() {
    let status = ExitStatus::Signaled(libc::SIGPIPE as u8);
    assert!(status.success());
    assert_eq!(status.exit_code(), 0);
}

#[test]
fn other_signals_fail() {
    let killed = ExitStatus::Signaled(libc::SIGKILL as u8);
    assert!(!killed.success());
    assert_eq!(killed.exit_code(), 128 + libc::SIGKILL as u8);

    assert!(!ExitStatus::Other(-1).success());
}

#[test]
fn first_failing_stage_decides() {
    let statuses = [
        ExitStatus::Exited(0),
        ExitStatus::Exited(2),
        ExitStatus::Exited(1),
    ];
    assert_eq!(pipeline_exit_code(&statuses), 2);
}

#[test]
fn all_successes_give_zero() {
    let statuses = [
        ExitStatus::Exited(0),
        ExitStatus::Signaled(libc::SIGPIPE as u8),
        ExitStatus::Exited(0),
    ];
    assert_eq!(pipeline_exit_code(&statuses), 0);
}

#[test]
fn no_stages_give_zero() {
    assert_eq!(pipeline_exit_code(&[]), 0);
}
