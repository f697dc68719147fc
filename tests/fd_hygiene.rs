//! The launcher must close every descriptor it opens. This check lives in
//! its own test binary so nothing else can touch the descriptor table
//! while the counts are taken.

#![cfg(target_os = "linux")]

use plumb::Pipeline;

fn open_fd_count() -> usize {
    std::fs::read_dir("/proc/self/fd").unwrap().count()
}

#[test]
fn descriptor_table_is_unchanged_after_a_run() {
    // One warm-up run so anything initialised lazily settles first.
    Pipeline::new(&["true", "true"]).run().unwrap();

    let before = open_fd_count();
    Pipeline::new(&["true", "true", "true", "true"]).run().unwrap();
    let after = open_fd_count();

    assert_eq!(before, after);
}
