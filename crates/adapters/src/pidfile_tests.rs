use tempfile::tempdir;

use super::*;

#[test]
fn absent_file_reports_no_master() {
    let dir = tempdir().unwrap();
    let registry = PidRegistry::new(dir.path());
    assert_eq!(registry.read_live_master(), 0);
}

#[test]
fn write_then_read_round_trips_a_live_pid() {
    let dir = tempdir().unwrap();
    let registry = PidRegistry::new(dir.path());
    let own_pid = std::process::id();

    registry.write_master(own_pid).unwrap();

    assert_eq!(registry.read_live_master(), own_pid);
}

#[test]
fn writing_zero_is_reported_as_no_master() {
    let dir = tempdir().unwrap();
    let registry = PidRegistry::new(dir.path());

    registry.write_master(0).unwrap();

    assert_eq!(registry.read_live_master(), 0);
}

#[test]
fn corrupt_contents_report_no_master() {
    let dir = tempdir().unwrap();
    let registry = PidRegistry::new(dir.path());
    std::fs::write(registry.path(), b"not-a-pid").unwrap();

    assert_eq!(registry.read_live_master(), 0);
}

#[test]
fn dead_pid_reports_no_master() {
    let dir = tempdir().unwrap();
    let registry = PidRegistry::new(dir.path());

    // A pid this large cannot correspond to a live process on any
    // supported platform's default pid_max.
    registry.write_master(i32::MAX as u32).unwrap();

    assert_eq!(registry.read_live_master(), 0);
}

#[test]
fn ensure_dirs_creates_runtime_and_logs_subdir() {
    let dir = tempdir().unwrap();
    let runtime_dir = dir.path().join("nested").join("runtime");
    let registry = PidRegistry::new(&runtime_dir);

    registry.ensure_dirs().unwrap();

    assert!(runtime_dir.is_dir());
    assert!(runtime_dir.join("logs").is_dir());
}

#[test]
fn is_alive_true_for_self_false_for_bogus_pid() {
    assert!(is_alive(std::process::id() as i32));
    assert!(!is_alive(i32::MAX));
}
