use std::fs;

use tempfile::tempdir;

use super::*;

/// Hand-rolled check for `^\[\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{4}\]\[(INFO|ERROR)\]\[pid=\d+\]`
/// so this crate doesn't need a regex dependency just for one test.
fn matches_documented_shape(line: &str) -> bool {
    let Some(rest) = line.strip_prefix('[') else {
        return false;
    };
    let Some((timestamp, rest)) = rest.split_once(']') else {
        return false;
    };
    if timestamp.len() != 23 || &timestamp[4..5] != "-" || &timestamp[10..11] != " " {
        return false;
    }
    let Some(rest) = rest.strip_prefix('[') else {
        return false;
    };
    let Some((level, rest)) = rest.split_once(']') else {
        return false;
    };
    if level != "INFO" && level != "ERROR" {
        return false;
    }
    let Some(rest) = rest.strip_prefix("[pid=") else {
        return false;
    };
    let Some((pid, _)) = rest.split_once(']') else {
        return false;
    };
    pid.chars().all(|c| c.is_ascii_digit()) && !pid.is_empty()
}

#[test]
fn appended_line_matches_the_documented_format() {
    let dir = tempdir().unwrap();
    let writer = LogWriter::new(dir.path().join("process.log"));

    writer.info("hello world");

    let contents = fs::read_to_string(writer.path()).unwrap();
    let line = contents.lines().next().unwrap();
    assert!(matches_documented_shape(line), "line was: {line}");
    assert!(line.contains("hello world"));
    assert!(line.contains(&format!("pid={}", std::process::id())));
    assert!(contents.ends_with('\n'));
    assert!(!contents.ends_with("\n\n"));
}

#[test]
fn embedded_newlines_are_flattened_to_spaces() {
    let dir = tempdir().unwrap();
    let writer = LogWriter::new(dir.path().join("process.log"));

    writer.error("line one\nline two\r\nline three");

    let contents = fs::read_to_string(writer.path()).unwrap();
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.contains("line one line two  line three"));
}

#[test]
fn io_errors_are_swallowed_not_propagated() {
    let dir = tempdir().unwrap();
    // Point the log at a path whose parent cannot be created (a file, not a dir).
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"x").unwrap();
    let writer = LogWriter::new(blocker.join("nested").join("process.log"));

    // Must not panic.
    writer.info("this should be silently dropped");
}

#[test]
fn rotation_slides_suffixes_and_resets_active_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("process.log");

    // Pre-seed rotated siblings to observe the slide.
    fs::write(path.with_file_name("process.log.1"), b"old-1").unwrap();
    fs::write(path.with_file_name("process.log.2"), b"old-2").unwrap();

    // Make the active file exceed the rotation threshold.
    let big = vec![b'x'; 10 * 1024 * 1024 + 1];
    fs::write(&path, &big).unwrap();

    let writer = LogWriter::new(&path);
    writer.info("triggers rotation");

    // .1 -> .2, .2 -> .3, active -> .1.
    assert_eq!(fs::read(path.with_file_name("process.log.1")).unwrap(), big);
    assert_eq!(
        fs::read_to_string(path.with_file_name("process.log.2")).unwrap(),
        "old-1"
    );
    assert_eq!(
        fs::read_to_string(path.with_file_name("process.log.3")).unwrap(),
        "old-2"
    );

    // Active file now contains only the post-rotation append.
    let active = fs::read_to_string(&path).unwrap();
    assert_eq!(active.lines().count(), 1);
    assert!(active.contains("triggers rotation"));
}

#[test]
fn small_active_file_is_not_rotated() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("process.log");
    fs::write(&path, b"small").unwrap();

    let writer = LogWriter::new(&path);
    writer.info("appended");

    assert!(!path.with_file_name("process.log.1").exists());
    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with("small"));
}
