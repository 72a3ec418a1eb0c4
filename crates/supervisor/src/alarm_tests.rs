use tempfile::tempdir;

use super::*;

#[test]
fn logging_alarm_hook_never_panics_on_either_event() {
    let dir = tempdir().unwrap();
    let hook = LoggingAlarmHook::new(LogWriter::new(dir.path().join("process.log")));

    hook.notify(&AlarmEvent::WorkerCrashed {
        topic: "emails".to_string(),
        pid: 4242,
    });
    hook.notify(&AlarmEvent::AutoscaleTriggered {
        topic: "emails".to_string(),
        added: 2,
    });

    let contents = std::fs::read_to_string(dir.path().join("process.log")).unwrap();
    assert!(contents.contains("crashed"));
    assert!(contents.contains("added 2 workers"));
}
