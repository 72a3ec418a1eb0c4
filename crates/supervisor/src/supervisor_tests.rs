use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use jobsup_adapters::{LogWriter, PidRegistry};
use jobsup_core::{FakeClock, QueueConfig};
use nix::sys::signal::{self, Signal};
use serial_test::serial;

use super::*;
use crate::alarm::LoggingAlarmHook;
use crate::handler::HandlerError;
use crate::signals::MasterSignals;

enum FakeReap {
    Exit(i32, i32),
    NoChildren,
}

fn harness(
    descriptor: JobDescriptor,
) -> (
    Supervisor,
    Arc<Mutex<VecDeque<FakeReap>>>,
    Arc<Mutex<i32>>,
    Arc<Mutex<Option<u64>>>,
    Arc<FakeClock>,
) {
    let dir = tempfile::tempdir().unwrap();
    let pid_registry = PidRegistry::new(dir.path());
    let log = LogWriter::new(dir.path().join("logs/process.log"));
    std::mem::forget(dir);

    let clock = Arc::new(FakeClock::at_unix_secs(1_700_000_000));
    let alarm = Arc::new(LoggingAlarmHook::new(log.clone()));

    let reap_queue: Arc<Mutex<VecDeque<FakeReap>>> = Arc::new(Mutex::new(VecDeque::new()));
    let next_pid = Arc::new(Mutex::new(100));
    let queue_size: Arc<Mutex<Option<u64>>> = Arc::new(Mutex::new(Some(0)));

    let reap_queue_clone = reap_queue.clone();
    let reap = Box::new(move || match reap_queue_clone.lock().unwrap().pop_front() {
        Some(FakeReap::Exit(pid, code)) => Ok(Some((pid, code))),
        Some(FakeReap::NoChildren) => Err(nix::Error::ECHILD),
        None => Ok(None),
    });

    let next_pid_clone = next_pid.clone();
    let spawn = Box::new(
        move |_topic: &TopicId,
              _descriptor: &JobDescriptor,
              _kind: WorkerKind,
              _back_off_until: Option<std::time::SystemTime>| {
            let mut n = next_pid_clone.lock().unwrap();
            let pid = *n;
            *n += 1;
            Ok(pid)
        },
    );

    let queue_size_clone = queue_size.clone();
    let size_probe = Box::new(move |_descriptor: &JobDescriptor| *queue_size_clone.lock().unwrap());

    pid_registry.write_master(std::process::id()).unwrap();
    let mut supervisor = Supervisor::new(pid_registry, log, alarm, clock.clone(), reap, spawn, size_probe);
    supervisor.set_master_pid(std::process::id());
    supervisor.register(Registration::new(
        descriptor,
        Arc::new(|| Box::new(|_: &str| -> Result<(), HandlerError> { Ok(()) }) as Box<dyn Handler>),
    ));

    (supervisor, reap_queue, next_pid, queue_size, clock)
}

fn descriptor(
    topic: &str,
    static_count: i64,
    dynamic_count: i64,
    health: i64,
) -> JobDescriptor {
    JobDescriptor::new(topic, false, static_count, dynamic_count, health, 0, 0, QueueConfig::default()).unwrap()
}

#[test]
fn spawn_baseline_forks_the_configured_static_count() {
    let (mut sup, ..) = harness(descriptor("emails", 3, 0, 0));
    sup.spawn_baseline().unwrap();

    let rt = &sup.state().topics[&TopicId::new("emails")];
    assert_eq!(rt.live_worker_count(), 3);
    assert_eq!(rt.live_static_count(), 3);
}

#[test]
fn a_crashed_static_worker_is_replaced_and_backed_off() {
    let (mut sup, reap_queue, ..) = harness(descriptor("emails", 2, 0, 0));
    sup.spawn_baseline().unwrap();
    let dying_pid = sup.state().topics[&TopicId::new("emails")]
        .all_pids()
        .into_iter()
        .next()
        .unwrap();

    reap_queue.lock().unwrap().push_back(FakeReap::Exit(dying_pid, 1));
    let action = sup.run_once();

    assert_eq!(action, LoopAction::Continue);
    let rt = &sup.state().topics[&TopicId::new("emails")];
    assert_eq!(rt.live_worker_count(), 2, "replacement should keep baseline at 2");
    assert!(!rt.all_pids().contains(&dying_pid));
    assert!(rt.worker_enabled_time.is_some());
}

#[test]
fn autoscale_fires_once_and_dynamic_workers_are_not_replaced() {
    let (mut sup, reap_queue, _next_pid, queue_size, _clock) =
        harness(descriptor("emails", 1, 2, 10));
    sup.spawn_baseline().unwrap();

    *queue_size.lock().unwrap() = Some(25);
    sup.run_once();

    let rt = &sup.state().topics[&TopicId::new("emails")];
    assert_eq!(rt.live_worker_count(), 3, "1 static + 2 dynamic");
    let dynamic_pid = rt
        .workers
        .iter()
        .find(|(_, k)| **k == WorkerKind::Dynamic)
        .map(|(pid, _)| *pid)
        .unwrap();

    reap_queue.lock().unwrap().push_back(FakeReap::Exit(dynamic_pid, 0));
    sup.run_once();

    let rt = &sup.state().topics[&TopicId::new("emails")];
    assert_eq!(rt.live_worker_count(), 2, "dynamic worker must not be respawned");
}

#[test]
fn autoscale_does_not_fire_below_the_health_threshold() {
    let (mut sup, _reap_queue, _next_pid, queue_size, _clock) =
        harness(descriptor("emails", 1, 2, 10));
    sup.spawn_baseline().unwrap();

    *queue_size.lock().unwrap() = Some(5);
    sup.run_once();

    let rt = &sup.state().topics[&TopicId::new("emails")];
    assert_eq!(rt.live_worker_count(), 1);
}

#[test]
#[serial(signals)]
fn drain_completes_only_after_every_child_is_reaped() {
    MasterSignals::reset_for_test();
    let (mut sup, reap_queue, ..) = harness(descriptor("emails", 2, 0, 0));
    sup.spawn_baseline().unwrap();
    let pids = sup.state().topics[&TopicId::new("emails")].all_pids();

    MasterSignals::install().unwrap();
    signal::raise(Signal::SIGUSR1).unwrap();

    assert_eq!(sup.run_once(), LoopAction::Continue);
    assert!(sup.state().shutting_down);

    reap_queue.lock().unwrap().push_back(FakeReap::Exit(pids[0], 0));
    assert_eq!(sup.run_once(), LoopAction::Continue);
    reap_queue.lock().unwrap().push_back(FakeReap::Exit(pids[1], 0));
    assert_eq!(sup.run_once(), LoopAction::Continue);
    assert_eq!(sup.state().total_worker_count(), 0);

    reap_queue.lock().unwrap().push_back(FakeReap::NoChildren);
    assert_eq!(sup.run_once(), LoopAction::Break);

    MasterSignals::reset_for_test();
}
