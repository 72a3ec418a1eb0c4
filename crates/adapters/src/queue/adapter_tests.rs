use std::sync::Arc;

use jobsup_core::{Clock, FakeClock};

use super::*;

fn adapter_at(secs: u64) -> (QueueAdapter<FakeQueueBackend>, Arc<FakeClock>, Arc<FakeSleeper>) {
    let clock = Arc::new(FakeClock::at_unix_secs(secs));
    let sleeper = Arc::new(FakeSleeper::default());
    let adapter = QueueAdapter::new(FakeQueueBackend::new(), clock.clone() as Arc<dyn Clock>)
        .with_sleeper(sleeper.clone() as Arc<dyn Sleeper>);
    (adapter, clock, sleeper)
}

#[test]
fn fifo_round_trip_preserves_order() {
    let (mut q, _clock, _sleeper) = adapter_at(0);
    q.deliver("t", false, "a", 0).unwrap();
    q.deliver("t", false, "b", 0).unwrap();
    q.deliver("t", false, "c", 0).unwrap();

    assert_eq!(q.pop("t", false, 1).unwrap().as_deref(), Some("a"));
    assert_eq!(q.pop("t", false, 1).unwrap().as_deref(), Some("b"));
    assert_eq!(q.pop("t", false, 1).unwrap().as_deref(), Some("c"));
    assert_eq!(q.pop("t", false, 1).unwrap(), None);
}

#[test]
fn fifo_size_reports_list_length() {
    let (mut q, _clock, _sleeper) = adapter_at(0);
    q.deliver("t", false, "a", 0).unwrap();
    q.deliver("t", false, "b", 0).unwrap();
    assert_eq!(q.size("t", false).unwrap(), 2);
}

#[test]
fn delay_message_not_eligible_before_its_time() {
    let (mut q, _clock, sleeper) = adapter_at(100);
    q.deliver("t", true, "x", 103).unwrap();

    assert_eq!(q.size("t", true).unwrap(), 0);
    assert_eq!(q.pop("t", true, 1).unwrap(), None);
    assert_eq!(sleeper.calls.lock().len(), 1);
}

#[test]
fn delay_message_eligible_at_or_after_its_time() {
    let (mut q, clock, _sleeper) = adapter_at(100);
    q.deliver("t", true, "x", 103).unwrap();

    clock.set(std::time::UNIX_EPOCH + std::time::Duration::from_secs(104));
    assert_eq!(q.size("t", true).unwrap(), 1);
    assert_eq!(q.pop("t", true, 1).unwrap().as_deref(), Some("x"));
    assert_eq!(q.pop("t", true, 1).unwrap(), None);
}

#[test]
fn revoke_removes_delay_message_before_it_fires() {
    let (mut q, clock, _sleeper) = adapter_at(100);
    q.deliver("t", true, "x", 103).unwrap();
    assert!(q.revoke("t", true, "x").unwrap());

    clock.set(std::time::UNIX_EPOCH + std::time::Duration::from_secs(200));
    assert_eq!(q.pop("t", true, 1).unwrap(), None);
}

#[test]
fn revoke_is_a_no_op_for_fifo_topics() {
    let (mut q, _clock, _sleeper) = adapter_at(0);
    q.deliver("t", false, "a", 0).unwrap();
    assert!(!q.revoke("t", false, "a").unwrap());
    assert_eq!(q.pop("t", false, 1).unwrap().as_deref(), Some("a"));
}

/// A candidate is always found but the claim always loses the race, so
/// `sorted_remove` always reports `false`.
struct LostRaceBackend;

impl QueueBackend for LostRaceBackend {
    fn push_left(&mut self, _topic: &str, _payload: &str) -> Result<(), QueueError> {
        Ok(())
    }

    fn pop_right_blocking(
        &mut self,
        _topic: &str,
        _timeout_secs: u64,
    ) -> Result<Option<String>, QueueError> {
        Ok(None)
    }

    fn list_len(&mut self, _topic: &str) -> Result<u64, QueueError> {
        Ok(0)
    }

    fn sorted_add(&mut self, _topic: &str, _payload: &str, _score: u64) -> Result<(), QueueError> {
        Ok(())
    }

    fn sorted_remove(&mut self, _topic: &str, _payload: &str) -> Result<bool, QueueError> {
        Ok(false)
    }

    fn sorted_first_eligible(
        &mut self,
        _topic: &str,
        _max_score: u64,
    ) -> Result<Option<String>, QueueError> {
        Ok(Some("contended".to_string()))
    }

    fn sorted_count_le(&mut self, _topic: &str, _max_score: u64) -> Result<u64, QueueError> {
        Ok(1)
    }
}

#[test]
fn losing_the_delay_claim_race_returns_none_without_sleeping() {
    let clock = Arc::new(FakeClock::at_unix_secs(100));
    let sleeper = Arc::new(FakeSleeper::default());
    let mut q = QueueAdapter::new(LostRaceBackend, clock as Arc<dyn Clock>)
        .with_sleeper(sleeper.clone() as Arc<dyn Sleeper>);

    assert_eq!(q.pop("t", true, 1).unwrap(), None);
    assert!(sleeper.calls.lock().is_empty());
}
