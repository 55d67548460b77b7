use std::sync::Arc;
use std::thread;

use super::*;

#[test]
fn wait_any_clears_only_the_bits_it_returns() {
    let g = EventGroup::new();
    g.set(EVENT_SKIP | EVENT_SHUTDOWN);
    assert_eq!(g.wait_any(EVENT_SKIP, None), EVENT_SKIP);
    assert_eq!(g.get(), EVENT_SHUTDOWN);
}

#[test]
fn wait_any_times_out_with_zero() {
    let g = EventGroup::new();
    assert_eq!(g.wait_any(EVENT_TRACK_FINISHED, Some(Duration::from_millis(20))), 0);
}

#[test]
fn set_from_another_thread_wakes_waiter() {
    let g = Arc::new(EventGroup::new());
    let g2 = Arc::clone(&g);
    let h = thread::spawn(move || g2.wait_any(EVENT_TRACK_FINISHED, Some(Duration::from_secs(5))));
    thread::sleep(Duration::from_millis(20));
    g.set(EVENT_TRACK_FINISHED);
    assert_eq!(h.join().unwrap(), EVENT_TRACK_FINISHED);
}
