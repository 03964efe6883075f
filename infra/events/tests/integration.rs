pub mod fixtures;

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use ehub_events::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier, mpsc};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_emit_reaches_listener() {
        let hub = EventHub::<&str, ()>::new();
        let probe = Probe::new();
        hub.once("test", probe.listener());

        hub.notify(&"test");

        assert_eq!(probe.hits(), 1);
    }

    #[test]
    fn test_only_matching_keys_fire() {
        let hub = EventHub::<&str, ()>::new();
        let probe = Probe::new();
        hub.once("test", probe.listener());

        hub.notify(&"not_registered");

        assert_eq!(probe.hits(), 0);
        assert_eq!(hub.listener_count(Some(&"test")), 1);
    }

    #[test]
    fn test_multiple_listeners_and_keys() {
        let hub = EventHub::<&str, ()>::new();
        let first = Probe::new();
        let second = Probe::new();
        let other = Probe::new();
        hub.once("test1", first.listener());
        hub.once("test1", second.listener());
        hub.once("test2", other.listener());

        hub.notify(&"test1");
        hub.notify(&"test2");

        assert_eq!((first.hits(), second.hits(), other.hits()), (1, 1, 1));
        assert_eq!(hub.listener_count(None), 0);
    }

    #[test]
    fn test_once_fires_at_most_once() {
        let hub = EventHub::<&str, ()>::new();
        let probe = Probe::new();
        hub.once("test", probe.listener());

        hub.notify(&"test");
        hub.notify(&"test");

        assert_eq!(probe.hits(), 1);
    }

    #[test]
    fn test_always_fires_every_time() {
        let hub = EventHub::<&str, u32>::new();
        let journal = Journal::new();
        let _handle = hub.on("tick", journal.listener("on"));

        hub.emit(&"tick", 1);
        hub.emit(&"tick", 2);

        assert_eq!(journal.entries(), vec!["on:1", "on:2"]);
    }

    #[test]
    fn test_invocation_order_singles_then_any_of() {
        let hub = EventHub::<&str, u8>::new();
        let journal = Journal::new();
        let _any = hub.on_any_of(["k", "other"], journal.listener("any"));
        let _first = hub.on("k", journal.listener("first"));
        let _second = hub.on("k", journal.listener("second"));

        hub.emit(&"k", 9);

        assert_eq!(journal.entries(), vec!["first:9", "second:9", "any:9"]);
    }

    #[test]
    fn test_reentrant_emit_from_once_listener() {
        let hub = EventHub::<&str, ()>::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let inner_hub = hub.clone();
        let inner_hits = Arc::clone(&hits);
        hub.once("test", move |()| {
            inner_hits.fetch_add(1, Ordering::SeqCst);
            inner_hub.notify(&"test");
        });

        hub.notify(&"test");

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(hub.listener_count(None), 0);
    }

    #[test]
    fn test_listener_added_during_emission_waits_for_next_pass() {
        let hub = EventHub::<&str, ()>::new();
        let late = Probe::new();

        let inner_hub = hub.clone();
        let late_listener = late.clone();
        hub.once("go", move |()| {
            let _handle = inner_hub.on("go", late_listener.listener());
        });

        hub.notify(&"go");
        assert_eq!(late.hits(), 0);

        hub.notify(&"go");
        assert_eq!(late.hits(), 1);
    }

    #[test]
    fn test_dispose_removes_exactly_one() {
        let hub = EventHub::<&str, ()>::new();
        let kept = Probe::new();
        let removed = Probe::new();

        let disposer = hub.on("remove", removed.listener());
        let _kept = hub.on("remove", kept.listener());
        disposer.dispose();
        hub.notify(&"remove");

        assert_eq!(removed.hits(), 0);
        assert_eq!(kept.hits(), 1);
    }

    #[test]
    fn test_dispose_is_idempotent_and_safe_after_once_fired() {
        let hub = EventHub::<&str, ()>::new();
        let probe = Probe::new();
        let handle = hub.once("fire", probe.listener());
        let _other = hub.on("fire", |()| {});

        hub.notify(&"fire");
        assert!(!handle.is_active());

        handle.dispose();
        handle.clone().dispose();

        assert_eq!(hub.listener_count(Some(&"fire")), 1);
        assert_eq!(probe.hits(), 1);
    }

    #[test]
    fn test_dispose_any_of_listener() {
        let hub = EventHub::<&str, ()>::new();
        let first = Probe::new();
        let second = Probe::new();
        let removed = Probe::new();
        hub.once("event1", first.listener());
        hub.once("event2", second.listener());
        let disposer = hub.on_any_of(["event1", "event2"], removed.listener());

        assert_eq!(hub.listener_count(None), 3);
        disposer.dispose();
        assert_eq!(hub.listener_count(None), 2);

        hub.notify(&"event1");
        hub.notify(&"event2");

        assert_eq!((first.hits(), second.hits(), removed.hits()), (1, 1, 0));
    }

    #[test]
    fn test_once_any_of_fires_on_first_match_only() {
        let hub = EventHub::<&str, ()>::new();
        let probe = Probe::new();
        hub.once_any_of(["x", "y"], probe.listener());

        hub.notify(&"y");
        hub.notify(&"x");
        hub.notify(&"y");

        assert_eq!(probe.hits(), 1);
        assert_eq!(hub.listener_count(Some(&"x")), 0);
    }

    #[test]
    fn test_once_any_of_can_be_registered_again() {
        let hub = EventHub::<&str, ()>::new();
        let first = Probe::new();
        let second = Probe::new();
        hub.once_any_of(["test1", "test2"], first.listener());

        hub.notify(&"test2");
        hub.notify(&"test2");
        hub.notify(&"test3");

        hub.once_any_of(["test1", "test2"], second.listener());
        hub.notify(&"test1");

        assert_eq!((first.hits(), second.hits()), (1, 1));
    }

    #[test]
    fn test_on_any_of_persists() {
        let hub = EventHub::<&str, ()>::new();
        let probe = Probe::new();
        let _handle = hub.on_any_of(["x", "y"], probe.listener());

        hub.notify(&"x");
        hub.notify(&"y");
        hub.notify(&"z");

        assert_eq!(probe.hits(), 2);
    }

    #[test]
    fn test_empty_key_set_is_inert() {
        let hub = EventHub::<&str, ()>::new();
        let probe = Probe::new();
        let disposer = hub.once_any_of(Vec::new(), probe.listener());

        hub.notify(&"anything");

        assert_eq!(hub.listener_count(None), 0);
        assert_eq!(probe.hits(), 0);
        assert!(disposer.id().is_none());
        disposer.dispose();
    }

    #[test]
    fn test_listener_counts() {
        let hub = EventHub::<&str, ()>::new();

        assert_eq!(hub.listener_count(None), 0);
        assert_eq!(hub.listener_count(Some(&"test1")), 0);

        hub.once("test1", |()| {});
        assert_eq!(hub.listener_count(None), 1);
        assert_eq!(hub.listener_count(Some(&"test1")), 1);
        assert_eq!(hub.listener_count(Some(&"test2")), 0);

        let _t2 = hub.on("test2", |()| {});
        assert_eq!(hub.listener_count(None), 2);
        assert_eq!(hub.listener_count(Some(&"test1")), 1);
        assert_eq!(hub.listener_count(Some(&"test2")), 1);

        let _t1 = hub.on("test1", |()| {});
        assert_eq!(hub.listener_count(None), 3);
        assert_eq!(hub.listener_count(Some(&"test1")), 2);
        assert_eq!(hub.listener_count(Some(&"test2")), 1);

        hub.once_any_of(["test1", "test2"], |()| {});
        assert_eq!(hub.listener_count(None), 4);
        assert_eq!(hub.listener_count(Some(&"test1")), 3);
        assert_eq!(hub.listener_count(Some(&"test2")), 2);

        let _both = hub.on_any_of(["test1", "test2"], |()| {});
        assert_eq!(hub.listener_count(None), 5);
        assert_eq!(hub.listener_count(Some(&"test1")), 4);
        assert_eq!(hub.listener_count(Some(&"test2")), 3);

        hub.remove_all_listeners(Some(&"test1"));
        assert_eq!(hub.listener_count(None), 3);
        assert_eq!(hub.listener_count(Some(&"test1")), 0);
        assert_eq!(hub.listener_count(Some(&"test2")), 3);

        hub.remove_all_listeners(None);
        assert_eq!(hub.listener_count(None), 0);
        assert_eq!(hub.listener_count(Some(&"test1")), 0);
        assert_eq!(hub.listener_count(Some(&"test2")), 0);
    }

    #[test]
    fn test_remove_all_for_key_keeps_spanning_listener_for_other_keys() {
        let hub = EventHub::<&str, ()>::new();
        let only_t1 = Probe::new();
        let only_t2 = Probe::new();
        let spanning = Probe::new();
        let _a = hub.on("t1", only_t1.listener());
        let _b = hub.on("t2", only_t2.listener());
        let _c = hub.on_any_of(["t1", "t2"], spanning.listener());

        hub.remove_all_listeners(Some(&"t1"));
        hub.notify(&"t1");
        hub.notify(&"t2");

        assert_eq!((only_t1.hits(), only_t2.hits(), spanning.hits()), (0, 1, 1));
    }

    #[test]
    fn test_lazy_payload_is_built_once_and_only_when_needed() {
        let hub = EventHub::<&str, String>::new();
        let built = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&built);
        hub.emit_with(&"nobody", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            "unused".to_owned()
        });
        assert_eq!(built.load(Ordering::SeqCst), 0);

        let journal = Journal::new();
        let _a = hub.on("somebody", journal.listener("a"));
        let _b = hub.on("somebody", journal.listener("b"));
        let counter = Arc::clone(&built);
        hub.emit_with(&"somebody", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            "payload".to_owned()
        });

        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eq!(journal.entries(), vec!["a:\"payload\"", "b:\"payload\""]);
    }

    #[test]
    fn test_lazy_scheduled_payload_skips_producer_and_target_without_listeners() {
        let hub = EventHub::<&str, String>::new();
        let target = CountingTarget::new();
        let built = Arc::new(AtomicUsize::new(0));
        let _other = hub.on("elsewhere", |_: &String| {});

        let counter = Arc::clone(&built);
        hub.emit_on_with(&"nobody", &target, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            "unused".to_owned()
        });
        assert_eq!(built.load(Ordering::SeqCst), 0);
        assert_eq!(target.dispatched(), 0);

        let journal = Journal::new();
        let _a = hub.on("somebody", journal.listener("a"));
        let _b = hub.once("somebody", journal.listener("b"));
        let counter = Arc::clone(&built);
        hub.emit_on_with(&"somebody", &target, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            "payload".to_owned()
        });

        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eq!(target.dispatched(), 2);
        assert_eq!(journal.entries(), vec!["a:\"payload\"", "b:\"payload\""]);
    }

    #[test]
    fn test_dispatch_target_runs_off_the_calling_thread() {
        let runtime = named_runtime("hub-dispatch");
        let hub = EventHub::<&str, ()>::new();
        let (tx, rx) = mpsc::channel();

        hub.once("fire", move |()| {
            let name = thread::current().name().map(str::to_owned);
            tx.send(name).unwrap();
        });
        hub.notify_on(&"fire", runtime.handle());

        let ran_on = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(ran_on.as_deref(), Some("hub-dispatch"));
    }

    #[test]
    fn test_no_dispatch_target_runs_inline_before_returning() {
        let hub = EventHub::<&str, ()>::new();
        let caller = thread::current().id();
        let ran_on = Arc::new(parking_lot::Mutex::new(None));

        let slot = Arc::clone(&ran_on);
        hub.once("fire", move |()| {
            *slot.lock() = Some(thread::current().id());
        });
        hub.notify(&"fire");

        assert_eq!(*ran_on.lock(), Some(caller));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_emit_on_current_runtime_shares_one_payload() {
        let hub = EventHub::<u8, Vec<u8>>::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        for label in 0..3u8 {
            let tx = tx.clone();
            let _handle = hub.on(1, move |payload: &Vec<u8>| {
                tx.send((label, payload.clone())).unwrap();
            });
        }
        drop(tx);

        let target = tokio::runtime::Handle::current();
        hub.emit_on(&1, &target, vec![4, 2]);

        let mut labels = Vec::new();
        while let Ok(Some((label, payload))) =
            tokio::time::timeout(Duration::from_secs(2), rx.recv()).await
        {
            assert_eq!(payload, vec![4, 2]);
            labels.push(label);
            if labels.len() == 3 {
                break;
            }
        }
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1, 2]);
    }

    #[test]
    fn test_dispose_does_not_cancel_already_scheduled_invocation() {
        let runtime = named_runtime("hub-scheduled");
        let hub = EventHub::<&str, ()>::new();
        let gate = Arc::new(Barrier::new(2));
        let (tx, rx) = mpsc::channel();

        let blocker_gate = Arc::clone(&gate);
        let _blocker = hub.on("go", move |()| {
            blocker_gate.wait();
        });
        let handle = hub.on("go", move |()| {
            tx.send(()).unwrap();
        });

        hub.notify_on(&"go", runtime.handle());
        handle.dispose();
        gate.wait();

        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        assert_eq!(hub.listener_count(Some(&"go")), 1);
    }

    #[test]
    fn test_panicking_listener_propagates_and_hub_stays_usable() {
        let hub = EventHub::<&str, ()>::new();
        hub.once("boom", |()| panic!("listener failure"));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| hub.notify(&"boom")));
        assert!(result.is_err());

        let probe = Probe::new();
        hub.once("boom", probe.listener());
        hub.notify(&"boom");
        assert_eq!(probe.hits(), 1);
    }

    #[test]
    fn test_concurrent_emitters_fire_once_listeners_exactly_once() {
        const LISTENERS: usize = 64;
        const EMITTERS: usize = 8;

        let hub = EventHub::<&str, ()>::new();
        let probe = Probe::new();
        for _ in 0..LISTENERS {
            hub.once("race", probe.listener());
        }

        let start = Arc::new(Barrier::new(EMITTERS));
        let workers: Vec<_> = (0..EMITTERS)
            .map(|_| {
                let hub = hub.clone();
                let start = Arc::clone(&start);
                thread::spawn(move || {
                    start.wait();
                    for _ in 0..100 {
                        hub.notify(&"race");
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(probe.hits(), LISTENERS);
        assert_eq!(hub.listener_count(None), 0);
    }

    #[test]
    fn test_concurrent_register_and_dispose_leave_table_empty() {
        let hub = EventHub::<u32, ()>::new();
        let workers: Vec<_> = (0..4u32)
            .map(|worker| {
                let hub = hub.clone();
                thread::spawn(move || {
                    for round in 0..250u32 {
                        let single = hub.on(worker, |()| {});
                        let any = hub.on_any_of([worker, round + 1000], |()| {});
                        hub.notify(&worker);
                        single.dispose();
                        any.dispose();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(hub.listener_count(None), 0);
    }

    #[test]
    fn test_dispose_bag_cancels_collected_handles() {
        let hub = EventHub::<&str, ()>::new();
        let probe = Probe::new();
        let bag = DisposeBag::new();

        hub.on("a", probe.listener()).add_to(&bag);
        hub.on_any_of(["a", "b"], probe.listener()).add_to(&bag);
        bag.add(hub.once("b", probe.listener()));
        assert_eq!(bag.len(), 3);

        drop(bag);
        hub.notify(&"a");
        hub.notify(&"b");

        assert_eq!(probe.hits(), 0);
        assert_eq!(hub.listener_count(None), 0);
    }
}
