use anyhow::Context;
use ehub::config::HubConfig;
use ehub::lifecycle::{ApplicationState, ApplicationStatus, LifecyclePlatform, LifecycleSignal, ManualPlatform};
use ehub::runtime::build_runtime_with_config;
use ehub::{Disposable, DisposeBag, EventHub, lifecycle_callback_queue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::time::Duration;
use tracing::{debug, info};

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Domain events carried by the demo hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    Tick,
    Sync,
    Shutdown,
}

/// What the scripted run observed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub transitions: usize,
    pub ticks: usize,
    pub activity: usize,
    pub shutdowns: usize,
    pub listeners_before_dispose: usize,
    pub listeners_after_dispose: usize,
}

#[derive(Debug, Default)]
struct Counters {
    transitions: AtomicUsize,
    ticks: AtomicUsize,
    activity: AtomicUsize,
    shutdowns: AtomicUsize,
}

/// The signal a platform posts when moving from `from` to `to`.
const fn signal_for(from: ApplicationStatus, to: ApplicationStatus) -> LifecycleSignal {
    match (from, to) {
        (ApplicationStatus::Background, ApplicationStatus::Inactive) => LifecycleSignal::WillEnterForeground,
        (_, ApplicationStatus::Inactive) => LifecycleSignal::WillResignActive,
        (_, ApplicationStatus::Active) => LifecycleSignal::DidBecomeActive,
        (_, ApplicationStatus::Background) => LifecycleSignal::DidEnterBackground,
    }
}

/// Walks `script` `cycles` times, emitting a tick per step onto the dispatch
/// runtime and a sync per cycle, then shuts down and disposes every listener.
///
/// # Errors
///
/// Returns an error if a dispatch context cannot be started or runtime
/// deliveries do not complete in time.
pub fn run(config: &HubConfig, script: &[ApplicationStatus], cycles: u32) -> anyhow::Result<Report> {
    let runtime = build_runtime_with_config(&config.runtime.runtime_config())?;
    let callbacks = lifecycle_callback_queue(&config.lifecycle)?;
    let platform = Arc::new(ManualPlatform::new(config.lifecycle.initial_status));
    let state = ApplicationState::new(
        Arc::clone(&platform) as Arc<dyn LifecyclePlatform>,
        Arc::new(callbacks.clone()),
    );

    let hub = EventHub::<Activity, u32>::new();
    let counters = Arc::new(Counters::default());
    let (done, completed) = mpsc::channel::<Activity>();
    let bag = DisposeBag::new();

    let seen = Arc::clone(&counters);
    state
        .add_transition_listener(move |new, old| {
            if new != old {
                seen.transitions.fetch_add(1, Ordering::SeqCst);
                info!(%old, %new, "Application status changed");
            }
        })
        .add_to(&bag);

    let (seen, tx) = (Arc::clone(&counters), done.clone());
    hub.on(Activity::Tick, move |cycle: &u32| {
        seen.ticks.fetch_add(1, Ordering::SeqCst);
        debug!(cycle, "Tick delivered");
        let _ = tx.send(Activity::Tick);
    })
    .add_to(&bag);

    let (seen, tx) = (Arc::clone(&counters), done);
    hub.on_any_of([Activity::Tick, Activity::Sync], move |_: &u32| {
        seen.activity.fetch_add(1, Ordering::SeqCst);
        let _ = tx.send(Activity::Sync);
    })
    .add_to(&bag);

    let seen = Arc::clone(&counters);
    hub.once(Activity::Shutdown, move |cycles: &u32| {
        seen.shutdowns.fetch_add(1, Ordering::SeqCst);
        info!(cycles, "Shutdown observed");
    })
    .add_to(&bag);

    let mut current = platform.current_status();
    for cycle in 0..cycles {
        for &status in script {
            platform.transition(status, signal_for(current, status));
            current = status;
            hub.emit_on(&Activity::Tick, runtime.handle(), cycle);
        }
        hub.emit_on(&Activity::Sync, runtime.handle(), cycle);
    }

    let steps = usize::try_from(cycles)?.saturating_mul(script.len());
    let expected = steps * 2 + usize::try_from(cycles)?;
    for _ in 0..expected {
        completed.recv_timeout(DRAIN_TIMEOUT).context("Runtime deliveries did not complete")?;
    }

    hub.emit(&Activity::Shutdown, cycles);
    hub.emit(&Activity::Shutdown, cycles);
    callbacks.barrier();

    let listeners_before_dispose = hub.listener_count(None) + state.listener_count();
    bag.dispose();
    let listeners_after_dispose = hub.listener_count(None) + state.listener_count();

    Ok(Report {
        transitions: counters.transitions.load(Ordering::SeqCst),
        ticks: counters.ticks.load(Ordering::SeqCst),
        activity: counters.activity.load(Ordering::SeqCst),
        shutdowns: counters.shutdowns.load(Ordering::SeqCst),
        listeners_before_dispose,
        listeners_after_dispose,
    })
}
