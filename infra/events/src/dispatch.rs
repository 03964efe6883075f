use std::sync::Arc;

/// A unit of work handed to a [`DispatchTarget`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// An execution context that listener invocations can be scheduled onto.
///
/// Implementations decide where and when a job runs; the hub only promises to
/// hand every matched invocation over before `emit_on` returns.
pub trait DispatchTarget: Send + Sync {
    /// Schedules `job` for execution.
    fn dispatch(&self, job: Job);
}

/// Runs each job on the runtime's blocking pool, since listener bodies are
/// synchronous code.
impl DispatchTarget for tokio::runtime::Handle {
    fn dispatch(&self, job: Job) {
        drop(self.spawn_blocking(job));
    }
}

impl<T: DispatchTarget + ?Sized> DispatchTarget for Arc<T> {
    fn dispatch(&self, job: Job) {
        (**self).dispatch(job);
    }
}

impl<T: DispatchTarget + ?Sized> DispatchTarget for Box<T> {
    fn dispatch(&self, job: Job) {
        (**self).dispatch(job);
    }
}

impl<T: DispatchTarget + ?Sized> DispatchTarget for &T {
    fn dispatch(&self, job: Job) {
        (**self).dispatch(job);
    }
}
