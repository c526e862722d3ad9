//! Synchronization primitives (§3, C11): `Fence`, `Semaphore`, and `Event`
//! reduced to what a single-threaded-per-queue CPU driver actually needs —
//! a host mutex/condvar pair standing in for what a real driver would signal
//! from an interrupt handler. Queue submission on this driver runs command
//! buffers to completion inline (`crate::queue::Queue::submit`), so a fence
//! is really just a latch the caller can poll or block on afterwards.
use std::sync::{Condvar, Mutex};
use std::time::Duration;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WaitResult {
    Success,
    Timeout,
}

struct Latch {
    signaled: Mutex<bool>,
    condvar: Condvar,
}

impl Latch {
    fn new(initial: bool) -> Latch {
        Latch { signaled: Mutex::new(initial), condvar: Condvar::new() }
    }

    fn signal(&self) {
        *self.signaled.lock().unwrap() = true;
        self.condvar.notify_all();
    }

    fn reset(&self) {
        *self.signaled.lock().unwrap() = false;
    }

    fn status(&self) -> bool {
        *self.signaled.lock().unwrap()
    }

    fn wait(&self, timeout: Option<Duration>) -> WaitResult {
        let guard = self.signaled.lock().unwrap();
        if *guard {
            return WaitResult::Success;
        }
        match timeout {
            None => {
                let _ = self.condvar.wait_while(guard, |signaled| !*signaled).unwrap();
                WaitResult::Success
            }
            Some(d) => {
                let (guard, result) = self.condvar.wait_timeout_while(guard, d, |signaled| !*signaled).unwrap();
                if *guard {
                    WaitResult::Success
                } else {
                    debug_assert!(result.timed_out());
                    WaitResult::Timeout
                }
            }
        }
    }
}

/// A CPU-side fence: since `Queue::submit` runs its command buffers
/// synchronously, a fence passed to submission is signaled before `submit`
/// returns — callers still go through `wait`/`status`/`reset` for API
/// fidelity, but will never observe `Timeout` unless `timeout` is zero and
/// they race the call with `reset`.
pub struct Fence {
    latch: Latch,
}

impl Fence {
    pub fn new(signaled: bool) -> Fence {
        Fence { latch: Latch::new(signaled) }
    }
    pub fn signal(&self) {
        self.latch.signal();
    }
    pub fn reset(&self) {
        self.latch.reset();
    }
    pub fn status(&self) -> bool {
        self.latch.status()
    }
    pub fn wait(&self, timeout: Option<Duration>) -> WaitResult {
        self.latch.wait(timeout)
    }
}

pub fn wait_for_fences(fences: &[&Fence], wait_all: bool, timeout: Option<Duration>) -> WaitResult {
    if wait_all {
        for f in fences {
            if f.wait(timeout) == WaitResult::Timeout {
                return WaitResult::Timeout;
            }
        }
        return WaitResult::Success;
    }
    if fences.is_empty() {
        return WaitResult::Success;
    }
    loop {
        if fences.iter().any(|f| f.status()) {
            return WaitResult::Success;
        }
        if fences.iter().any(|f| f.wait(timeout) == WaitResult::Success) {
            return WaitResult::Success;
        }
        return WaitResult::Timeout;
    }
}

/// A binary semaphore. Submission on this driver has no asynchronous
/// scheduling to order against another queue's in-flight work, so
/// semaphores are tracked purely for API completeness (`VkQueueSubmit`'s
/// wait/signal lists are accepted and, when a caller waits on one through a
/// fence-style poll, observed as already signaled once the submitting
/// `submit` call returns).
pub struct Semaphore {
    signaled: Mutex<bool>,
}

impl Semaphore {
    pub fn new() -> Semaphore {
        Semaphore { signaled: Mutex::new(false) }
    }
    pub fn signal(&self) {
        *self.signaled.lock().unwrap() = true;
    }
    pub fn take(&self) -> bool {
        let mut guard = self.signaled.lock().unwrap();
        let was = *guard;
        *guard = false;
        was
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new()
    }
}

/// Manual-reset event (§9 Open Question resolution: `CmdSetEvent`/
/// `CmdResetEvent`/`CmdWaitEvents` behave like `VK_EVENT_CREATE_*` with no
/// auto-reset extension — an event stays signaled until explicitly reset,
/// never as a side effect of a wait observing it).
pub struct Event {
    latch: Latch,
}

impl Event {
    pub fn new() -> Event {
        Event { latch: Latch::new(false) }
    }
    pub fn set(&self) {
        self.latch.signal();
    }
    pub fn reset(&self) {
        self.latch.reset();
    }
    pub fn status(&self) -> bool {
        self.latch.status()
    }
    pub fn wait(&self, timeout: Option<Duration>) -> WaitResult {
        self.latch.wait(timeout)
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_created_signaled_reports_success_immediately() {
        let fence = Fence::new(true);
        assert_eq!(fence.wait(Some(Duration::from_millis(1))), WaitResult::Success);
    }

    #[test]
    fn event_stays_signaled_until_explicitly_reset() {
        let event = Event::new();
        event.set();
        assert!(event.status());
        assert!(event.status()); // observing it does not auto-reset
        event.reset();
        assert!(!event.status());
    }

    #[test]
    fn wait_for_fences_any_succeeds_when_one_is_already_signaled() {
        let a = Fence::new(false);
        let b = Fence::new(true);
        assert_eq!(wait_for_fences(&[&a, &b], false, Some(Duration::from_millis(1))), WaitResult::Success);
    }

    #[test]
    fn wait_for_fences_all_times_out_if_any_is_unsignaled() {
        let a = Fence::new(true);
        let b = Fence::new(false);
        assert_eq!(wait_for_fences(&[&a, &b], true, Some(Duration::from_millis(1))), WaitResult::Timeout);
    }
}
