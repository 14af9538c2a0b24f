//! Cancellable one-shot timers.

use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// A scheduled action that has not necessarily fired yet.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Prevent the action from running. No effect once it has fired.
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Run `action` once after `delay` on the current tokio runtime.
pub fn schedule_after<F>(delay: Duration, action: F) -> TimerHandle
where
    F: FnOnce() + Send + 'static,
{
    let task = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        action();
    });
    TimerHandle { task }
}

/// Holds at most one armed timer; re-triggering replaces it.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<TimerHandle>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Cancel any armed timer and arm a new one for `action`.
    pub fn trigger<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.take() {
            previous.cancel();
        }
        *pending = Some(schedule_after(self.delay, action));
    }

    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.take() {
            previous.cancel();
        }
    }

    /// A timer is armed and has not fired.
    pub fn is_armed(&self) -> bool {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let make = move || {
            let c = Arc::clone(&c);
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }) as Box<dyn FnOnce() + Send>
        };
        (count, make)
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_after_fires_once() {
        let (count, make) = counter();
        let handle = schedule_after(Duration::from_millis(500), make());

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (count, make) = counter();
        let handle = schedule_after(Duration::from_millis(100), make());
        handle.cancel();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrigger_keeps_only_last_action() {
        let fired = Arc::new(StdMutex::new(Vec::new()));
        let debouncer = Debouncer::new(Duration::from_millis(1000));

        for word in ["hel", "hello", "hello there"] {
            let fired = Arc::clone(&fired);
            debouncer.trigger(move || fired.lock().unwrap().push(word));
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        assert!(debouncer.is_armed());
        assert!(fired.lock().unwrap().is_empty());

        // 300ms already elapsed since the last trigger.
        tokio::time::sleep(Duration::from_millis(699)).await;
        assert!(fired.lock().unwrap().is_empty());
        tokio::time::sleep(Duration::from_millis(2)).await;

        assert_eq!(*fired.lock().unwrap(), vec!["hello there"]);
        assert!(!debouncer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_cancel() {
        let (count, make) = counter();
        let debouncer = Debouncer::new(Duration::from_millis(200));
        debouncer.trigger(make());
        debouncer.cancel();
        assert!(!debouncer.is_armed());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_armed_timer() {
        let (count, make) = counter();
        {
            let debouncer = Debouncer::new(Duration::from_millis(200));
            debouncer.trigger(make());
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
