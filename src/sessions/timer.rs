// src/sessions/timer.rs
//
// Fire-once staged timers for demo sessions. Each stage waits its delay
// (relative to the previous stage) and then runs a short synchronous
// closure. Built on tokio time, so tests drive it with a paused clock.
// There is no cancel handle: once spawned, every stage runs.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

type Stage = Box<dyn FnOnce() + Send + 'static>;

pub struct SessionTimer {
    name: &'static str,
    stages: Vec<(Duration, Stage)>,
}

impl SessionTimer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            stages: Vec::new(),
        }
    }

    pub fn then_after(mut self, delay: Duration, stage: impl FnOnce() + Send + 'static) -> Self {
        self.stages.push((delay, Box::new(stage)));
        self
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Detach onto `runtime`; callers need not be inside it.
    pub fn spawn(self, runtime: &Handle) -> JoinHandle<()> {
        let SessionTimer { name, stages } = self;
        runtime.spawn(async move {
            let total = stages.len();
            for (i, (delay, stage)) in stages.into_iter().enumerate() {
                tokio::time::sleep(delay).await;
                stage();
                debug!("⏱️ {} stage {}/{} fired", name, i + 1, total);
            }
        })
    }
}

/// The captured runtime, else the one the caller is running inside.
pub fn resolve_runtime(captured: Option<&Handle>) -> Option<Handle> {
    captured.cloned().or_else(|| Handle::try_current().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_stages_fire_in_order_at_cumulative_offsets() {
        let fired = Arc::new(AtomicU32::new(0));
        let (a, b) = (Arc::clone(&fired), Arc::clone(&fired));

        let timer = SessionTimer::new("test")
            .then_after(Duration::from_secs(15), move || {
                a.fetch_add(1, Ordering::SeqCst);
            })
            .then_after(Duration::from_secs(10), move || {
                b.fetch_add(10, Ordering::SeqCst);
            });
        assert_eq!(timer.stage_count(), 2);
        let handle = timer.spawn(&Handle::current());

        tokio::time::sleep(Duration::from_millis(14_900)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(9_800)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        handle.await.unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_resolve_runtime_outside_any_runtime() {
        assert!(resolve_runtime(None).is_none());

        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        assert!(resolve_runtime(Some(rt.handle())).is_some());
    }
}
