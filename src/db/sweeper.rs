use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::spawn_blocking;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{event, Level};

use crate::error::Result;

/// A repeating cleanup job owned by whoever started it.
///
/// The schedule stops when the `Sweeper` is stopped or dropped. A sweep that
/// is already running is left to finish.
#[derive(Debug)]
pub struct Sweeper {
    stop: Option<oneshot::Sender<()>>,
}

impl Sweeper {
    /// Runs `sweep` on the blocking pool every `period`, starting one period
    /// from now.
    pub fn start<F>(runtime: &Handle, period: Duration, sweep: F) -> Self
    where
        F: Fn() -> Result<usize> + Send + Sync + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let sweep = Arc::new(sweep);
        let (stop, mut stopped) = oneshot::channel::<()>();

        runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stopped => break,
                    _ = interval.tick() => {}
                }

                let sweep = Arc::clone(&sweep);
                match spawn_blocking(move || (*sweep)()).await {
                    Ok(Ok(0)) => {}
                    Ok(Ok(removed)) => event!(Level::INFO, removed, "Swept token rows"),
                    Ok(Err(e)) => event!(Level::ERROR, error = %e, "Token sweep failed"),
                    Err(e) => event!(Level::ERROR, error = %e, "Token sweep did not complete"),
                }
            }

            event!(Level::DEBUG, "Token sweep stopped");
        });

        Self { stop: Some(stop) }
    }

    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
