use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use tokio_util::sync::CancellationToken;

use stackdag::exec::{HookFuture, ModuleHook};
use stackdag::options::ModuleOptions;

/// A configurable hook for tests:
/// - records that it was invoked (`ran`)
/// - optionally appends its name to a shared start log
/// - optionally tracks pool occupancy through a [`ConcurrencyGauge`]
/// - optionally sleeps, or blocks until the run is cancelled
/// - returns `Ok(())` or a fixed error
pub struct MockHook {
    name: String,
    ran: AtomicBool,
    error: Option<String>,
    delay: Duration,
    started: Option<Arc<Mutex<Vec<String>>>>,
    gauge: Option<Arc<ConcurrencyGauge>>,
    wait_for_cancel: bool,
}

impl MockHook {
    pub fn succeeding(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ran: AtomicBool::new(false),
            error: None,
            delay: Duration::ZERO,
            started: None,
            gauge: None,
            wait_for_cancel: false,
        }
    }

    pub fn failing(name: &str, message: &str) -> Self {
        let mut hook = Self::succeeding(name);
        hook.error = Some(message.to_string());
        hook
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_start_log(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
        self.started = Some(log);
        self
    }

    pub fn with_gauge(mut self, gauge: Arc<ConcurrencyGauge>) -> Self {
        self.gauge = Some(gauge);
        self
    }

    /// Block inside the hook until the cancellation token fires, then
    /// return an error. Used to hold a worker slot open in tests.
    pub fn wait_for_cancel(mut self, val: bool) -> Self {
        self.wait_for_cancel = val;
        self
    }

    /// Whether the scheduler ever invoked this hook.
    pub fn ran(&self) -> bool {
        self.ran.load(Ordering::SeqCst)
    }
}

impl ModuleHook for MockHook {
    fn run<'a>(&'a self, ctx: CancellationToken, _opts: &'a ModuleOptions) -> HookFuture<'a> {
        Box::pin(async move {
            self.ran.store(true, Ordering::SeqCst);

            if let Some(log) = &self.started {
                log.lock().unwrap().push(self.name.clone());
            }

            let _active = self.gauge.as_ref().map(|g| g.enter());

            if self.wait_for_cancel {
                ctx.cancelled().await;
                return Err(anyhow!("cancelled while waiting"));
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match &self.error {
                Some(message) => Err(anyhow!("{message}")),
                None => Ok(()),
            }
        })
    }
}

/// Tracks how many hooks are inside their critical section at once and
/// the highest count ever observed. Lets tests assert the parallelism
/// bound without timing games.
#[derive(Default)]
pub struct ConcurrencyGauge {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl ConcurrencyGauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> GaugeGuard<'_> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
        GaugeGuard(self)
    }

    /// Highest number of concurrent holders observed so far.
    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

pub struct GaugeGuard<'a>(&'a ConcurrencyGauge);

impl Drop for GaugeGuard<'_> {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}
