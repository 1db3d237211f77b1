//! # Tick Scheduler
//!
//! Fixed-interval loop driving every registered component.
//!
//! ## Order
//!
//! ```text
//! init:     registration order
//! tick:     systems (registration order), then managers (registration order)
//! shutdown: reverse registration order, failures logged and skipped
//! ```
//!
//! Each tick carries the wall-clock seconds since the previous tick start.
//! The loop sleeps `max(0, interval - processing)` between ticks.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::shutdown::ShutdownToken;

/// Failure raised by a component's `init` or `destroy`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{component}: {reason}")]
pub struct LifecycleError {
    /// Component name.
    pub component: String,
    /// What went wrong.
    pub reason: String,
}

impl LifecycleError {
    /// Creates an error for `component`.
    #[must_use]
    pub fn new(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            reason: reason.into(),
        }
    }
}

/// Why the tick thread stopped before a requested shutdown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TickFailure {
    /// A component refused to start.
    #[error("start-up failed: {0}")]
    Init(#[from] LifecycleError),

    /// A component panicked inside the loop.
    #[error("tick loop panicked: {0}")]
    Panicked(String),
}

impl TickFailure {
    /// Builds a [`TickFailure::Panicked`] from a `catch_unwind` payload.
    #[must_use]
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());
        Self::Panicked(message)
    }
}

/// Something the scheduler drives.
pub trait Lifecycle: Send {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Called once before the first tick.
    ///
    /// # Errors
    ///
    /// Aborts start-up.
    fn init(&mut self) -> Result<(), LifecycleError> {
        Ok(())
    }

    /// Called once per tick.
    fn update(&mut self, delta_seconds: f32);

    /// Called once on shutdown.
    ///
    /// # Errors
    ///
    /// Logged; siblings are still torn down.
    fn destroy(&mut self) -> Result<(), LifecycleError> {
        Ok(())
    }
}

/// Component role, deciding its slot within a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentKind {
    /// Runs first each tick.
    System,
    /// Runs after all systems.
    Manager,
}

struct Registered {
    kind: ComponentKind,
    component: Box<dyn Lifecycle>,
}

/// Tick timing statistics.
#[derive(Clone, Copy, Debug)]
pub struct TickStats {
    /// Minimum tick duration observed.
    pub min_tick_us: u64,
    /// Maximum tick duration observed.
    pub max_tick_us: u64,
    /// Average tick duration (rolling).
    pub avg_tick_us: u64,
    /// Ticks that took longer than the interval.
    pub late_ticks: u64,
    /// Total ticks measured.
    pub total_ticks: u64,
}

impl TickStats {
    fn new(interval: Duration) -> Self {
        Self {
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            avg_tick_us: micros(interval),
            late_ticks: 0,
            total_ticks: 0,
        }
    }

    fn record(&mut self, processing: Duration, interval: Duration) {
        let us = micros(processing);
        self.total_ticks += 1;
        self.min_tick_us = self.min_tick_us.min(us);
        self.max_tick_us = self.max_tick_us.max(us);
        self.avg_tick_us = (self.avg_tick_us * 15 + us) / 16;
        if processing > interval {
            self.late_ticks += 1;
        }
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// The simulation loop.
pub struct TickScheduler {
    components: Vec<Registered>,
    interval: Duration,
    settle_delay: Duration,
    last_tick: Option<Instant>,
    tick_count: u64,
    stats: TickStats,
}

impl TickScheduler {
    /// Scheduler ticking every `interval`, starting after `settle_delay`.
    #[must_use]
    pub fn new(interval: Duration, settle_delay: Duration) -> Self {
        Self {
            components: Vec::new(),
            interval,
            settle_delay,
            last_tick: None,
            tick_count: 0,
            stats: TickStats::new(interval),
        }
    }

    /// Registers a system.
    pub fn add_system(&mut self, system: Box<dyn Lifecycle>) {
        self.add(ComponentKind::System, system);
    }

    /// Registers a manager.
    pub fn add_manager(&mut self, manager: Box<dyn Lifecycle>) {
        self.add(ComponentKind::Manager, manager);
    }

    fn add(&mut self, kind: ComponentKind, component: Box<dyn Lifecycle>) {
        tracing::debug!(component = component.name(), ?kind, "component registered");
        self.components.push(Registered { kind, component });
    }

    /// Registered component names with their role, in registration order.
    #[must_use]
    pub fn components(&self) -> Vec<(ComponentKind, String)> {
        self.components
            .iter()
            .map(|r| (r.kind, r.component.name().to_owned()))
            .collect()
    }

    /// Initializes every component in registration order.
    ///
    /// # Errors
    ///
    /// The first failing component's error.
    pub fn init_all(&mut self) -> Result<(), LifecycleError> {
        for registered in &mut self.components {
            registered.component.init()?;
            tracing::info!(component = registered.component.name(), "component initialized");
        }
        Ok(())
    }

    /// Runs one tick: all systems, then all managers.
    pub fn tick(&mut self, delta_seconds: f32) {
        for kind in [ComponentKind::System, ComponentKind::Manager] {
            for registered in self.components.iter_mut().filter(|r| r.kind == kind) {
                registered.component.update(delta_seconds);
            }
        }
        self.tick_count += 1;
    }

    /// Runs one timed tick and returns how long to sleep before the next.
    pub fn step(&mut self) -> Duration {
        let start = Instant::now();
        let delta = self
            .last_tick
            .map_or(self.interval, |last| start.duration_since(last));
        self.last_tick = Some(start);

        self.tick(delta.as_secs_f32());

        let processing = start.elapsed();
        self.stats.record(processing, self.interval);
        if processing > self.interval {
            tracing::trace!(processing_us = micros(processing), "late tick");
        }
        self.interval.saturating_sub(processing)
    }

    /// Runs until `shutdown` fires, then tears everything down.
    ///
    /// Panics raised by components unwind out of here; the tick thread
    /// turns them into a process shutdown.
    pub fn run(&mut self, shutdown: &ShutdownToken) {
        let settle_until = Instant::now() + self.settle_delay;
        while !shutdown.is_cancelled() && Instant::now() < settle_until {
            std::thread::sleep(self.interval.min(settle_until.saturating_duration_since(Instant::now())));
        }

        tracing::info!(interval_us = micros(self.interval), "tick loop started");
        while !shutdown.is_cancelled() {
            let sleep = self.step();
            if !sleep.is_zero() {
                std::thread::sleep(sleep);
            }
        }

        tracing::info!(
            ticks = self.tick_count,
            avg_tick_us = self.stats.avg_tick_us,
            late_ticks = self.stats.late_ticks,
            "tick loop stopped"
        );
        self.shutdown();
    }

    /// Destroys components in reverse registration order.
    ///
    /// Returns the number of components whose teardown failed.
    pub fn shutdown(&mut self) -> usize {
        let mut failures = 0;
        for registered in self.components.iter_mut().rev() {
            match registered.component.destroy() {
                Ok(()) => tracing::debug!(component = registered.component.name(), "component destroyed"),
                Err(e) => {
                    failures += 1;
                    tracing::warn!(error = %e, "component teardown failed");
                }
            }
        }
        failures
    }

    /// Ticks executed.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Timing statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Target interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Probe {
        name: &'static str,
        log: Log,
        fail_destroy: bool,
    }

    impl Probe {
        fn boxed(name: &'static str, log: &Log) -> Box<dyn Lifecycle> {
            Box::new(Self {
                name,
                log: Arc::clone(log),
                fail_destroy: false,
            })
        }
    }

    impl Lifecycle for Probe {
        fn name(&self) -> &str {
            self.name
        }

        fn init(&mut self) -> Result<(), LifecycleError> {
            self.log.lock().push(format!("init {}", self.name));
            Ok(())
        }

        fn update(&mut self, _delta_seconds: f32) {
            self.log.lock().push(format!("update {}", self.name));
        }

        fn destroy(&mut self) -> Result<(), LifecycleError> {
            self.log.lock().push(format!("destroy {}", self.name));
            if self.fail_destroy {
                Err(LifecycleError::new(self.name, "refused"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_systems_run_before_managers() {
        let log = Log::default();
        let mut scheduler = TickScheduler::new(Duration::from_millis(16), Duration::ZERO);
        scheduler.add_manager(Probe::boxed("m1", &log));
        scheduler.add_system(Probe::boxed("s1", &log));
        scheduler.add_manager(Probe::boxed("m2", &log));
        scheduler.add_system(Probe::boxed("s2", &log));

        scheduler.init_all().unwrap();
        scheduler.tick(0.016);

        assert_eq!(
            *log.lock(),
            vec![
                "init m1", "init s1", "init m2", "init s2", "update s1", "update s2", "update m1",
                "update m2",
            ]
        );
        assert_eq!(scheduler.tick_count(), 1);
    }

    #[test]
    fn test_shutdown_reverse_order_isolates_failures() {
        let log = Log::default();
        let mut scheduler = TickScheduler::new(Duration::from_millis(16), Duration::ZERO);
        scheduler.add_system(Probe::boxed("a", &log));
        scheduler.add_system(Box::new(Probe {
            name: "b",
            log: Arc::clone(&log),
            fail_destroy: true,
        }));
        scheduler.add_manager(Probe::boxed("c", &log));

        assert_eq!(scheduler.shutdown(), 1);
        assert_eq!(*log.lock(), vec!["destroy c", "destroy b", "destroy a"]);
    }

    #[test]
    fn test_step_reports_remaining_interval() {
        let log = Log::default();
        let mut scheduler = TickScheduler::new(Duration::from_millis(50), Duration::ZERO);
        scheduler.add_system(Probe::boxed("s", &log));

        let sleep = scheduler.step();
        assert!(sleep <= Duration::from_millis(50));
        assert!(sleep > Duration::from_millis(10));
        assert_eq!(scheduler.stats().total_ticks, 1);
    }

    #[test]
    fn test_panic_payload_message() {
        let payload = std::panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(
            TickFailure::from_panic(payload.as_ref()),
            TickFailure::Panicked("static message".to_owned())
        );

        let count = 3;
        let payload = std::panic::catch_unwind(|| panic!("{count} components")).unwrap_err();
        assert_eq!(
            TickFailure::from_panic(payload.as_ref()),
            TickFailure::Panicked("3 components".to_owned())
        );
    }

    #[test]
    fn test_run_stops_on_shutdown() {
        let log = Log::default();
        let mut scheduler = TickScheduler::new(Duration::from_millis(1), Duration::from_millis(5));
        scheduler.add_system(Probe::boxed("s", &log));
        let shutdown = ShutdownToken::new();

        let handle = {
            let shutdown = shutdown.clone();
            std::thread::spawn(move || {
                scheduler.run(&shutdown);
                scheduler.tick_count()
            })
        };
        std::thread::sleep(Duration::from_millis(40));
        shutdown.cancel();
        let ticks = handle.join().unwrap();

        assert!(ticks > 0);
        assert_eq!(log.lock().last().map(String::as_str), Some("destroy s"));
    }
}
