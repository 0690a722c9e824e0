//! Bridge service
//!
//! Owns the lifecycle: one listener, one tick registration on the host's
//! scheduler. Lives on the host thread with the executor it ticks.

use crate::listener::{spawn_listener, ListenerHandle};
use hostbridge_foundation::{BridgeConfig, Result};
use hostbridge_task::{HostExecutor, Scheduler, TaskQueue};
use std::cell::RefCell;
use std::net::SocketAddr;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Scheduler timer name for the executor tick
pub const TICK_TIMER: &str = "hostbridge.process_queue";

pub struct BridgeService<S: Scheduler> {
    config: BridgeConfig,
    queue: TaskQueue,
    scheduler: S,
    executor: Rc<RefCell<HostExecutor>>,
    listener: Option<ListenerHandle>,
}

impl<S: Scheduler> BridgeService<S> {
    /// The executor's queue is the one the listener feeds
    pub fn new(config: BridgeConfig, scheduler: S, executor: HostExecutor) -> Self {
        let queue = executor.queue().clone();
        Self {
            config,
            queue,
            scheduler,
            executor: Rc::new(RefCell::new(executor)),
            listener: None,
        }
    }

    /// Bind the listener and register the tick. No-op when already running.
    pub fn start(&mut self) -> Result<()> {
        if self.listener.is_some() {
            debug!("Bridge already running");
            return Ok(());
        }
        self.config.validate()?;

        let listener = spawn_listener(&self.config, self.queue.clone())?;
        let addr = listener.local_addr();

        let executor = Rc::clone(&self.executor);
        let interval = self.config.tick_interval();
        let registered = self.scheduler.register(
            TICK_TIMER,
            interval,
            Box::new(move || {
                match executor.try_borrow_mut() {
                    Ok(mut executor) => {
                        executor.tick();
                    }
                    // re-entered from inside a handler
                    Err(_) => warn!("Executor busy, tick skipped"),
                }
                Some(interval)
            }),
        );
        if !registered {
            warn!(timer = TICK_TIMER, "Tick timer was already registered");
        }

        self.listener = Some(listener);
        info!(%addr, tick_ms = interval.as_millis() as u64, "Bridge started");
        Ok(())
    }

    /// Close the listener and unregister the tick. No-op when stopped.
    ///
    /// Tasks still queued are dropped; their callers see the channel closed.
    pub fn stop(&mut self) {
        let Some(mut listener) = self.listener.take() else {
            return;
        };

        self.scheduler.unregister(TICK_TIMER);
        listener.shutdown();

        let stranded = self.queue.drain_all();
        if !stranded.is_empty() {
            warn!(count = stranded.len(), "Dropping tasks queued at shutdown");
        }
        info!("Bridge stopped");
    }

    pub fn is_running(&self) -> bool {
        self.listener.is_some()
    }

    /// Bound address while running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(ListenerHandle::local_addr)
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn total_executed(&self) -> u64 {
        self.executor.borrow().total_executed()
    }
}

impl<S: Scheduler> Drop for BridgeService<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
