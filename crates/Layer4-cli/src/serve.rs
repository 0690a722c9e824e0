//! `hostbridge serve` - run the demo host with the bridge attached
//!
//! The main thread is the host thread: it owns the scene, the Lua state and
//! the executor, and runs the `HostLoop` until Ctrl-C.

use hostbridge_core::DemoHost;
use hostbridge_foundation::BridgeConfig;
use hostbridge_server::BridgeService;
use hostbridge_task::{HostLoop, TaskQueue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// How often the loop checks for Ctrl-C when no timer is due
const STOP_POLL: Duration = Duration::from_millis(50);

pub fn serve(config: BridgeConfig) -> anyhow::Result<()> {
    let stop = watch_ctrl_c()?;

    let host = DemoHost::new();
    let executor = host.executor(TaskQueue::new(), &config.render)?;
    let host_loop = HostLoop::new();
    let mut service = BridgeService::new(config, host_loop.clone(), executor);
    service.start()?;

    if let Some(addr) = service.local_addr() {
        println!("hostbridge listening on http://{addr} (Ctrl-C to stop)");
    }

    host_loop.run_until(STOP_POLL, || stop.load(Ordering::SeqCst));

    info!("Shutting down");
    service.stop();
    Ok(())
}

/// Flag set once Ctrl-C is received, watched from a side thread
fn watch_ctrl_c() -> anyhow::Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    std::thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || {
            match runtime.block_on(tokio::signal::ctrl_c()) {
                Ok(()) => {
                    info!("Ctrl-C received");
                    flag.store(true, Ordering::SeqCst);
                }
                // keep serving; the process can still be killed
                Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
            }
        })?;

    Ok(stop)
}
