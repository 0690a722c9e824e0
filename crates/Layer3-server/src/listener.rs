//! HTTP listener
//!
//! Runs axum on a tokio runtime owned by a dedicated `bridge-listener`
//! thread. Handlers never touch host state: they build a [`Task`], enqueue it,
//! and wait on its channel for at most the configured request timeout.

use crate::protocol::{ResponseBody, RunRequest};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use hostbridge_foundation::{BridgeConfig, Error, Result};
use hostbridge_task::{ChannelError, ResponseReceiver, Task, TaskQueue, TaskResult};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
struct AppState {
    queue: TaskQueue,
    timeout: Duration,
}

/// Routes for `/run` and `/view`; anything else is a JSON 404
pub fn build_router(queue: TaskQueue, timeout: Duration) -> Router {
    Router::new()
        .route("/run", post(run).fallback(not_found))
        .route("/view", post(view).fallback(not_found))
        .fallback(not_found)
        .layer(DefaultBodyLimit::disable())
        .with_state(AppState { queue, timeout })
}

async fn run(State(state): State<AppState>, body: Bytes) -> Response {
    let request: RunRequest = match parse_json_body(&body) {
        Ok(request) => request,
        Err(e) => return bad_body(e),
    };

    let (task, receiver) = Task::code_exec(request.code);
    await_result(&state, task, receiver, |result| {
        if result.is_success() {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    })
    .await
}

async fn view(State(state): State<AppState>, body: Bytes) -> Response {
    // no fields are read; any JSON value is accepted
    if let Err(e) = parse_json_body::<serde::de::IgnoredAny>(&body) {
        return bad_body(e);
    }

    // domain errors (no camera, render failure) are still a 200
    let (task, receiver) = Task::view_capture();
    await_result(&state, task, receiver, |_| StatusCode::OK).await
}

async fn not_found() -> Response {
    json_response(StatusCode::NOT_FOUND, ResponseBody::error("not found"))
}

async fn await_result(
    state: &AppState,
    task: Task,
    receiver: ResponseReceiver,
    status_for: impl FnOnce(&TaskResult) -> StatusCode,
) -> Response {
    let id = task.id;
    let kind = task.kind;
    state.queue.enqueue(task);
    debug!(task = %id, %kind, queued = state.queue.len(), "Task queued");

    match receiver.recv(state.timeout).await {
        Ok(result) => json_response(status_for(&result), ResponseBody::from(&result)),
        Err(ChannelError::Timeout(after)) => {
            warn!(task = %id, %kind, timeout_secs = after.as_secs(), "Request timed out waiting for the host");
            json_response(StatusCode::GATEWAY_TIMEOUT, ResponseBody::error("timed out"))
        }
        Err(ChannelError::Closed) => {
            error!(task = %id, %kind, "Task dropped without a result");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ResponseBody::error("task was dropped before producing a result"),
            )
        }
    }
}

/// Empty bodies parse as `{}`
fn parse_json_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body.as_ref()
    };
    serde_json::from_slice(body).map_err(|error| Error::InvalidInput(format!("invalid json body: {error}")))
}

fn bad_body(error: Error) -> Response {
    debug!(%error, "Rejected request body");
    json_response(StatusCode::INTERNAL_SERVER_ERROR, ResponseBody::error(error.to_string()))
}

fn json_response(status: StatusCode, body: ResponseBody) -> Response {
    (status, Json(body)).into_response()
}

// ============================================================================
// Listener thread
// ============================================================================

/// Running listener; dropping it shuts the listener down
pub struct ListenerHandle {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, cancel in-flight requests and join the thread.
    ///
    /// Cancelled requests drop their receivers, so results the host produces
    /// for them later are discarded.
    pub fn shutdown(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Listener thread panicked");
            }
            info!(addr = %self.local_addr, "Listener stopped");
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Bind synchronously, then serve on a `bridge-listener` thread.
///
/// Binding happens on the calling thread so address errors surface here.
pub fn spawn_listener(config: &BridgeConfig, queue: TaskQueue) -> Result<ListenerHandle> {
    let addr = config.socket_addr()?;
    let std_listener = std::net::TcpListener::bind(addr)
        .map_err(|e| Error::Service(format!("failed to bind {addr}: {e}")))?;
    std_listener.set_nonblocking(true)?;
    let local_addr = std_listener.local_addr()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.listener_threads)
        .thread_name("bridge-worker")
        .enable_all()
        .build()?;
    let listener = {
        let _guard = runtime.enter();
        tokio::net::TcpListener::from_std(std_listener)?
    };

    let router = build_router(queue, config.request_timeout_duration());
    let grace = config.shutdown_grace();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let thread = std::thread::Builder::new()
        .name("bridge-listener".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                tokio::select! {
                    result = axum::serve(listener, router).into_future() => {
                        if let Err(e) = result {
                            error!(error = %e, "Listener failed");
                        }
                    }
                    _ = shutdown_rx => {
                        debug!("Listener shutdown requested");
                    }
                }
            });
            runtime.shutdown_timeout(grace);
        })?;

    info!(addr = %local_addr, "Listener started");
    Ok(ListenerHandle {
        local_addr,
        shutdown: Some(shutdown_tx),
        thread: Some(thread),
    })
}
