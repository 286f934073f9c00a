//! REST API server lifecycle management.
//!
//! Provides a lifecycle manager for the REST API server that can be started,
//! stopped, and queried for status.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::rest::{build_router, ApiState};

/// Status of the REST API server
#[derive(Debug, Clone, PartialEq)]
pub enum RestApiStatus {
    Stopped,
    Starting,
    Stopping,
    Running { addr: String },
    Error(String),
}

impl RestApiStatus {
    /// Returns true if the server is running
    pub fn is_running(&self) -> bool {
        matches!(self, RestApiStatus::Running { .. })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// REST API server handle for lifecycle management
pub struct RestApiServer {
    state: ApiState,
    addr: String,
    status: Arc<Mutex<RestApiStatus>>,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl RestApiServer {
    /// Create a new server handle bound to the configured address
    pub fn new(state: ApiState) -> Self {
        let addr = state.config.bind_addr();
        Self {
            state,
            addr,
            status: Arc::new(Mutex::new(RestApiStatus::Stopped)),
            shutdown_tx: Mutex::new(None),
            task_handle: Mutex::new(None),
        }
    }

    /// Get current server status
    pub fn status(&self) -> RestApiStatus {
        lock(&self.status).clone()
    }

    /// Check if server is running
    pub fn is_running(&self) -> bool {
        self.status().is_running()
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Start the REST API server on the current tokio runtime
    pub fn start(&self) -> Result<(), String> {
        if self.is_running() {
            return Err(format!("REST API already running on {}", self.addr));
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        *lock(&self.shutdown_tx) = Some(shutdown_tx);

        let router = build_router(self.state.clone());
        let addr = self.addr.clone();
        let status = self.status.clone();

        *lock(&status) = RestApiStatus::Starting;

        let handle = tokio::spawn(async move {
            match tokio::net::TcpListener::bind(&addr).await {
                Ok(listener) => {
                    *lock(&status) = RestApiStatus::Running { addr: addr.clone() };
                    tracing::info!("REST API listening on http://{}", addr);

                    let result = axum::serve(listener, router)
                        .with_graceful_shutdown(async {
                            let _ = shutdown_rx.await;
                        })
                        .await;
                    if let Err(e) = result {
                        tracing::error!("REST API server error: {}", e);
                    }
                    *lock(&status) = RestApiStatus::Stopped;
                }
                Err(e) => {
                    *lock(&status) = RestApiStatus::Error(e.to_string());
                    tracing::error!("Failed to start REST API: {}", e);
                }
            }
        });

        *lock(&self.task_handle) = Some(handle);
        Ok(())
    }

    /// Signal the server to shut down gracefully
    pub fn stop(&self) {
        *lock(&self.status) = RestApiStatus::Stopping;

        if let Some(tx) = lock(&self.shutdown_tx).take() {
            let _ = tx.send(());
        }

        *lock(&self.status) = RestApiStatus::Stopped;
        tracing::info!("REST API server stopped");
    }

    /// Wait for the server task to finish
    pub async fn wait(&self) {
        let handle = lock(&self.task_handle).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!("REST API task failed: {}", e);
            }
        }
    }
}

impl Drop for RestApiServer {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}
