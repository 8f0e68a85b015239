use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, watch};
use tokio::task::AbortHandle;
use tutorlens_core::Solver;

use crate::error::GatewayError;
use crate::router::build_router;

#[derive(Clone)]
pub(crate) struct AppState {
    pub solver: Arc<Solver>,
    /// Abort handle of the most recent solve. A new request supersedes and
    /// cancels whatever is still running, so a user retaking the photo does
    /// not pay for the abandoned upstream call.
    pub in_flight: Arc<Mutex<Option<AbortHandle>>>,
    pub started_at: Instant,
}

impl AppState {
    pub(crate) fn new(solver: Arc<Solver>) -> Self {
        Self {
            solver,
            in_flight: Arc::new(Mutex::new(None)),
            started_at: Instant::now(),
        }
    }
}

pub struct GatewayServer {
    addr: SocketAddr,
    access_code: Option<String>,
    max_body_size: usize,
    solver: Arc<Solver>,
    shutdown_rx: watch::Receiver<bool>,
}

impl GatewayServer {
    #[must_use]
    pub fn new(
        bind: &str,
        port: u16,
        solver: Arc<Solver>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let addr: SocketAddr = format!("{bind}:{port}").parse().unwrap_or_else(|e| {
            tracing::warn!("invalid bind '{bind}': {e}, falling back to 127.0.0.1:{port}");
            SocketAddr::from(([127, 0, 0, 1], port))
        });

        if bind == "0.0.0.0" {
            tracing::warn!("gateway binding to 0.0.0.0 — ensure this is intended for production");
        }

        Self {
            addr,
            access_code: None,
            max_body_size: 8 * 1024 * 1024,
            solver,
            shutdown_rx,
        }
    }

    #[must_use]
    pub fn with_access_code(mut self, code: Option<String>) -> Self {
        self.access_code = code;
        self
    }

    #[must_use]
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Start the HTTP gateway server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters a fatal I/O error.
    pub async fn serve(self) -> Result<(), GatewayError> {
        let state = AppState::new(self.solver);
        let router = build_router(state, self.access_code, self.max_body_size);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::Bind(self.addr.to_string(), e))?;
        tracing::info!("gateway listening on {}", self.addr);

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                while !*shutdown_rx.borrow_and_update() {
                    if shutdown_rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                tracing::info!("gateway shutting down");
            })
            .await
            .map_err(|e| GatewayError::Server(format!("{e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tutorlens_core::solver::SolverSettings;
    use tutorlens_llm::any::AnyProvider;
    use tutorlens_llm::mock::MockProvider;

    use super::*;

    fn test_solver() -> Arc<Solver> {
        Arc::new(Solver::new(
            AnyProvider::Mock(MockProvider::default()),
            SolverSettings::default(),
        ))
    }

    #[test]
    fn server_builder_chain() {
        let (_stx, srx) = watch::channel(false);
        let server = GatewayServer::new("127.0.0.1", 8090, test_solver(), srx)
            .with_access_code(Some("code".into()))
            .with_max_body_size(512);

        assert_eq!(server.max_body_size, 512);
        assert!(server.access_code.is_some());
    }

    #[test]
    fn server_invalid_bind_fallback() {
        let (_stx, srx) = watch::channel(false);
        let server = GatewayServer::new("not_an_ip", 9999, test_solver(), srx);
        assert_eq!(server.addr.port(), 9999);
    }
}
