//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router for the selected service
//! - Wire up HTTP request logging
//! - Serve on a listener until shutdown is signalled
//!
//! No timeout layer is installed: a request waits as long as its downstream
//! calls do.

use std::fmt;

use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::http::{back, front};
use crate::lifecycle::ShutdownSignal;
use crate::observability::Tracer;

/// Which of the two services a process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceRole {
    Front,
    Back,
}

impl ServiceRole {
    pub fn service_name(self) -> &'static str {
        match self {
            ServiceRole::Front => front::SERVICE_NAME,
            ServiceRole::Back => back::SERVICE_NAME,
        }
    }

    /// Configured bind address for this role.
    pub fn bind_address(self, config: &ServiceConfig) -> &str {
        match self {
            ServiceRole::Front => &config.front.bind_address,
            ServiceRole::Back => &config.back.bind_address,
        }
    }
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_name())
    }
}

/// HTTP server for one service.
pub struct HttpServer {
    role: ServiceRole,
    router: Router,
}

impl HttpServer {
    /// Build the server for `role`. The tracer is shared by the handler and
    /// its outbound clients.
    pub fn new(role: ServiceRole, config: &ServiceConfig, tracer: Tracer) -> Result<Self, reqwest::Error> {
        let router = match role {
            ServiceRole::Front => front::router(front::FrontState::new(&config.front, tracer)?),
            ServiceRole::Back => back::router(back::BackState::new(&config.back, tracer)?),
        };
        Ok(Self::with_router(role, router))
    }

    /// Wrap an already-built service router.
    pub fn with_router(role: ServiceRole, router: Router) -> Self {
        Self {
            role,
            router: router.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http())),
        }
    }

    pub fn role(&self) -> ServiceRole {
        self.role
    }

    /// The complete router, middleware included.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(service = %self.role, address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!(service = %self.role, "HTTP server stopped");
        Ok(())
    }
}
