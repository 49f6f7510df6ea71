//! Application startup and lifecycle management.

use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::{request_id_middleware, REQUEST_ID_HEADER};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::{InvoicingConfig, StoreBackend};
use crate::handlers;
use crate::services::store::{AuditStore, CustomerStore, InvoiceStore, PaymentStore, ReminderStore};
use crate::services::{
    init_metrics, AuditService, CustomerService, Database, InvoiceService, MemoryStore,
    ReminderService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: InvoicingConfig,
    /// Set when running on PostgreSQL; used by the health probes.
    pub db: Option<Arc<Database>>,
    pub invoices: Arc<InvoiceService>,
    pub reminders: Arc<ReminderService>,
    pub audit: Arc<AuditService>,
    pub customers: Arc<CustomerService>,
}

impl AppState {
    /// Wire every service onto one ledger store.
    pub fn new<S>(config: InvoicingConfig, store: Arc<S>, db: Option<Arc<Database>>) -> Self
    where
        S: InvoiceStore + PaymentStore + ReminderStore + AuditStore + CustomerStore + 'static,
    {
        let invoices = InvoiceService::new(store.clone(), store.clone(), config.frontend_url.clone());

        Self {
            invoices: Arc::new(invoices),
            reminders: Arc::new(ReminderService::new(store.clone())),
            audit: Arc::new(AuditService::new(store.clone())),
            customers: Arc::new(CustomerService::new(store)),
            config,
            db,
        }
    }
}

/// Build the HTTP router with all middleware layers.
pub fn router(state: AppState) -> Router {
    let invoice_routes = Router::new()
        .route(
            "/",
            post(handlers::invoices::create_invoice).get(handlers::invoices::list_invoices),
        )
        .route("/statistics", get(handlers::invoices::get_statistics))
        .route(
            "/audit-trails",
            get(handlers::audit::list_customer_audit_trails),
        )
        .route("/:invoice_id", get(handlers::invoices::get_invoice))
        .route(
            "/:invoice_id/confirm-payment",
            post(handlers::invoices::confirm_payment),
        )
        .route("/:invoice_id/reminders", post(handlers::invoices::set_reminders))
        .route(
            "/:invoice_id/shareable-link",
            get(handlers::invoices::get_shareable_link),
        )
        .route(
            "/:invoice_id/duplicate",
            post(handlers::invoices::duplicate_invoice),
        )
        .route(
            "/:invoice_id/audit-trails",
            get(handlers::audit::list_invoice_audit_trails),
        );

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics))
        .route("/ping", get(handlers::health::ping))
        .nest("/api/v1/invoices", invoice_routes)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                    customer_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: InvoicingConfig) -> Result<Self, AppError> {
        init_metrics();

        let state = match (config.store_backend, config.database.clone()) {
            (StoreBackend::Postgres, Some(database)) => {
                let db = Database::new(
                    &database.url,
                    database.max_connections,
                    database.min_connections,
                )
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to connect to PostgreSQL");
                    e
                })?;

                db.run_migrations().await.map_err(|e| {
                    tracing::error!(error = %e, "Failed to run migrations");
                    e
                })?;

                let db = Arc::new(db);
                AppState::new(config.clone(), db.clone(), Some(db))
            }
            (StoreBackend::Postgres, None) => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "DATABASE_URL is required for the postgres store"
                )));
            }
            (StoreBackend::Memory, _) => {
                tracing::warn!("Using in-memory store - data will not survive a restart");
                AppState::new(config.clone(), Arc::new(MemoryStore::new()), None)
            }
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router: router(state),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until_stopped<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(
            service = "invoicing-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
