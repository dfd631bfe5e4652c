use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use setu_auth::{AuthState, JwtService};
use setu_db_memory::MemoryStore;
use setu_icd::IcdClient;
use setu_storage::{AuditStore, ConceptStore, ConditionStore, MappingStore, UserStore};

use crate::{
    admin, auth_routes, conditions, config::AppConfig, handlers, middleware as app_middleware,
    operations,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub concepts: Arc<dyn ConceptStore>,
    pub mappings: Arc<dyn MappingStore>,
    pub conditions: Arc<dyn ConditionStore>,
    pub users: Arc<dyn UserStore>,
    pub audit: Arc<dyn AuditStore>,
    pub icd: Arc<IcdClient>,
    pub jwt: Arc<JwtService>,
}

impl AppState {
    /// Wires all services from configuration on top of the in-memory backend.
    pub fn from_config(cfg: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let icd = Arc::new(IcdClient::new(cfg.icd.clone()));
        let jwt = Arc::new(JwtService::new(
            &cfg.jwt.secret,
            cfg.jwt.issuer.clone(),
            cfg.jwt.expiration_secs,
        ));

        Self {
            config: Arc::new(cfg),
            concepts: store.clone(),
            mappings: store.clone(),
            conditions: store.clone(),
            users: store.clone(),
            audit: store,
            icd,
            jwt,
        }
    }
}

pub struct SetuServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    let auth_state = AuthState {
        jwt: state.jwt.clone(),
    };

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/fhir/metadata", get(handlers::metadata))
        // Browser favicon shortcut
        .route("/favicon.ico", get(handlers::favicon))
        // Authentication
        .route("/auth/login", post(auth_routes::login))
        .route("/auth/register", post(auth_routes::register))
        .route("/auth/register/admin", post(auth_routes::register_admin))
        // Terminology operations
        .route("/fhir/ValueSet/$expand", get(operations::expand::handle))
        .route("/fhir/CodeSystem/$lookup", get(operations::lookup::handle))
        .route(
            "/fhir/ConceptMap/$translate",
            get(operations::translate::handle_get).post(operations::translate::handle_post),
        )
        // Dual-coded Condition resources
        .route(
            "/fhir/Condition",
            get(conditions::search).post(conditions::create),
        )
        .route("/fhir/Condition/{id}", get(conditions::read))
        // Admin surface
        .route("/admin/upload/codes", post(admin::upload_codes))
        .route("/admin/upload/conceptmaps", post(admin::upload_concept_maps))
        .route("/admin/history/translations", get(admin::translation_history))
        .route("/admin/stats", get(admin::stats))
        .with_state(state)
        // Middleware stack (order: auth -> request id -> content negotiation -> compression/cors/trace -> body limit)
        .layer(middleware::from_fn_with_state(
            auth_state,
            setu_auth::authentication_middleware,
        ))
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(middleware::from_fn(app_middleware::content_negotiation))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    // Skip creating a span for browser favicon requests to avoid noisy logs
                    if req.uri().path() == "/favicon.ico" {
                        return tracing::span!(tracing::Level::TRACE, "noop");
                    }
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %method,
                        http.target = %uri,
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        if let Some(meta) = span.metadata()
                            && meta.name() != "noop"
                        {
                            tracing::info!(
                                http.status = %res.status().as_u16(),
                                elapsed_ms = %latency.as_millis(),
                                "request handled"
                            );
                        }
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> SetuServer {
        let state = AppState::from_config(self.config);
        let app = build_app(state);

        SetuServer {
            addr: self.addr,
            app,
        }
    }
}

impl SetuServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
