//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Build the shared [`GatewayState`] from configuration
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (CORS, tracing, request ID)
//! - Serve plain HTTP or TLS until shutdown is signalled
//! - Record per-request metrics

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Method, Request},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::assets::AssetTable;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, StartupError};
use crate::http::client::UpstreamClient;
use crate::http::request::{request_id, ClientMeta, MakeRequestUuid, PublicScheme, X_REQUEST_ID};
use crate::http::{proxy, response, websocket};
use crate::lifecycle::ShutdownSignal;
use crate::net::tls::load_tls_config;
use crate::observability::metrics;
use crate::routing::{Dispatch, Dispatcher, RedirectPolicy};
use crate::security::{apply_cors_layer, CorsPolicy};

/// How long in-flight TLS connections may drain after shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<GatewayConfig>,
    pub policy: Arc<CorsPolicy>,
    pub dispatcher: Arc<Dispatcher>,
    pub client: UpstreamClient,
    pub cache_control: HeaderValue,
    /// Scheme of the public listener itself.
    pub listener_scheme: PublicScheme,
}

impl GatewayState {
    pub fn from_config(config: GatewayConfig) -> Result<Self, StartupError> {
        let policy = CorsPolicy::from_config(&config.cors)?;
        let assets = AssetTable::load(&config.static_assets, &policy)?;
        let redirects = RedirectPolicy::from_config(&config.redirect);
        let client = UpstreamClient::from_config(&config.upstream).map_err(StartupError::Client)?;
        let cache_control = HeaderValue::from_str(&config.static_assets.cache_control)?;
        let listener_scheme = if config.listener.tls.is_some() {
            PublicScheme::Https
        } else {
            PublicScheme::Http
        };

        tracing::info!(
            assets = assets.len(),
            prefix = %assets.prefix(),
            upstream = %config.upstream.authority(),
            upstream_tls = config.upstream.tls,
            "Gateway state initialised"
        );

        Ok(Self {
            config: Arc::new(config),
            policy: Arc::new(policy),
            dispatcher: Arc::new(Dispatcher::new(assets, redirects)),
            client,
            cache_control,
            listener_scheme,
        })
    }
}

/// The public-facing gateway server.
pub struct GatewayServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let state = GatewayState::from_config(config)?;
        let config = Arc::clone(&state.config);
        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: GatewayState) -> Router {
        let policy = Arc::clone(&state.policy);
        Router::new()
            .fallback(gateway_handler)
            .with_state(state)
            .layer(middleware::from_fn_with_state(policy, apply_cors_layer))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        request_id = %request_id(request.headers()),
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// Accept connections on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), StartupError> {
        let addr = listener.local_addr().map_err(StartupError::Serve)?;
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        match &self.config.listener.tls {
            None => {
                tracing::info!(address = %addr, "Gateway listening (HTTP)");
                axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown.triggered())
                    .await
                    .map_err(StartupError::Serve)?;
            }
            Some(tls) => {
                let rustls = load_tls_config(tls).await.map_err(StartupError::Tls)?;
                let handle = axum_server::Handle::new();
                let drain = handle.clone();
                tokio::spawn(async move {
                    shutdown.triggered().await;
                    drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
                });

                tracing::info!(address = %addr, "Gateway listening (HTTPS)");
                let listener = listener.into_std().map_err(StartupError::Serve)?;
                axum_server::from_tcp_rustls(listener, rustls)
                    .handle(handle)
                    .serve(app)
                    .await
                    .map_err(StartupError::Serve)?;
            }
        }

        tracing::info!("Gateway server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Catch-all handler: classify the request, then answer or forward it.
async fn gateway_handler(
    State(state): State<GatewayState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let started = Instant::now();
    let (parts, body) = request.into_parts();
    let meta = ClientMeta::from_parts(&parts, peer, state.listener_scheme, &state.config.forwarding);
    let request_id = request_id(&parts.headers).to_owned();

    let dispatch = state.dispatcher.classify(&parts.method, &parts.uri, &meta);
    let label = dispatch.label();
    tracing::debug!(
        request_id = %request_id,
        dispatch = label,
        client = %meta.client_addr,
        scheme = %meta.scheme,
        "Dispatching request"
    );

    let response = match dispatch {
        Dispatch::Preflight => response::preflight(),
        Dispatch::Static(asset) => {
            response::static_asset(asset, &state.cache_control, parts.method == Method::HEAD)
        }
        Dispatch::Redirect(redirect) => {
            tracing::debug!(
                request_id = %request_id,
                reason = ?redirect.reason,
                location = %redirect.location,
                "Redirecting"
            );
            response::redirect(&redirect.location)
        }
        Dispatch::Upgrade => {
            let request = Request::from_parts(parts, body);
            websocket::forward_upgrade(&state, request, &meta)
                .await
                .unwrap_or_else(|e| upstream_failure(e, &request_id))
        }
        Dispatch::Proxy => {
            let request = Request::from_parts(parts, body);
            proxy::forward(&state, request, &meta)
                .await
                .unwrap_or_else(|e| upstream_failure(e, &request_id))
        }
    };

    metrics::record_request(label, response.status().as_u16(), started);
    response
}

fn upstream_failure(err: GatewayError, request_id: &str) -> Response {
    tracing::error!(
        request_id = %request_id,
        kind = err.kind(),
        error = %err,
        source = ?std::error::Error::source(&err),
        "Upstream exchange failed"
    );
    metrics::record_upstream_error(err.kind());
    err.into_response()
}
