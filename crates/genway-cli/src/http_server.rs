//! HTTP surface of the gateway

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use genway_core::{
    CallerContext, Gateway, GatewayError, GenerateParams, Identity, PlanTier, QualityTier,
    UnifiedError,
};
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

const ACCOUNT_HEADER: &str = "x-account-id";
const PLAN_HEADER: &str = "x-plan-tier";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

/// Creates the API router.
pub fn create_router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/providers", get(list_providers))
        .route("/v1/resolve/:tier", get(resolve_tier))
        .route("/v1/generate", post(generate))
        .with_state(AppState { gateway })
}

/// Serve until `shutdown` is cancelled or Ctrl-C arrives
pub async fn serve(
    gateway: Arc<Gateway>,
    bind: &str,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "gateway listening");

    let app = create_router(gateway);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("interrupt received, shutting down"),
            _ = shutdown.cancelled() => {}
        }
    })
    .await?;
    Ok(())
}

/// Error response body: `{error, code, retryable}`
struct ApiError(GatewayError);

impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = Json(json!({
            "error": self.0.message(),
            "code": self.0.code(),
            "retryable": self.0.is_retryable(),
        }));

        let mut response = (status, body).into_response();
        if let Some(secs) = self.0.retry_after_secs() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

fn status_for(error: &GatewayError) -> StatusCode {
    match error {
        GatewayError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        GatewayError::TierNotPermitted { .. } => StatusCode::FORBIDDEN,
        GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        GatewayError::AllProvidersExhausted { .. } | GatewayError::ProviderUnavailable { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        GatewayError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Identity and plan as forwarded by the fronting identity layer
fn caller_from(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) -> Result<CallerContext, GatewayError> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let identity = match (header(ACCOUNT_HEADER), peer) {
        (Some(account), _) => Identity::account(account),
        (None, Some(addr)) => Identity::caller(addr.ip().to_string()),
        (None, None) => Identity::caller("unknown"),
    };
    let plan = match header(PLAN_HEADER) {
        Some(plan) => plan.parse()?,
        None => PlanTier::default(),
    };
    Ok(CallerContext::new(identity, plan))
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "healthy", "version": env!("CARGO_PKG_VERSION") })),
    )
}

async fn list_providers(State(state): State<AppState>) -> impl IntoResponse {
    let providers = state.gateway.resolver().registry().status();
    Json(json!({ "providers": providers }))
}

async fn resolve_tier(
    State(state): State<AppState>,
    Path(tier): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tier: QualityTier = tier.parse()?;
    let candidates = state.gateway.resolver().resolve(tier);
    Ok(Json(json!({ "tier": tier, "candidates": candidates })))
}

#[instrument(skip_all)]
async fn generate(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<GenerateParams>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(params) =
        body.map_err(|rejection| GatewayError::invalid_request(rejection.body_text()))?;
    let caller = caller_from(&headers, peer.map(|ConnectInfo(addr)| addr))?;

    // Dropping the guard (handler future or response body) cancels the work
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    if params.stream {
        let events = state.gateway.generate_stream(&caller, params, cancel)?;
        let frames = events.map(move |event| {
            let _alive = &guard;
            Ok::<_, Infallible>(Event::default().data(event.to_wire()))
        });
        return Ok(Sse::new(frames).into_response());
    }

    let result = state.gateway.generate(&caller, params, &cancel).await;
    drop(guard);
    match result {
        Ok(generated) => Ok(Json(generated).into_response()),
        Err(e) => {
            warn!(code = %e.code(), error = %e, "generation failed");
            Err(e.into())
        }
    }
}
