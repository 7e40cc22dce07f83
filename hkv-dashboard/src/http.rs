//! HTTP server for the dashboard.
//!
//! Serves `/metrics` (one live `INFO` fetch per request, as JSON), `/health`
//! (the dashboard's own counters), and the static poller page. Each accepted
//! connection runs in its own task, so a slow or failed fetch never blocks
//! other polls.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{debug, warn};

use hkv_client::StatusFetcher;
use hkv_common::HkvError;

use crate::assets::{Asset, Assets};
use crate::config::DashboardConfig;
use crate::metrics::{Metrics, MetricsSnapshot};

const JSON: &str = "application/json";

/// Shared, read-mostly state for all HTTP connections.
#[derive(Debug)]
pub struct AppState {
    fetcher: StatusFetcher,
    metrics: Metrics,
    assets: Assets,
}

impl AppState {
    pub fn new(fetcher: StatusFetcher, assets: Assets) -> Self {
        AppState {
            fetcher,
            metrics: Metrics::new(),
            assets,
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        AppState::new(
            StatusFetcher::new(config.fetch_config()),
            Assets::new(config.public_dir.clone()),
        )
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Metrics,
    Health,
    Static(Asset),
}

impl Route {
    fn from_path(path: &str) -> Option<Self> {
        match path {
            "/metrics" => Some(Route::Metrics),
            "/health" => Some(Route::Health),
            other => Asset::from_path(other).map(Route::Static),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

#[derive(Serialize)]
struct HealthBody<'a> {
    status: &'static str,
    target: String,
    polls: &'a MetricsSnapshot,
}

/// Accepts connections forever, serving each on its own task.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("dashboard listener accept error: {e}");
                continue;
            }
        };

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let state = Arc::clone(&state);
                async move { handle_request(req, &state).await }
            });

            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                debug!(%peer, "http connection error: {e}");
            }
        });
    }
}

/// Routes one HTTP request.
pub async fn handle_request<B>(
    req: Request<B>,
    state: &AppState,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let route = match Route::from_path(req.uri().path()) {
        Some(route) => route,
        None => return Ok(json_response(StatusCode::NOT_FOUND, &ErrorBody { error: "not found" })),
    };
    if req.method() != Method::GET {
        return Ok(json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &ErrorBody { error: "method not allowed" },
        ));
    }

    let response = match route {
        Route::Metrics => metrics_response(state).await,
        Route::Health => health_response(state),
        Route::Static(asset) => {
            let body = state.assets.load(asset).await;
            response(StatusCode::OK, asset.content_type(), body)
        }
    };
    Ok(response)
}

async fn metrics_response(state: &AppState) -> Response<Full<Bytes>> {
    state.metrics.record_request_start();
    let started = Instant::now();
    let result = state.fetcher.fetch_status().await;
    state.metrics.record_request_end(started.elapsed());

    match result {
        Ok(record) => json_response(StatusCode::OK, &record),
        Err(err) => {
            state.metrics.record_error();
            warn!(code = err.code(), "status fetch failed: {err}");
            json_response(status_for(&err), &ErrorBody { error: &err.to_string() })
        }
    }
}

fn health_response(state: &AppState) -> Response<Full<Bytes>> {
    let config = state.fetcher.config();
    let snapshot = state.metrics.snapshot();
    let body = HealthBody {
        status: "ok",
        target: format!("{}:{}", config.host, config.port),
        polls: &snapshot,
    };
    json_response(StatusCode::OK, &body)
}

/// Gateway-style status for a failed upstream fetch.
fn status_for(err: &HkvError) -> StatusCode {
    match err {
        HkvError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        HkvError::Connection(_) | HkvError::Protocol(_) => StatusCode::BAD_GATEWAY,
    }
}

fn json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => response(status, JSON, Bytes::from(bytes)),
        Err(e) => {
            warn!("failed to encode response body: {e}");
            response(
                StatusCode::INTERNAL_SERVER_ERROR,
                JSON,
                Bytes::from_static(br#"{"error":"internal error"}"#),
            )
        }
    }
}

fn response(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
