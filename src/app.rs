use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use axum::{
    extract::Path,
    http::{Request, Response},
    response::Redirect,
    routing::get,
    Router,
};
use tokio::signal;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info, info_span, warn, Span};

use crate::{
    auth,
    error::{AppError, AppResult},
    listings,
    state::AppState,
    trades,
};

/// JSON API under `/api/v1`, uploaded images under `/public`, and
/// `/item/:id` (the link trade-offer emails carry) redirecting to the listing.
pub fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth::router())
        .merge(listings::router())
        .merge(trades::router())
        .route("/health", get(|| async { "ok" }));

    let public = ServeDir::new(&state.config.public_dir);

    let app = Router::new()
        .nest("/api/v1", api)
        .route("/item/:id", get(item_link))
        .nest_service("/public", public)
        .with_state(state)
        .layer(CorsLayer::permissive());
    with_request_tracing(app)
}

async fn item_link(Path(id): Path<String>) -> AppResult<Redirect> {
    let id: i64 = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("listing with ID \"{id}\" not found")))?;
    Ok(Redirect::to(&format!("/api/v1/listings/{id}")))
}

fn with_request_tracing(app: Router) -> Router {
    app.layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &Request<_>| {
                info_span!(
                    "http_request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    status = tracing::field::Empty,
                )
            })
            .on_response(|res: &Response<_>, latency: Duration, span: &Span| {
                let status = res.status();
                span.record("status", tracing::field::display(status));
                let ms = latency.as_millis() as u64;
                if status.is_server_error() {
                    error!(%status, ms, "request failed");
                } else if status.is_client_error() {
                    warn!(%status, ms, "request rejected");
                } else {
                    info!(%status, ms, "request handled");
                }
            }),
    )
}

/// Serve until ctrl-c or SIGTERM.
pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "exchangebay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
