use std::time::Duration;

use exchangebay::{app, state::AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let state = AppState::init().await?;
    tracing::info!(
        database = %state.config.database_url,
        public_dir = %state.config.public_dir.display(),
        "state initialised"
    );
    let addr = state.config.listen_addr()?;
    let grace = Duration::from_secs(
        state.config.smtp.as_ref().map_or(5, |smtp| smtp.timeout_secs),
    );
    let outbox = state.outbox.clone();

    app::serve(app::build_app(state), addr).await?;
    outbox.drain(grace).await;
    Ok(())
}

/// `RUST_LOG` overrides the default filter; `LOG_FORMAT=json` switches to
/// one JSON object per line.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("exchangebay=debug,axum=info,tower_http=info"));
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));

    let fmt = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        fmt.with_target(false).json().init();
    } else {
        fmt.init();
    }
}
