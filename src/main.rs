use anyhow::Result;
use axum::Router;
use solar_rooftop_analyzer::{api, config, state, telemetry};
use config::Config;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;
    // Missing provider keys abort here, before the listener is bound.
    cfg.validate()?;

    let app_state = state::AppState::new(&cfg)?;

    #[allow(unused_mut)]
    let mut app: Router = api::router(app_state, &cfg);

    #[cfg(feature = "swagger")]
    {
        app = api::with_swagger(app);
    }

    #[cfg(feature = "metrics")]
    {
        app = api::with_metrics(app);
    }

    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!(
            "WARNING: Server binding to 0.0.0.0 - service will be accessible from network! \
            For production, bind to 127.0.0.1 unless behind a firewall/reverse proxy."
        );
    }

    info!(%addr, "starting Solar Rooftop Analyzer");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
