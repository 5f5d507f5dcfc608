pub mod pages;
pub mod session;
pub mod views;

use std::sync::Arc;

use anyhow::Result;
use axum::routing::get;
use axum::Router;
use chrono_tz::Tz;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::models::Config;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<Config>,
    pub(crate) tz: Tz,
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::locations_handler))
        .route(
            "/reservation/schedule/{location}",
            get(pages::schedule_handler),
        )
        .route("/reservation/pay/{location}", get(pages::pay_handler))
        .route("/reservation/payment", get(pages::payment_handler))
        .route("/history", get(pages::history_handler))
        .route("/login", get(pages::login_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config, addr: &str) -> Result<()> {
    let tz = config.timezone()?;
    let state = AppState {
        config: Arc::new(config),
        tz,
    };

    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("Booking UI listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
