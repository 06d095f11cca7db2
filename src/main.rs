use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod config;
mod error;
mod game;
mod http;
mod session;
mod store;
mod telemetry;
mod util;
mod ws;

use crate::http::routes::{self, AppState};
use crate::store::DocStore;

/// Abandoned rooms are dropped after a day.
const ROOM_MAX_AGE_HOURS: i64 = 24;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let store = Arc::new(DocStore::new());
    let state = AppState {
        store: Arc::clone(&store),
    };

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            ticker.tick().await;
            store.prune_old(time::Duration::hours(ROOM_MAX_AGE_HOURS));
        }
    });

    let app = Router::new()
        .route("/healthz", get(routes::health))
        .route("/api/rooms", get(routes::list_rooms).post(routes::create_room))
        .route("/api/rooms/:code/join", post(routes::join_room))
        .route("/api/rooms/:code/ws", get(ws::connection::ws_handler))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config::server_addr();
    info!("listening on http://{}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
