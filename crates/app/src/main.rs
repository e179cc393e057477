use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use server::db::AppState;
use server::search::SearchIndex;
use server::storage::LocalDiskStore;

/// How often expired logout records are deleted.
const REVOCATION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,sqlx=warn".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if server::config::log_json() {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn spawn_revocation_purge(pool: sqlx::PgPool) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REVOCATION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match server::repo::user::purge_expired_revocations(&pool).await {
                Ok(0) => {}
                Ok(purged) => tracing::info!(purged, "expired token revocations purged"),
                Err(e) => tracing::warn!(error = %e, "token revocation purge failed"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    init_tracing();

    server::config::load_config();
    let flags = server::config::feature_flags();

    let tracer_provider = if flags.telemetry {
        server::telemetry::init_telemetry()?
    } else {
        None
    };
    server::health::record_start_time();

    let pool = server::db::create_pool()?;
    server::db::run_migrations(&pool).await?;

    let search = Arc::new(SearchIndex::new()?);
    if flags.search_index {
        let indexed = server::search::build_index(&pool, &search).await?;
        tracing::info!(indexed, "search index built");
    }

    let storage = Arc::new(LocalDiskStore::from_env());
    storage.ensure_root().await?;

    spawn_revocation_purge(pool.clone());

    let state = AppState {
        pool,
        search,
        storage,
    };

    let router = server::openapi::api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let addr = SocketAddr::from(([0, 0, 0, 0], server::config::port()));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "court server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    if let Some(provider) = tracer_provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "tracer provider shutdown failed");
        }
    }
    Ok(())
}
