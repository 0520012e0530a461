/*
 * Responsibility
 * - load Config -> build shared state (allow-list, db pool) -> assemble Router
 * - apply middleware (origin gate/CORS, HTTP plumbing)
 * - start axum::serve()
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::Config;
use crate::middleware;
use crate::middleware::http::HttpLimits;
use crate::services::origin_gate::AllowList;
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG wins when set, e.g. RUST_LOG=info,origin_gate_api=debug,tower_http=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("failed to load configuration")?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let allow_list = build_allow_list(&config);

    let db = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    tracing::info!("database connected");

    let state = AppState::new(db, allow_list);
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    tracing::info!("server listening on port {}", config.addr.port());

    axum::serve(listener, app).await?;
    Ok(())
}

/// Freeze the configured allow-list and report anything suspicious about it.
fn build_allow_list(config: &Config) -> Arc<AllowList> {
    let allow_list = config.cors_allowed_origins.clone();

    if let Err(err) = allow_list.ensure_usable() {
        tracing::warn!(error = %err, "cors configuration degraded");
    }
    for entry in allow_list.non_origin_entries() {
        tracing::warn!(
            entry,
            "cors allow-list entry is not a bare origin and will never match a browser Origin header"
        );
    }
    tracing::info!(
        origins = ?allow_list.as_slice(),
        "cors allow-list loaded ({} entries)",
        allow_list.len()
    );

    Arc::new(allow_list)
}

fn build_router(state: AppState, config: &Config) -> Router {
    let allow_list = Arc::clone(&state.allow_list);

    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes())
        .with_state(state);

    let router = middleware::cors::apply(router, allow_list);
    middleware::http::apply(
        router,
        HttpLimits {
            body_limit_bytes: config.request_body_limit_bytes,
            timeout: config.request_timeout,
        },
    )
}
