use dotenv_flow::dotenv_flow;
use eyre::{Result, WrapErr};
use recipes_api::app;
use std::{env, net::SocketAddr};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load dotenv-flow variables
    dotenv_flow().ok();

    // Enable logging
    config_tracing();

    // Start server
    let port = env::var("SERVER_LOCAL_PORT").unwrap_or("8080".to_owned());
    let addr: SocketAddr = format!("0.0.0.0:{port}")
        .parse()
        .wrap_err("invalid SERVER_LOCAL_PORT")?;

    generic_server_with_graceful_shutdown(addr).await
}

async fn generic_server_with_graceful_shutdown(addr: SocketAddr) -> Result<()> {
    // Load plugins
    let (mut plugin_container, router) = app()?;

    let listener = TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down gracefully");
    plugin_container.unload()?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
    }
}

fn config_tracing() {
    // LOG_FORMAT=json switches to one JSON object per event
    let (plain_layer, json_layer) = match env::var("LOG_FORMAT").as_deref() {
        Ok("json") => (None, Some(tracing_subscriber::fmt::layer().json())),
        _ => (Some(tracing_subscriber::fmt::layer()), None),
    };

    let filter = filter::Targets::new()
        .with_target("hyper::proto", tracing::Level::INFO)
        .with_target("tower_http::trace", tracing::Level::DEBUG)
        .with_default(tracing::Level::DEBUG);

    tracing_subscriber::registry()
        .with(plain_layer)
        .with(json_layer)
        .with(filter)
        .init();
}
