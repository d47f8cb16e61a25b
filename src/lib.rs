pub mod plugins;

use axum::Router;
use eyre::{eyre, Result};
use plugins::handler::PluginContainer;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

/// Mounts every registered plugin and merges their routes.
///
/// Any plugin failing to mount aborts startup.
pub fn app() -> Result<(PluginContainer<'static>, Router)> {
    let mut container = PluginContainer::new();
    container.load().map_err(|e| eyre!(e))?;

    let router = Router::new()
        .merge(container.routes().map_err(|e| eyre!(e))?)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new());

    Ok((container, router))
}
