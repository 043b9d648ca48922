//! Webside HTTP Server
//!
//! Serves the Webside introspection protocol over HTTP:
//! - **Config**: `webside.toml` loading and defaults (`config` module)
//! - **State**: the session gate shared by handlers (`state` module)
//! - **Handlers**: one async function per route (`handlers` module)
//! - **Errors**: status mapping and fatal escalation (`error` module)
//!
//! A fatal runtime error answers 500 and then stops the server.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Configuration file format
pub mod config;

/// Error types and HTTP status mapping
pub mod error;

/// Route handlers
pub mod handlers;

/// Shared request state
pub mod state;

pub use config::{ConfigError, WebsideConfig};
pub use error::{ApiError, ServerError};
pub use state::AppState;
pub use webside_engine as engine;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use webside_engine::memory::bootstrap;
use webside_engine::{Inspector, Runtime};

/// Build the route table
pub fn router(state: AppState, cors: bool) -> Router {
    let router = Router::new()
        .route("/dialect", get(handlers::code::dialect))
        .route("/classes", get(handlers::code::classes))
        .route("/classes/{name}", get(handlers::code::class_definition))
        .route("/classes/{name}/variables", get(handlers::code::variables))
        .route(
            "/classes/{name}/instance-variables",
            get(handlers::code::instance_variables),
        )
        .route(
            "/classes/{name}/class-variables",
            get(handlers::code::class_variables),
        )
        .route("/classes/{name}/subclasses", get(handlers::code::subclasses))
        .route("/classes/{name}/categories", get(handlers::code::categories))
        .route(
            "/classes/{name}/used-categories",
            get(handlers::code::used_categories),
        )
        .route("/classes/{name}/methods", get(handlers::code::class_methods))
        .route("/methods", get(handlers::code::methods))
        .route("/usual-categories", get(handlers::code::usual_categories))
        .route(
            "/objects",
            get(handlers::objects::pinned_objects).post(handlers::objects::pin_object),
        )
        .route(
            "/objects/{id}",
            get(handlers::objects::pinned_object).delete(handlers::objects::unpin),
        )
        .route(
            "/objects/{id}/{*path}",
            get(handlers::objects::pinned_object_path),
        )
        .with_state(state);
    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Session over the kernel image, optionally with the sample objects pinned
pub fn kernel_inspector(pin_samples: bool) -> Result<Inspector, ServerError> {
    let mut memory = bootstrap::kernel_image()?;
    let samples = if pin_samples {
        bootstrap::sample_objects(&mut memory)?
    } else {
        Vec::new()
    };
    let runtime: Arc<dyn Runtime> = Arc::new(memory);
    let mut inspector = Inspector::new(runtime);
    inspector.pin_samples(&samples)?;
    Ok(inspector)
}

/// Serve `inspector` until Ctrl+C or a fatal runtime error
pub async fn serve(config: &WebsideConfig, inspector: Inspector) -> Result<(), ServerError> {
    let dialect = inspector.dialect();
    let state = AppState::new(inspector);
    let app = router(state.clone(), config.server.cors);

    let address = config.bind_address();
    let listener = TcpListener::bind(address.as_str()).await?;
    info!(address = %address, dialect = %dialect, "Webside server listening");

    let shutdown = {
        let state = state.clone();
        async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Ctrl+C received, shutting down"),
                _ = state.fatal_error() => warn!("shutting down after fatal error"),
            }
        }
    };
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    match state.fatal_reason() {
        Some(reason) => Err(ServerError::Fatal(reason)),
        None => {
            info!("Webside server stopped");
            Ok(())
        }
    }
}
