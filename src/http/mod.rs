//! HTTP transport for the IPAM service.
//!
//! ## Routes
//!
//! | Method | Path               | Input                              | Result                          |
//! |--------|--------------------|------------------------------------|---------------------------------|
//! | POST   | `/create-subnet`   | `{"subnet"}`                       | `{"detail"}`                    |
//! | POST   | `/add-range`       | `{"subnet", "start_ip", "end_ip"}` | `{"detail"}`                    |
//! | GET    | `/next-ip`         | `?name=&subnet=`                   | `{"ip", "mac"}`                 |
//! | DELETE | `/ip`              | `?subnet=&name=`                   | `{"detail"}`                    |
//! | GET    | `/subnets`         |                                    | `["name", ...]`                 |
//! | GET    | `/subnet/{subnet}` | subnet name, may contain `/`       | `{"subnet", "used", "free"}`    |
//!
//! Errors are returned as `{"detail": "..."}` with the status from
//! [`ApiError::status_code`]. The API is open to every origin.

use axum::routing::{delete, get, post};
use axum::Router;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;

pub mod error;
pub mod handlers;

pub use error::ApiError;
pub use handlers::SharedService;

/// Build the application router around a shared service
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/create-subnet", post(handlers::create_subnet))
        .route("/add-range", post(handlers::add_range))
        .route("/next-ip", get(handlers::next_ip))
        .route("/ip", delete(handlers::release_ip))
        .route("/subnets", get(handlers::list_subnets))
        .route("/subnet/{*subnet}", get(handlers::subnet_details))
        .layer(CorsLayer::very_permissive())
        .with_state(service)
}

/// Serve the API on `addr` until Ctrl-C is received
pub async fn serve(service: SharedService, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("Failed to bind HTTP listener on {}", addr))?;

    info!("IPAM HTTP server listening on {}", addr);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("HTTP server error")?;

    info!("IPAM HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
