use dotenvy::dotenv;
use tracing::{error, info};

use timetabler::router::init_router;
use timetabler::state::init_app_state;
use timetabler_config::ServerConfig;
use timetabler_observability::{init_metrics, init_tracing, metrics_app};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let state = match init_app_state().await {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Failed to initialize document store");
            std::process::exit(1);
        }
    };

    let mut app = init_router(state);
    if let Some(handle) = init_metrics() {
        app = app.merge(metrics_app(handle));
    }

    let server_config = ServerConfig::from_env();
    let address = server_config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, address, "Failed to bind");
            std::process::exit(1);
        }
    };

    info!("Server running on http://{}", address);
    info!("Swagger UI available at http://{}/swagger-ui", address);
    info!("Scalar UI available at http://{}/scalar", address);

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
