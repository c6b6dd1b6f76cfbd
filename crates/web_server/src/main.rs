//! Main entry point for the campground availability API server.
//! This crate serves the one-shot search and nearby campground endpoints.

use actix_web::{App, HttpServer, middleware::Logger, web};
use campground_scan::{DEFAULT_LOOKUP_COMMAND, split_command};
use rec_gov::FacilitySearchClient;
use web_handlers::{SearchState, configure_routes};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5000";

fn facility_client() -> Option<FacilitySearchClient> {
    match FacilitySearchClient::from_env() {
        Ok(client) => {
            log::info!("🏞️ Campground search enabled against {}", client.base_url());
            Some(client)
        }
        Err(e) => {
            log::warn!("❌ Campground search disabled: {}", e);
            None
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🚀 Starting campground availability server...");

    let lookup_command =
        std::env::var("LOOKUP_PROGRAM").unwrap_or_else(|_| DEFAULT_LOOKUP_COMMAND.to_string());
    let (program, args) = split_command(&lookup_command)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    log::info!("🔎 Availability lookups run: {}", lookup_command);

    let state = web::Data::new(SearchState::new(program, args, facility_client()));

    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());
    log::info!("🌐 Server will be available at: http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure_routes)
    })
    .bind(bind_address)?
    .run()
    .await
}
