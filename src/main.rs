use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;

use todolist::auth::{AuthMiddleware, TokenIssuer};
use todolist::config::Config;
use todolist::purge::PurgeJob;
use todolist::routes::{self, health};
use todolist::state::AppState;
use todolist::store::PgStore;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let store = PgStore::connect(&config.database_url, config.database_max_connections)
        .await
        .map_err(|e| {
            log::error!("Failed to initialise the database: {}", e);
            io::Error::new(io::ErrorKind::Other, e)
        })?;
    let store = Arc::new(store);

    let _purge = PurgeJob::new(store.clone(), config.retention_days).spawn();

    let state = web::Data::new(AppState::new(
        store.clone(),
        store,
        TokenIssuer::new(&config.jwt_secret, config.jwt_expiration_hours),
        config.bcrypt_cost,
    ));

    log::info!("Starting todolist server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
