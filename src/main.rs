use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};
use sqlx::postgres::PgPoolOptions;

use taskboard::config::Config;
use taskboard::models::{Task, User};
use taskboard::repository::PgRepository;
use taskboard::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            log::error!("failed to connect to database: {}", e);
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
        })?;

    let bind = (config.server_host.clone(), config.server_port);
    log::info!("starting taskboard server at {}", config.server_url());

    let state = AppState::new(
        config,
        Arc::new(PgRepository::<User>::new(pool.clone())),
        Arc::new(PgRepository::<Task>::new(pool)),
    );

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .supports_credentials()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(move |cfg| state.configure(cfg))
    })
    .bind(bind)?
    .run()
    .await
}
