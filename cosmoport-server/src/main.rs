#![deny(missing_docs)]
//! Cosmoport server executable.
//!
//! Hosts the `/rest/ships` registry backed by PostgreSQL or process memory.

mod config;
mod db;
mod error;
mod models;
mod openapi;
mod routes;
mod schema;
mod store;

#[cfg(not(test))]
use actix_cors::Cors;
#[cfg(not(test))]
use actix_web::{App, HttpServer, http::header, web};
#[cfg(not(test))]
use dotenvy::dotenv;

#[cfg(not(test))]
use crate::config::{ServerConfig, StoreKind};
#[cfg(not(test))]
use crate::db::init_pool;
#[cfg(not(test))]
use crate::routes::AppState;
#[cfg(not(test))]
use crate::store::ShipRepository;

#[cfg(not(test))]
fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = ServerConfig::from_env()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;

    let ships = match (config.store, config.database_url.as_deref()) {
        (StoreKind::Postgres, Some(database_url)) => {
            ShipRepository::Postgres(init_pool(database_url).map_err(std::io::Error::other)?)
        }
        _ => ShipRepository::memory(),
    };
    log::info!(
        "starting cosmoport on {}:{} with {} store",
        config.host,
        config.port,
        ships.kind()
    );
    let state = web::Data::new(AppState { ships });

    let ServerConfig {
        host,
        port,
        allowed_origins,
        ..
    } = config;
    let err_msg = format!("Can't bind {}:{}", &host, port);

    actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            let mut cors = Cors::default()
                .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::CONTENT_TYPE])
                .max_age(3600);
            for origin in &allowed_origins {
                cors = cors.allowed_origin(origin);
            }
            App::new()
                .wrap(actix_web::middleware::Logger::default())
                .wrap(cors)
                .app_data(state.clone())
                .configure(routes::configure)
        })
        .bind((host, port))
        .expect(&err_msg)
        .run()
        .await
    })
}

#[cfg(test)]
fn main() {}
