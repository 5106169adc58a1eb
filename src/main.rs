use std::io;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;

use teamforge::config::Config;
use teamforge::repository::Repositories;
use teamforge::{routes, AppState};

fn other<E: std::fmt::Display>(error: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, error.to_string())
}

async fn repositories(config: &Config) -> io::Result<Repositories> {
    let Some(database_url) = &config.database_url else {
        log::warn!("DATABASE_URL not set, keeping data in memory");
        return Ok(Repositories::in_memory());
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(other)?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(other)?;
    log::info!("connected to PostgreSQL, migrations applied");

    Ok(Repositories::postgres(pool))
}

fn cors(origin: Option<&str>) -> Cors {
    match origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allow_any_method()
            .allow_any_header()
            .max_age(3600),
        None => Cors::permissive(),
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(other)?;
    let state = AppState::new(repositories(&config).await?, config.token_codec());
    let cors_origin = config.cors_origin.clone();

    log::info!("Starting TeamForge server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .wrap(cors(cors_origin.as_deref()))
            .wrap(Logger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
