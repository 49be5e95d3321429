use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use taskdeck::{
    auth::{AuthMiddleware, TokenService},
    config::{Config, Environment},
    error::{expose_internal_errors, AppError},
    routes::{self, health},
    state::AppState,
    store::PgStore,
};

fn startup_error(err: AppError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

fn cors(origin: &str) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);
    if origin == "*" {
        cors.allow_any_origin()
    } else {
        cors.allowed_origin(origin).supports_credentials()
    }
}

async fn build_state(config: &Config, tokens: TokenService) -> Result<AppState, AppError> {
    match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.database_max_connections).await?;
            store.migrate().await?;
            log::info!("Connected to Postgres, migrations applied");
            Ok(AppState::new(Arc::new(store), tokens, config.bcrypt_cost))
        }
        None => {
            log::warn!("DATABASE_URL is not set; using the in-memory store, data is lost on restart");
            Ok(AppState::in_memory(tokens, config.bcrypt_cost))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(startup_error)?;
    expose_internal_errors(config.environment == Environment::Development);

    let lifetime = config.token_lifetime().map_err(startup_error)?;
    let tokens = TokenService::new(&config.jwt_secret, lifetime);
    let state = build_state(&config, tokens).await.map_err(startup_error)?;

    log::info!(
        "Starting taskdeck ({:?}) at {}",
        config.environment,
        config.server_url()
    );

    let cors_origin = config.cors_origin.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors(&cors_origin))
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(state.tokens().clone()))
                    .configure(routes::config)
                    .default_service(web::to(routes::not_found)),
            )
            .default_service(web::to(routes::not_found))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
