use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{http::header, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{CredentialStore, TokenService};
use crate::configuration::{CorsSettings, DatabaseSettings, Settings, StorageBackend};
use crate::error::{AppError, StorageError};
use crate::middleware::{JwtMiddleware, RequestLogger};
use crate::routes::{current_session, health_check, list_messages, login, post_message, register};
use crate::store::{
    AccountRepository, InMemoryAccountRepository, InMemoryMessageRepository, MessageRepository,
    PgAccountRepository, PgMessageRepository,
};

/// Storage handles shared by every worker.
#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountRepository>,
    pub messages: Arc<dyn MessageRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            accounts: Arc::new(InMemoryAccountRepository::new()),
            messages: Arc::new(InMemoryMessageRepository::new()),
        }
    }

    /// Connect to Postgres and bring the schema up to date.
    ///
    /// # Errors
    /// `StorageError::ConnectionPool` if the database is unreachable, or
    /// `StorageError::QueryExecution` if a migration fails.
    pub async fn postgres(settings: &DatabaseSettings) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect(&settings.connection_string())
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StorageError::QueryExecution(format!("migration failed: {}", e)))?;

        Ok(Self {
            accounts: Arc::new(PgAccountRepository::new(pool.clone())),
            messages: Arc::new(PgMessageRepository::new(pool)),
        })
    }

    pub async fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        match settings.storage.backend {
            StorageBackend::Postgres => Self::postgres(&settings.database).await,
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on shutdown");
                Ok(Self::in_memory())
            }
        }
    }
}

fn cors(settings: &CorsSettings) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(3600);

    if settings.allowed_origins.iter().any(|origin| origin == "*") {
        cors.allow_any_origin()
    } else {
        settings
            .allowed_origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

pub fn run(
    listener: TcpListener,
    credentials: CredentialStore,
    tokens: TokenService,
    messages: Arc<dyn MessageRepository>,
    cors_settings: CorsSettings,
) -> Result<Server, std::io::Error> {
    let credentials = web::Data::new(credentials);
    let tokens_data = web::Data::new(tokens.clone());
    let messages = web::Data::from(messages);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(cors(&cors_settings))
            .wrap(RequestLogger)

            // Shared state
            .app_data(credentials.clone())
            .app_data(tokens_data.clone())
            .app_data(messages.clone())

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/api/register", web::post().to(register))
            .route("/api/login", web::post().to(login))

            // Protected routes (require a session token)
            .service(
                web::scope("/api")
                    .wrap(JwtMiddleware::new(tokens.clone()))
                    .route("/me", web::get().to(current_session))
                    .route("/messages", web::get().to(list_messages))
                    .route("/messages", web::post().to(post_message)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
