use std::net::TcpListener;
use std::sync::Arc;

use chatterbox::auth::{CredentialStore, TokenService};
use chatterbox::clock::SystemClock;
use chatterbox::configuration::get_configuration;
use chatterbox::startup::{run, Repositories};
use chatterbox::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    // Storage is required; no degraded mode.
    let repositories = Repositories::from_settings(&configuration)
        .await
        .map_err(|e| {
            tracing::error!("Failed to initialise storage: {}", e);
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Storage error")
        })?;
    tracing::info!(backend = ?configuration.storage.backend, "Storage ready");

    let tokens = TokenService::from_settings(&configuration.auth, Arc::new(SystemClock))
        .map_err(|e| {
            tracing::error!("Failed to initialise token service: {}", e);
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
        })?;
    let credentials = CredentialStore::new(
        repositories.accounts.clone(),
        configuration.auth.bcrypt_cost,
    )
    .map_err(|e| {
        tracing::error!("Failed to initialise credential store: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(
        listener,
        credentials,
        tokens,
        repositories.messages.clone(),
        configuration.cors.clone(),
    )?;
    tracing::info!("Server started successfully");

    server.await
}
