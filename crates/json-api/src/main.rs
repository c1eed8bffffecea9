//! Tessera JSON API Server

use std::{process, sync::Arc};

use salvo::{affix_state::inject, prelude::*, trailing_slash::remove_slash};
use thiserror::Error;
use tracing::{error, info, warn};

use tessera_app::{
    clock::SystemClock,
    context::{AppContext, AppInitError, Collaborators},
    crypto::{KeyError, Keyring},
    delivery::{Delivery, LogDelivery, RelayDelivery},
    federation::{FederationError, ReqwestHomeserverClient},
};

use crate::{
    config::{ConfigError, ServerConfig},
    observability::MeteredDelivery,
    state::State,
};

mod account;
mod associations;
mod auth;
mod config;
mod errors;
mod extensions;
mod healthcheck;
mod observability;
mod pubkey;
mod router;
mod shutdown;
mod state;
mod status;
mod terms;
#[cfg(test)]
mod test_helpers;
mod validation;

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load signing key: {0}")]
    Key(#[from] KeyError),

    #[error("failed to read email template: {0}")]
    Template(#[source] std::io::Error),

    #[error("failed to build federation client: {0}")]
    Federation(#[from] FederationError),

    #[error("failed to initialize app context: {0}")]
    App(#[from] AppInitError),
}

/// Tessera JSON API Server entry point
#[tokio::main]
pub async fn main() {
    // Load configuration from .env and CLI arguments
    let config = ServerConfig::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(1);
    });

    if let Err(init_error) = observability::init(&config) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialize, must use eprintln"
        )]
        {
            eprintln!("Observability error: {init_error}");
        }

        process::exit(1);
    }

    let app = match build_app(&config).await {
        Ok(app) => app,
        Err(startup_error) => {
            error!("{startup_error}");

            process::exit(1);
        }
    };

    info!(
        server_name = %app.keyring.server_name(),
        key_id = %app.keyring.key_id(),
        v1 = config.identity.enable_v1_access,
        "identity server ready"
    );

    let mut router = Router::new()
        .hoop(CatchPanic::new())
        .hoop(remove_slash())
        .hoop(observability::request_logging)
        .hoop(inject(State::from_app_context(app)))
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(router::app_router(config.identity.enable_v1_access));

    if config.observability.metrics_enabled {
        router = router.push(Router::with_path("metrics").get(observability::metrics_handler));
    }

    let addr = config.socket_addr();

    info!("Starting server on {addr}");

    // Bind server
    let listener = TcpListener::new(addr).bind().await;

    let server = Server::new(listener);

    let handle = server.handle();

    let grace = config.server.shutdown_grace();

    tokio::spawn(async move {
        if let Err(error) = shutdown::stop_on_exit_signal(handle, grace).await {
            error!(?error, "failed to listen for exit signals");
        }
    });

    // Start serving requests
    server
        .serve(Service::new(router).catcher(router::catcher()))
        .await;
}

/// Load keys and settings, pick the delivery channel and open the database.
async fn build_app(config: &ServerConfig) -> Result<AppContext, StartupError> {
    let settings = config.settings()?;

    let keyring = Keyring::load_or_generate(
        settings.server_name.clone(),
        &config.identity.signing_key_path,
    )?;

    let composer = config
        .delivery
        .composer(&settings.server_name)
        .map_err(StartupError::Template)?;

    let clock = Arc::new(SystemClock);

    let channel: Arc<dyn Delivery> = match &config.delivery.relay_url {
        Some(url) => Arc::new(RelayDelivery::new(url.clone(), composer, clock)),
        None => {
            warn!("DELIVERY_RELAY_URL is not set, validation tokens will only be logged");

            Arc::new(LogDelivery::new(composer, clock))
        }
    };

    let collaborators = Collaborators {
        delivery: Arc::new(MeteredDelivery::new(channel)),
        homeserver: Arc::new(ReqwestHomeserverClient::new(
            config.identity.federation_timeout(),
        )?),
    };

    Ok(AppContext::from_database_url(
        &config.database.database_url,
        settings,
        keyring,
        collaborators,
    )
    .await?)
}
