use std::{future::IntoFuture, process, sync::Arc};

use freshgate::{
    application::{
        error::AppError,
        health::{HealthService, HealthSettings},
        results_cache::ResultsCacheService,
    },
    cache::{CacheConfig, Clock, FreshnessGate, SystemClock},
    config,
    domain::health::MigrationStatus,
    infra::{
        error::InfraError,
        http::{self, ApiState},
        memory::{InMemoryOrganizations, InMemoryQueryHistory, StaticMigrationStatus},
        telemetry,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(|err| {
        InfraError::configuration(format!("failed to load configuration: {err}"))
    })?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let state = build_api_state(&settings);
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(
        addr = %settings.server.addr,
        mode = settings.site.mode.as_str(),
        "freshgate listening"
    );

    let shutdown = Arc::new(Notify::new());
    let server_shutdown = shutdown.clone();
    let mut server = tokio::spawn(
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async move { server_shutdown.notified().await })
            .into_future(),
    );

    let joined = tokio::select! {
        joined = &mut server => joined,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            shutdown.notify_one();
            match tokio::time::timeout(settings.server.graceful_shutdown, &mut server).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(
                        timeout_secs = settings.server.graceful_shutdown.as_secs(),
                        "graceful shutdown timed out; aborting open connections"
                    );
                    server.abort();
                    return Ok(());
                }
            }
        }
    };

    joined
        .map_err(|err| InfraError::Io(std::io::Error::other(err)))?
        .map_err(InfraError::from)?;
    Ok(())
}

/// Wire the services over in-memory repositories.
fn build_api_state(settings: &config::Settings) -> ApiState {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache_config = CacheConfig::from(&settings.cache);

    let health_settings = HealthSettings {
        mode: settings.site.mode,
        install_type: settings.site.install_type,
        site_url: settings.site.url.clone(),
        pylon_app_id: settings.pylon.app_id.clone(),
        pylon_identity_verification_secret: settings.pylon.identity_verification_secret.clone(),
        ..HealthSettings::default()
    };

    let health = HealthService::new(
        health_settings,
        Arc::new(StaticMigrationStatus::new(MigrationStatus::in_sync(env!(
            "CARGO_PKG_VERSION"
        )))),
        Arc::new(InMemoryOrganizations::new(false)),
        cache_config.health_ttl(),
        clock.clone(),
    );
    let results = ResultsCacheService::new(
        Arc::new(InMemoryQueryHistory::new()),
        FreshnessGate::from(&cache_config),
        clock,
    );

    ApiState {
        health: Arc::new(health),
        results: Arc::new(results),
    }
}
