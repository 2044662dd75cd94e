use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tag_relay::config::Config;
use tag_relay::dispatch::{self, Dispatcher};
use tag_relay::registry::{self, Registry};
use tag_relay::server::{build_router, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tag_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    // A failed load leaves the registry empty: every webhook then takes the
    // unknown-project exit, but the service still comes up.
    let registry = Registry::new();
    let client = reqwest::Client::new();
    match registry::fetch_manifest(&client, &config.gist_id).await {
        Ok(projects) => {
            registry.replace(projects);
            info!(projects = registry.len(), "project registry loaded");
        }
        Err(e) => error!(error = %e, "failed to load project registry"),
    }

    // Handoff point for the packaging pipeline: jobs are consumed here
    // without reporting anything back to the HTTP layer.
    let (sink, mut jobs) = dispatch::channel();
    tokio::spawn(async move {
        while let Some(request) = jobs.recv().await {
            info!(
                job = %request.job,
                repo = %request.project.repo,
                tag = %request.project.tag.as_deref().unwrap_or_default(),
                "packaging job handed off"
            );
        }
    });

    let state = AppState::new(
        registry,
        Dispatcher::new(Arc::new(sink)),
        config.secret.as_bytes().to_vec(),
    );
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
