//! Portico server binary
//!
//! Loads configuration, connects the database, wires the shared clients and
//! serves the control plane and the MCP gateway from one process.

use std::sync::Arc;

use anyhow::Context;
use axum::routing::post;
use axum::Router;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use portico_config::ConfigLoader;
use portico_http::{shared_client, EmailClient, EmbeddingClient, StripeClient};
use portico_mcp::{handle_mcp_request, GatewayState, UpstreamClient};
use portico_oauth2::{OAuth2Manager, StateCodec};
use portico_rest_api::{build_router, AppContext};
use portico_web::{request_id_middleware, JwtManager, TokenHasher};

#[derive(Parser)]
#[command(name = "portico", about = "Portico MCP gateway and control plane")]
struct Cli {
    /// Path to the YAML configuration file; env vars apply on top
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ConfigLoader::new()
        .load(cli.config.as_ref())
        .context("failed to load configuration")?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.as_filter().into());
    if config.logging.json {
        tracing_subscriber::fmt().with_env_filter(env_filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let db = portico_storage::connect(&config.database)
        .await
        .context("failed to connect to the database")?;

    let http = shared_client(config.gateway.upstream_timeout_seconds);
    let config = Arc::new(config);

    let oauth2 = OAuth2Manager::new(http.clone());
    let embeddings = EmbeddingClient::new(http.clone(), config.embeddings.clone());
    let upstream = UpstreamClient::new(http.clone());

    let gateway_state = Arc::new(GatewayState {
        db: db.clone(),
        upstream: upstream.clone(),
        oauth2: oauth2.clone(),
        embeddings: embeddings.clone(),
        config: config.gateway.clone(),
    });

    let app_context = AppContext {
        db,
        config: config.clone(),
        http: http.clone(),
        jwt: JwtManager::new(
            &config.auth.jwt_signing_key,
            config.auth.access_token_minutes as i64,
        ),
        token_hasher: TokenHasher::new(&config.auth.refresh_token_hmac_key),
        acl: Arc::new(portico_rbac::default_acl().context("invalid ACL")?),
        email: EmailClient::new(http.clone(), config.email.clone()),
        embeddings,
        stripe: StripeClient::new(http, &config.stripe.secret_key),
        oauth2,
        state_codec: StateCodec::new(&config.auth.jwt_signing_key),
        upstream,
    };

    let app = Router::new()
        .route(
            "/mcp/{bundle_key}",
            post(handle_mcp_request).with_state(gateway_state),
        )
        .merge(build_router(app_context))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let address = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!(%address, "portico listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
