//! Router assembly and the HTTP listener.

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use super::routes::{TriageRouteState, triage_routes};
use crate::config::EngineConfig;
use crate::error::{Result, ServerError};
use crate::triage::DecisionEngine;

/// CORS policy: permissive when no origins are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Full application router.
pub fn build_router(engine: Arc<DecisionEngine>, config: &EngineConfig) -> Router {
    triage_routes(TriageRouteState { engine }).layer(cors_layer(&config.cors_origins))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &EngineConfig, engine: Arc<DecisionEngine>) -> Result<()> {
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!(
        addr = %addr,
        taxonomy_version = %engine.taxonomy_version(),
        "Triage server started"
    );

    let app = build_router(engine, config);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("Shutting down triage server");
        })
        .await
        .map_err(ServerError::Serve)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::triage::KeywordTaxonomy;

    #[tokio::test]
    async fn serve_reports_bind_failure() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = EngineConfig {
            bind_addr: "127.0.0.1".into(),
            port: taken.local_addr().unwrap().port(),
            ..EngineConfig::default()
        };
        let engine = Arc::new(DecisionEngine::with_taxonomy(Arc::new(
            KeywordTaxonomy::builtin().unwrap(),
        )));

        let err = serve(&config, engine).await.unwrap_err();
        assert!(matches!(err, Error::Server(ServerError::Bind { .. })));
        assert!(err.to_string().contains(&config.listen_addr()));
    }
}
