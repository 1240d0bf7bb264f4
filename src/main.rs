use std::sync::Arc;

use anyhow::Context;

use triage_engine::api;
use triage_engine::channels::CliChannel;
use triage_engine::config::EngineConfig;
use triage_engine::triage::DecisionEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = EngineConfig::from_env().context("invalid configuration")?;

    // The taxonomy must be complete before any request is served.
    let engine = Arc::new(
        DecisionEngine::from_config(&config).context("failed to build decision engine")?,
    );
    let taxonomy = engine.classifier().taxonomy();

    eprintln!("🩺 Triage Engine v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Taxonomy: {} ({} phrases)",
        taxonomy.version(),
        taxonomy.len()
    );
    eprintln!("   Window: last {} patient turns", config.window_size);

    match std::env::args().nth(1).as_deref() {
        Some("repl") => {
            eprintln!("   Type a message and press Enter. /reset to start over, /quit to exit.\n");
            CliChannel::new(engine).run().await?;
        }
        Some("serve") | None => {
            eprintln!("   API: http://{}/api/triage/decide\n", config.listen_addr());
            api::serve(&config, engine).await?;
        }
        Some(other) => {
            anyhow::bail!("unknown command '{other}' (expected 'serve' or 'repl')");
        }
    }

    Ok(())
}
