use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use redsum_api::{build_router, config::Config, state::AppState};
use redsum_llm::{ChatClient, OpenAIClient};
use redsum_pipeline::SummaryPipeline;
use redsum_reddit::{RedditClient, ThreadFetcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting redsum API server");
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        models = config.models.len(),
        "Config loaded"
    );

    let chat_client: Arc<dyn ChatClient> = Arc::new(OpenAIClient::from_config(
        config.llm.openai_config(&config.openai_api_key),
    )?);

    let fetcher: Arc<dyn ThreadFetcher> = Arc::new(RedditClient::new(config.reddit.clone())?);

    let pipeline = SummaryPipeline::builder()
        .chat_client(chat_client)
        .options(config.summarizer.pipeline_options(config.llm.temperature))
        .build()?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, fetcher, pipeline));
    let shutdown = state.shutdown.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown requested, cancelling in-flight summaries");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
