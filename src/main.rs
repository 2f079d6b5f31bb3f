//! likecap - scroll a likes timeline, save its API responses, and normalize
//! them into flat records.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use likecap::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let default_filter = if cli::is_verbose() {
        "likecap=info"
    } else {
        "likecap=warn"
    };

    // stdout is reserved for normalized output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    cli::run().await
}
