#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Variables from a local .env, if present, fill in what the shell lacks
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    emojibot::server::run().await?;
    Ok(())
}
