//! Main application: overlays like/dislike stats on every uploaded video's thumbnail

use anyhow::Context;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use thumbstats::{
    config::Config,
    run::annotate_all,
    thumbnail::HttpThumbnailSource,
    youtube::{HttpTransport, YouTubeClient},
};

/// Program entry point: lists uploads, then annotates each one in turn
fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "thumbstats=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let token = config
        .access_token
        .clone()
        .context("YOUTUBE_ACCESS_TOKEN must be set to an OAuth2 access token")?;
    let transport = HttpTransport::new(&config.api_base, token, config.request_timeout)
        .context("failed to build API client")?;
    let client = YouTubeClient::new(transport, config.page_size);
    let source =
        HttpThumbnailSource::new(config.request_timeout).context("failed to build thumbnail client")?;

    let Some(uploads) = client.fetch_uploads().context("failed to look up the uploads playlist")? else {
        tracing::info!("There is no uploaded videos playlist for this user.");
        return Ok(());
    };

    let summary = annotate_all(uploads, &source, &config);
    tracing::info!(annotated = summary.annotated, failed = summary.failed, "done");
    Ok(())
}
