use std::{env, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, bail};

use crate::{model::Position, painter::OverlayStyle};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone)]
pub struct Config {
    /// OAuth2 bearer token with the `youtube.readonly` scope
    pub access_token: Option<String>,
    /// Root of the YouTube Data API
    pub api_base: String,
    /// Per-video cache directories live under here
    pub data_dir: PathBuf,
    /// Overlay anchor
    pub position: Position,
    /// `maxResults` for playlist pages (the API caps it at 50)
    pub page_size: u32,
    /// Applied to every HTTP request
    pub request_timeout: Duration,
    /// Open a window per annotated thumbnail
    pub display: bool,
    /// Overlay glyph size in pixels
    pub font_px: f32,
    /// Weight of the original pixels under the overlay rectangle
    pub opacity: f32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source; unset keys take defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let page_size: u32 = parse_or(&lookup, "THUMBSTATS_PAGE_SIZE", 5)?;
        if !(1..=50).contains(&page_size) {
            bail!("THUMBSTATS_PAGE_SIZE must be between 1 and 50, got {page_size}");
        }
        let font_px: f32 = parse_or(&lookup, "THUMBSTATS_FONT_PX", 28.0)?;
        if !(font_px > 0.0 && font_px.is_finite()) {
            bail!("THUMBSTATS_FONT_PX must be a positive number, got {font_px}");
        }
        let opacity: f32 = parse_or(&lookup, "THUMBSTATS_OPACITY", 0.0)?;
        if !(0.0..=1.0).contains(&opacity) {
            bail!("THUMBSTATS_OPACITY must be between 0 and 1, got {opacity}");
        }

        Ok(Self {
            access_token: lookup("YOUTUBE_ACCESS_TOKEN").filter(|t| !t.trim().is_empty()),
            api_base: lookup("THUMBSTATS_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            data_dir: lookup("THUMBSTATS_DATA_DIR").unwrap_or_else(|| "data".to_string()).into(),
            position: parse_or(&lookup, "THUMBSTATS_POSITION", Position::BottomRight)?,
            page_size,
            request_timeout: Duration::from_secs(parse_or(&lookup, "THUMBSTATS_TIMEOUT_SECS", 30)?),
            display: parse_or(&lookup, "THUMBSTATS_DISPLAY", false)?,
            font_px,
            opacity,
        })
    }

    pub fn style(&self) -> OverlayStyle {
        OverlayStyle { opacity: self.opacity, font_px: self.font_px }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("invalid value for {key}: `{raw}`")),
        None => Ok(default),
    }
}
