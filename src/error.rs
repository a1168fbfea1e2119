use std::{io, path::PathBuf};

/// Failure while obtaining the pixels of an available thumbnail
#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("failed to fetch thumbnail from {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("thumbnail request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode thumbnail image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("thumbnail cache I/O failed at {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure while loading, painting, saving or showing a thumbnail
#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    #[error("invalid video id `{0}`")]
    InvalidVideoId(String),

    #[error("no cached image and no thumbnail to fetch for video {video_id}")]
    ImageUnavailable { video_id: String },

    #[error(transparent)]
    ImageLoad(#[from] ImageLoadError),

    #[error("no thumbnail loaded; call load() first")]
    NotLoaded,

    #[error("failed to prepare overlay font: {0}")]
    Font(&'static str),

    #[error("failed to write annotated image to {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("viewer failed: {0}")]
    Display(String),
}

/// Failure talking to the video platform's data API
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unexpected API response: {0}")]
    Decode(#[from] serde_json::Error),
}
