//! Module for downloading thumbnails and keeping them in the per-video cache.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use tempfile::NamedTempFile;

use crate::error::ImageLoadError;

/// Cached source image, relative to the video's directory
const THUMBNAIL_FILE: &str = "thumbnail.jpg";
/// Last painted output, relative to the video's directory
const ANNOTATED_FILE: &str = "annotated.png";

/// Anything that can hand back the encoded bytes behind a thumbnail URL
pub trait ThumbnailSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageLoadError>;
}

impl<S: ThumbnailSource + ?Sized> ThumbnailSource for &S {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageLoadError> {
        (**self).fetch(url)
    }
}

/// Plain GET against the public thumbnail host; no authentication needed
pub struct HttpThumbnailSource {
    client: reqwest::blocking::Client,
}

impl HttpThumbnailSource {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl ThumbnailSource for HttpThumbnailSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageLoadError> {
        let network = |source| ImageLoadError::Network { url: url.to_string(), source };

        // Perform a blocking HTTP GET request
        let resp = self.client.get(url).send().map_err(network)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ImageLoadError::Status { url: url.to_string(), status: status.as_u16() });
        }
        let bytes = resp.bytes().map_err(network)?;
        tracing::debug!(url, bytes = bytes.len(), "fetched thumbnail");
        Ok(bytes.to_vec())
    }
}

/// Content cache of thumbnails, one directory per video id
#[derive(Debug, Clone)]
pub struct ThumbnailCache {
    root: PathBuf,
}

impl ThumbnailCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn video_dir(&self, video_id: &str) -> PathBuf {
        self.root.join(video_id)
    }

    pub fn image_path(&self, video_id: &str) -> PathBuf {
        self.video_dir(video_id).join(THUMBNAIL_FILE)
    }

    pub fn annotated_path(&self, video_id: &str) -> PathBuf {
        self.video_dir(video_id).join(ANNOTATED_FILE)
    }

    /// Creates the video's directory if it is missing
    pub fn ensure_dir(&self, video_id: &str) -> Result<PathBuf, ImageLoadError> {
        let dir = self.video_dir(video_id);
        fs::create_dir_all(&dir).map_err(|source| cache_error(&dir, source))?;
        Ok(dir)
    }

    /// Returns the cached encoded bytes, or `None` on a cache miss
    pub fn read(&self, video_id: &str) -> Result<Option<Vec<u8>>, ImageLoadError> {
        let path = self.image_path(video_id);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(cache_error(&path, source)),
        }
    }

    /// Stores `bytes` as the video's thumbnail.
    ///
    /// Written to a temp file in the same directory and renamed into place, so
    /// a concurrent reader sees either no file or the whole file.
    pub fn write(&self, video_id: &str, bytes: &[u8]) -> Result<PathBuf, ImageLoadError> {
        let dir = self.ensure_dir(video_id)?;
        let path = self.image_path(video_id);

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|source| cache_error(&dir, source))?;
        tmp.write_all(bytes).map_err(|source| cache_error(tmp.path(), source))?;
        tmp.persist(&path).map_err(|e| cache_error(&path, e.error))?;
        Ok(path)
    }
}

fn cache_error(path: &Path, source: io::Error) -> ImageLoadError {
    ImageLoadError::Cache { path: path.to_path_buf(), source }
}
