//! Batch driver: annotates every record of an uploads sequence, isolating failures per video.

use std::path::PathBuf;

use crate::{
    config::Config,
    error::{AnnotateError, FetchError},
    model::VideoRecord,
    painter::Annotator,
    thumbnail::{ThumbnailCache, ThumbnailSource},
};

/// Outcome counts of one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Videos whose annotated thumbnail was written
    pub annotated: usize,
    /// Videos whose metadata or thumbnail could not be processed
    pub failed: usize,
}

/// Annotates each record in turn; a failure is logged and counted, never fatal
pub fn annotate_all<I, S>(uploads: I, source: &S, config: &Config) -> BatchSummary
where
    I: IntoIterator<Item = Result<VideoRecord, FetchError>>,
    S: ThumbnailSource,
{
    let mut summary = BatchSummary::default();
    for record in uploads {
        let record = match record {
            Ok(record) => {
                tracing::debug!(video_id = %record.video_id, views = ?record.views, description = %record.description, "video metadata");
                record
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch video metadata");
                summary.failed += 1;
                continue;
            }
        };
        match annotate(config, source, &record) {
            Ok(path) => {
                tracing::info!(video_id = %record.video_id, title = %record.title, path = %path.display(), "annotated thumbnail");
                summary.annotated += 1;
            }
            Err(e) => {
                tracing::warn!(video_id = %record.video_id, error = %e, "failed to annotate thumbnail");
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Loads, paints and saves one video's thumbnail
pub fn annotate<S: ThumbnailSource>(
    config: &Config,
    source: S,
    record: &VideoRecord,
) -> Result<PathBuf, AnnotateError> {
    let mut annotator = Annotator::new(ThumbnailCache::new(&config.data_dir), source, config.style());
    annotator.load_record(record)?;
    annotator.paint(config.position)?;
    annotator.details();
    let path = annotator.save()?;
    if config.display {
        annotator.display(&record.title)?;
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, io::Cursor};

    use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
    use serde_json::{Value, json};

    use super::*;
    use crate::{
        error::ImageLoadError,
        youtube::{Transport, YouTubeClient},
    };

    /// One uploads page of three videos; statistics for `b` fail
    struct BatchTransport;

    impl Transport for BatchTransport {
        fn get_json(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
            let id = query.iter().find(|(k, _)| *k == "id").map(|(_, v)| *v);
            match (endpoint, id) {
                ("playlistItems", _) => Ok(json!({
                    "items": [
                        { "snippet": { "title": "No thumbs", "resourceId": { "videoId": "a" } } },
                        { "snippet": { "title": "Broken stats", "resourceId": { "videoId": "b" },
                            "thumbnails": { "high": { "url": "https://i.ytimg.com/vi/b/hqdefault.jpg" } } } },
                        { "snippet": { "title": "Fine", "resourceId": { "videoId": "c" },
                            "thumbnails": { "high": { "url": "https://i.ytimg.com/vi/c/hqdefault.jpg" } } } }
                    ]
                })),
                ("videos", Some("b")) => Err(FetchError::Api { status: 500, body: "backend error".into() }),
                ("videos", _) => Ok(json!({ "items": [{ "statistics": { "likeCount": "1500", "dislikeCount": "20" } }] })),
                _ => Ok(json!({ "items": [] })),
            }
        }
    }

    struct PngSource {
        png: Vec<u8>,
        calls: Cell<usize>,
    }

    impl ThumbnailSource for PngSource {
        fn fetch(&self, _url: &str) -> Result<Vec<u8>, ImageLoadError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.png.clone())
        }
    }

    fn png_source() -> PngSource {
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(320, 180, Rgb([30, 60, 90])))
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
            .unwrap();
        PngSource { png, calls: Cell::new(0) }
    }

    fn config_in(dir: &std::path::Path) -> Config {
        let data_dir = dir.to_string_lossy().into_owned();
        Config::from_lookup(|key| (key == "THUMBSTATS_DATA_DIR").then(|| data_dir.clone())).unwrap()
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let client = YouTubeClient::new(BatchTransport, 5);
        let source = png_source();

        let summary = annotate_all(client.uploads("UU123"), &source, &config);

        assert_eq!(summary, BatchSummary { annotated: 1, failed: 2 });
        assert_eq!(source.calls.get(), 1);
        assert!(dir.path().join("c").join("annotated.png").is_file());
        assert!(!dir.path().join("a").join("annotated.png").exists());
        assert!(!dir.path().join("b").exists());
    }

    #[test]
    fn empty_sequence_is_an_empty_summary() {
        let dir = tempfile::tempdir().unwrap();
        let summary = annotate_all(Vec::new(), &png_source(), &config_in(dir.path()));
        assert_eq!(summary, BatchSummary::default());
    }
}
