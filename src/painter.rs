//! Thumbnail annotation: load a thumbnail, then paint a like/dislike overlay on it.

use std::path::PathBuf;

use image::{ImageFormat, Rgb, RgbImage};

use crate::{
    error::{AnnotateError, ImageLoadError},
    model::{Position, Rect, Thumbnails, VideoRecord, best_thumbnail},
    text,
    thumbnail::{ThumbnailCache, ThumbnailSource},
    viewer,
};

/// Distance kept between the overlay and the image edges, as a fraction of the dimension
const MARGIN: f64 = 0.035;
/// Overlay width as a fraction of image width
const OVERLAY_WIDTH: f64 = 0.25;
/// Overlay height as a fraction of image height
const OVERLAY_HEIGHT: f64 = 0.07;

/// Tunables for how the overlay is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    /// Weight of the original pixels under the overlay; 0 replaces them with the fill
    pub opacity: f32,
    /// Glyph size in pixels
    pub font_px: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self { opacity: 0.0, font_px: 28.0 }
    }
}

/// Where a loaded buffer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    Cache,
    Network,
}

#[derive(Debug)]
struct Loaded {
    video_id: String,
    like_count: Option<u64>,
    dislike_count: Option<u64>,
    thumbnails: Option<Thumbnails>,
    origin: ImageOrigin,
    image: RgbImage,
    /// Anchor and rectangle of the last overlay painted
    painted: Option<(Position, Rect)>,
}

/// Owns one thumbnail buffer and paints the stats overlay onto it
pub struct Annotator<S> {
    cache: ThumbnailCache,
    source: S,
    style: OverlayStyle,
    loaded: Option<Loaded>,
}

impl<S: ThumbnailSource> Annotator<S> {
    pub fn new(cache: ThumbnailCache, source: S, style: OverlayStyle) -> Self {
        Self { cache, source, style, loaded: None }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Width and height of the loaded buffer
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.loaded.as_ref().map(|l| l.image.dimensions())
    }

    pub fn origin(&self) -> Option<ImageOrigin> {
        self.loaded.as_ref().map(|l| l.origin)
    }

    pub fn image(&self) -> Option<&RgbImage> {
        self.loaded.as_ref().map(|l| &l.image)
    }

    /// Anchor and rectangle of the most recent `paint` since the last load
    pub fn painted(&self) -> Option<(Position, Rect)> {
        self.loaded.as_ref().and_then(|l| l.painted)
    }

    pub fn load_record(&mut self, record: &VideoRecord) -> Result<(), AnnotateError> {
        self.load(
            &record.video_id,
            record.like_count,
            record.dislike_count,
            Some(&record.thumbnails),
        )
    }

    /// Loads the buffer for `video_id`, from the cache when present, else from
    /// the best thumbnail tier (which is then cached).
    pub fn load(
        &mut self,
        video_id: &str,
        like_count: Option<u64>,
        dislike_count: Option<u64>,
        thumbnails: Option<&Thumbnails>,
    ) -> Result<(), AnnotateError> {
        self.loaded = None;
        validate_video_id(video_id)?;
        self.cache.ensure_dir(video_id)?;

        let (image, origin) = match self.cache.read(video_id)? {
            Some(bytes) => {
                tracing::debug!(video_id, "thumbnail cache hit");
                (image::load_from_memory(&bytes).map_err(ImageLoadError::from)?, ImageOrigin::Cache)
            }
            None => {
                let thumbnail = thumbnails.and_then(best_thumbnail).ok_or_else(|| {
                    AnnotateError::ImageUnavailable { video_id: video_id.to_string() }
                })?;
                tracing::info!(video_id, url = %thumbnail.url, "fetching thumbnail");
                let bytes = self.source.fetch(&thumbnail.url)?;
                let decoded = image::load_from_memory(&bytes).map_err(ImageLoadError::from)?;
                // Cached as fetched; every later load decodes these exact bytes
                let path = self.cache.write(video_id, &bytes)?;
                tracing::debug!(video_id, path = %path.display(), "cached thumbnail");
                (decoded, ImageOrigin::Network)
            }
        };

        self.loaded = Some(Loaded {
            video_id: video_id.to_string(),
            like_count,
            dislike_count,
            thumbnails: thumbnails.cloned(),
            origin,
            image: image.to_rgb8(),
            painted: None,
        });
        Ok(())
    }

    /// Paints the stats overlay at `position` and returns the rectangle used
    pub fn paint(&mut self, position: Position) -> Result<Rect, AnnotateError> {
        let loaded = self.loaded.as_mut().ok_or(AnnotateError::NotLoaded)?;
        let font = text::overlay_font()?;

        let (width, height) = loaded.image.dimensions();
        let rect = overlay_rect(width, height, position);
        let mean = mean_color(&loaded.image);
        let fill = Rgb(mean.map(|c| c as u8));

        fill_rect(&mut loaded.image, rect, fill, self.style.opacity);
        let label = stats_label(loaded.like_count, loaded.dislike_count);
        text::draw_text_centered(
            &mut loaded.image,
            font,
            self.style.font_px,
            &label,
            rect,
            text_color(mean),
        );

        loaded.painted = Some((position, rect));
        tracing::debug!(video_id = %loaded.video_id, %position, ?rect, %label, "painted overlay");
        Ok(rect)
    }

    /// Writes the current buffer as PNG next to the cached thumbnail
    pub fn save(&self) -> Result<PathBuf, AnnotateError> {
        let loaded = self.loaded.as_ref().ok_or(AnnotateError::NotLoaded)?;
        self.cache.ensure_dir(&loaded.video_id)?;
        let path = self.cache.annotated_path(&loaded.video_id);
        loaded
            .image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| AnnotateError::Save { path: path.clone(), source })?;
        Ok(path)
    }

    pub fn details(&self) {
        let Some(loaded) = &self.loaded else {
            tracing::info!("annotator has no thumbnail loaded");
            return;
        };
        let tiers: Vec<&str> = loaded
            .thumbnails
            .iter()
            .flat_map(|t| t.keys().map(String::as_str))
            .collect();
        tracing::info!(
            video_id = %loaded.video_id,
            like_count = ?loaded.like_count,
            dislike_count = ?loaded.dislike_count,
            ?tiers,
            origin = ?loaded.origin,
            position = ?loaded.painted.map(|(p, _)| p.as_str()),
            rect = ?loaded.painted.map(|(_, r)| r),
            width = loaded.image.width(),
            height = loaded.image.height(),
            "thumbnail details"
        );
    }

    /// Shows the buffer in a window and blocks until it is closed
    pub fn display(&self, window_name: &str) -> Result<(), AnnotateError> {
        let loaded = self.loaded.as_ref().ok_or(AnnotateError::NotLoaded)?;
        viewer::show(window_name, &loaded.image).map_err(|e| AnnotateError::Display(e.to_string()))
    }
}

fn validate_video_id(video_id: &str) -> Result<(), AnnotateError> {
    let ok = !video_id.is_empty()
        && video_id != "."
        && video_id != ".."
        && !video_id.contains(['/', '\\', '\0']);
    if ok { Ok(()) } else { Err(AnnotateError::InvalidVideoId(video_id.to_string())) }
}

/// Rectangle hosting the overlay for an image of `width` x `height`
pub fn overlay_rect(width: u32, height: u32, position: Position) -> Rect {
    let (w, h) = (width as f64, height as f64);
    let rect_w = (w * OVERLAY_WIDTH) as u32;
    let rect_h = (h * OVERLAY_HEIGHT) as u32;

    let left = (w * MARGIN) as u32;
    let top = (h * MARGIN) as u32;
    let right = ((w * (1.0 - MARGIN)) as u32).saturating_sub(rect_w);
    let bottom = ((h * (1.0 - MARGIN)) as u32).saturating_sub(rect_h);
    let center_x = ((w * 0.5) as u32).saturating_sub(rect_w / 2);
    let center_y = ((h * 0.5) as u32).saturating_sub(rect_h / 2);

    let (x, y) = match position {
        Position::Top => (center_x, top),
        Position::Bottom => (center_x, bottom),
        Position::Left => (left, center_y),
        Position::Right => (right, center_y),
        Position::TopLeft => (left, top),
        Position::TopRight => (right, top),
        Position::BottomLeft => (left, bottom),
        Position::BottomRight => (right, bottom),
        Position::Center => (center_x, center_y),
    };
    Rect { x, y, width: rect_w, height: rect_h }
}

/// Per-channel average over every pixel
pub fn mean_color(image: &RgbImage) -> [f64; 3] {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return [0.0; 3];
    }
    let mut sums = [0u64; 3];
    for pixel in image.pixels() {
        for (sum, channel) in sums.iter_mut().zip(pixel.0) {
            *sum += channel as u64;
        }
    }
    sums.map(|s| s as f64 / count as f64)
}

/// Black on bright backgrounds (every channel above 127), white otherwise
pub fn text_color(mean: [f64; 3]) -> Rgb<u8> {
    if mean.iter().all(|&c| c > 127.0) { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
}

fn fill_rect(image: &mut RgbImage, rect: Rect, fill: Rgb<u8>, opacity: f32) {
    let x_end = (rect.x + rect.width).min(image.width());
    let y_end = (rect.y + rect.height).min(image.height());
    for y in rect.y..y_end {
        for x in rect.x..x_end {
            let pixel = image.get_pixel_mut(x, y);
            *pixel = text::mix(fill, *pixel, opacity);
        }
    }
}

/// Overlay label, e.g. `L: 1.5K / D: 20`
pub fn stats_label(like_count: Option<u64>, dislike_count: Option<u64>) -> String {
    format!("L: {} / D: {}", format_count(like_count), format_count(dislike_count))
}

fn format_count(count: Option<u64>) -> String {
    count.map(int_as_words).unwrap_or_else(|| "N/A".to_string())
}

/// Abbreviates `x` to at most one truncated fractional digit: 1500 -> "1.5K", 2000 -> "2K"
pub fn int_as_words(x: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_000, "K"), (1_000_000, "M"), (1_000_000_000, "B")];

    if x < 1_000 {
        return x.to_string();
    }
    let (unit, suffix) = UNITS
        .into_iter()
        .find(|(unit, _)| x < unit * 1_000)
        .unwrap_or((1_000_000_000_000, "T"));

    let whole = x / unit;
    let tenth = (x / (unit / 10)) % 10;
    if tenth == 0 { format!("{whole}{suffix}") } else { format!("{whole}.{tenth}{suffix}") }
}
