//! Overlays like/dislike statistics on YouTube video thumbnails.
//!
//! [`youtube`] lists the authenticated account's uploads; [`painter`] loads each
//! thumbnail through the per-video cache in [`thumbnail`] and paints the stats on it.

// Environment-driven settings
pub mod config;
// Typed errors for fetching and annotating
pub mod error;
// Data models for videos, thumbnails and overlay geometry
pub mod model;
// Thumbnail annotation engine
pub mod painter;
// Batch driver over an uploads sequence
pub mod run;
// Overlay font and glyph rendering
pub mod text;
// Thumbnail downloading and the per-video cache
pub mod thumbnail;
// Native window for inspecting results
pub mod viewer;
// YouTube Data API client
pub mod youtube;
