use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::Deserialize;

/// Thumbnail tiers in the order they are preferred when picking one to fetch
pub const TIER_PREFERENCE: [&str; 5] = ["maxres", "standard", "high", "medium", "default"];

/// Mapping from tier name (e.g. "high") to the thumbnail offered at that tier
pub type Thumbnails = BTreeMap<String, Thumbnail>;

/// A single thumbnail variant as returned by the platform
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Thumbnail {
    /// Public URL of the encoded image
    pub url: String,
    /// Pixel width, when the platform reports it
    #[serde(default)]
    pub width: Option<u32>,
    /// Pixel height, when the platform reports it
    #[serde(default)]
    pub height: Option<u32>,
}

/// Returns the highest-preference thumbnail present in `thumbnails`
pub fn best_thumbnail(thumbnails: &Thumbnails) -> Option<&Thumbnail> {
    TIER_PREFERENCE.iter().find_map(|tier| thumbnails.get(*tier))
}

/// Data structure for one uploaded video, as produced by the fetcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    /// Human-readable video title
    pub title: String,
    /// Unique video identifier
    pub video_id: String,
    /// View count, `None` when the platform withholds it
    pub views: Option<u64>,
    /// Like count, `None` when hidden
    pub like_count: Option<u64>,
    /// Dislike count, `None` when hidden
    pub dislike_count: Option<u64>,
    /// Video description text
    pub description: String,
    /// Every thumbnail tier the platform offers for this video
    pub thumbnails: Thumbnails,
}

impl VideoRecord {
    pub fn best_thumbnail(&self) -> Option<&Thumbnail> {
        best_thumbnail(&self.thumbnails)
    }
}

/// Where the stats overlay is anchored on the thumbnail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
    Center,
}

impl Position {
    pub const ALL: [Position; 9] = [
        Position::TopLeft,
        Position::TopRight,
        Position::BottomLeft,
        Position::BottomRight,
        Position::Top,
        Position::Bottom,
        Position::Left,
        Position::Right,
        Position::Center,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Position::TopLeft => "top-left",
            Position::TopRight => "top-right",
            Position::BottomLeft => "bottom-left",
            Position::BottomRight => "bottom-right",
            Position::Top => "top",
            Position::Bottom => "bottom",
            Position::Left => "left",
            Position::Right => "right",
            Position::Center => "center",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown overlay position `{0}`")]
pub struct ParsePositionError(pub String);

impl FromStr for Position {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Position::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| ParsePositionError(s.to_string()))
    }
}

/// Axis-aligned pixel rectangle; `x`/`y` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}
