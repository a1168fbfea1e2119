//! YouTube Data API v3 access: resolves the account's uploads playlist and
//! walks it page by page, attaching statistics to every video.

use std::{collections::VecDeque, time::Duration};

use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    error::FetchError,
    model::{Thumbnails, VideoRecord},
};

/// Issues GET requests against the data API and returns the JSON body
pub trait Transport {
    fn get_json(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value, FetchError>;
}

/// Bearer-authenticated blocking HTTP transport
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    api_base: String,
    access_token: String,
}

impl HttpTransport {
    pub fn new(
        api_base: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
        let url = format!("{}/{}", self.api_base, endpoint);
        tracing::debug!(%url, ?query, "API request");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(FetchError::Api { status: status.as_u16(), body });
        }
        Ok(resp.json()?)
    }
}

/// Client for the authenticated account's uploads
pub struct YouTubeClient<T> {
    transport: T,
    page_size: u32,
}

impl<T: Transport> YouTubeClient<T> {
    pub fn new(transport: T, page_size: u32) -> Self {
        Self { transport, page_size }
    }

    fn get<R: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<R, FetchError> {
        let value = self.transport.get_json(endpoint, query)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Id of the playlist holding every upload of the authenticated channel
    pub fn uploads_playlist_id(&self) -> Result<Option<String>, FetchError> {
        let resp: ChannelListResponse =
            self.get("channels", &[("mine", "true"), ("part", "contentDetails")])?;
        Ok(resp
            .items
            .into_iter()
            .next()
            .and_then(|c| c.content_details.related_playlists.uploads))
    }

    /// Lazily walks `playlist_id`; pages are requested as the iterator drains
    pub fn uploads(&self, playlist_id: &str) -> Uploads<'_, T> {
        Uploads {
            client: self,
            playlist_id: playlist_id.to_string(),
            buffered: VecDeque::new(),
            next_page: None,
            exhausted: false,
        }
    }

    /// Uploads of the authenticated account, or `None` if it has no uploads playlist
    pub fn fetch_uploads(&self) -> Result<Option<Uploads<'_, T>>, FetchError> {
        Ok(self.uploads_playlist_id()?.map(|id| {
            tracing::info!(playlist_id = %id, "listing uploads");
            self.uploads(&id)
        }))
    }

    fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemListResponse, FetchError> {
        let max_results = self.page_size.to_string();
        let mut query = vec![
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        self.get("playlistItems", &query)
    }

    /// Statistics for one video; all counts are `None` if the video is unavailable
    pub fn statistics(&self, video_id: &str) -> Result<VideoStatistics, FetchError> {
        let resp: VideoListResponse = self.get("videos", &[("part", "statistics"), ("id", video_id)])?;
        Ok(resp.items.into_iter().next().map(|v| v.statistics).unwrap_or_default())
    }

    fn resolve(&self, item: PlaylistItem) -> Result<VideoRecord, FetchError> {
        let snippet = item.snippet;
        let stats = self.statistics(&snippet.resource_id.video_id)?;
        Ok(VideoRecord {
            title: snippet.title,
            video_id: snippet.resource_id.video_id,
            views: stats.view_count,
            like_count: stats.like_count,
            dislike_count: stats.dislike_count,
            description: snippet.description,
            thumbnails: snippet.thumbnails,
        })
    }
}

/// Finite, lazily paginated sequence of uploaded videos
pub struct Uploads<'a, T> {
    client: &'a YouTubeClient<T>,
    playlist_id: String,
    buffered: VecDeque<PlaylistItem>,
    next_page: Option<String>,
    exhausted: bool,
}

impl<T: Transport> Iterator for Uploads<'_, T> {
    type Item = Result<VideoRecord, FetchError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffered.pop_front() {
                return Some(self.client.resolve(item));
            }
            if self.exhausted {
                return None;
            }
            match self.client.playlist_page(&self.playlist_id, self.next_page.as_deref()) {
                Ok(page) => {
                    tracing::debug!(items = page.items.len(), more = page.next_page_token.is_some(), "uploads page");
                    self.next_page = page.next_page_token;
                    self.exhausted = self.next_page.is_none();
                    self.buffered.extend(page.items);
                }
                Err(e) => {
                    // A broken page ends the walk; there is no token to continue from
                    self.exhausted = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Channel {
    content_details: ChannelContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemListResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    title: String,
    #[serde(default)]
    description: String,
    resource_id: ResourceId,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    #[serde(default)]
    statistics: VideoStatistics,
}

/// Counts from a video's `statistics` part; any of them may be withheld
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    #[serde(default, deserialize_with = "count")]
    pub view_count: Option<u64>,
    #[serde(default, deserialize_with = "count")]
    pub like_count: Option<u64>,
    #[serde(default, deserialize_with = "count")]
    pub dislike_count: Option<u64>,
}

/// Counts arrive as decimal strings ("1234"), occasionally as numbers
fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Text(String),
        Number(u64),
    }

    match Option::<Count>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Count::Number(n)) => Ok(Some(n)),
        Some(Count::Text(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashMap};

    use serde_json::json;

    use super::*;

    /// Canned responses keyed by endpoint plus the id/pageToken parameter
    #[derive(Default)]
    struct FakeTransport {
        responses: HashMap<String, Value>,
        failures: HashMap<String, u16>,
        requests: RefCell<Vec<String>>,
    }

    impl FakeTransport {
        fn key(endpoint: &str, query: &[(&str, &str)]) -> String {
            let detail = param(query, "pageToken").or_else(|| param(query, "id")).unwrap_or("");
            format!("{endpoint}:{detail}")
        }

        fn with(mut self, key: &str, value: Value) -> Self {
            self.responses.insert(key.to_string(), value);
            self
        }

        fn failing(mut self, key: &str, status: u16) -> Self {
            self.failures.insert(key.to_string(), status);
            self
        }
    }

    fn param<'q>(query: &[(&str, &'q str)], name: &str) -> Option<&'q str> {
        query.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
    }

    impl Transport for FakeTransport {
        fn get_json(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
            let key = Self::key(endpoint, query);
            self.requests.borrow_mut().push(key.clone());
            if let Some(status) = self.failures.get(&key) {
                return Err(FetchError::Api { status: *status, body: "boom".into() });
            }
            Ok(self.responses.get(&key).cloned().unwrap_or_else(|| json!({ "items": [] })))
        }
    }

    fn item(video_id: &str, title: &str) -> Value {
        json!({
            "snippet": {
                "title": title,
                "description": format!("about {title}"),
                "resourceId": { "kind": "youtube#video", "videoId": video_id },
                "thumbnails": {
                    "default": { "url": format!("https://i.ytimg.com/vi/{video_id}/default.jpg"), "width": 120, "height": 90 },
                    "high": { "url": format!("https://i.ytimg.com/vi/{video_id}/hqdefault.jpg"), "width": 480, "height": 360 }
                }
            }
        })
    }

    fn stats(likes: &str, dislikes: Option<&str>) -> Value {
        let mut statistics = json!({ "viewCount": "1000", "likeCount": likes });
        if let Some(d) = dislikes {
            statistics["dislikeCount"] = json!(d);
        }
        json!({ "items": [{ "statistics": statistics }] })
    }

    fn two_page_transport() -> FakeTransport {
        FakeTransport::default()
            .with(
                "channels:",
                json!({ "items": [{ "contentDetails": { "relatedPlaylists": { "uploads": "UU123" } } }] }),
            )
            .with("playlistItems:", json!({ "items": [item("a", "First"), item("b", "Second")], "nextPageToken": "P2" }))
            .with("playlistItems:P2", json!({ "items": [item("c", "Third")] }))
            .with("videos:a", stats("1500", Some("20")))
            .with("videos:b", stats("7", None))
            .with("videos:c", stats("2000000", Some("0")))
    }

    #[test]
    fn resolves_uploads_playlist() {
        let client = YouTubeClient::new(two_page_transport(), 5);
        assert_eq!(client.uploads_playlist_id().unwrap().as_deref(), Some("UU123"));
    }

    #[test]
    fn no_channel_means_no_playlist() {
        let client = YouTubeClient::new(FakeTransport::default(), 5);
        assert!(client.uploads_playlist_id().unwrap().is_none());
        assert!(client.fetch_uploads().unwrap().is_none());
    }

    #[test]
    fn walks_every_page_in_order() {
        let client = YouTubeClient::new(two_page_transport(), 2);
        let records: Vec<VideoRecord> =
            client.fetch_uploads().unwrap().unwrap().collect::<Result<_, _>>().unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r.video_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);

        let first = &records[0];
        assert_eq!(first.title, "First");
        assert_eq!(first.description, "about First");
        assert_eq!(first.views, Some(1000));
        assert_eq!(first.like_count, Some(1500));
        assert_eq!(first.dislike_count, Some(20));
        assert_eq!(first.best_thumbnail().unwrap().url, "https://i.ytimg.com/vi/a/hqdefault.jpg");

        assert_eq!(records[1].dislike_count, None);
        assert_eq!(records[2].like_count, Some(2_000_000));
    }

    #[test]
    fn pages_are_fetched_lazily() {
        let client = YouTubeClient::new(two_page_transport(), 2);
        let mut uploads = client.uploads("UU123");
        assert!(client.transport.requests.borrow().is_empty());

        uploads.next().unwrap().unwrap();
        assert_eq!(*client.transport.requests.borrow(), ["playlistItems:", "videos:a"]);

        uploads.next().unwrap().unwrap();
        uploads.next().unwrap().unwrap();
        assert!(uploads.next().is_none());
        assert!(uploads.next().is_none());
        let pages = client.transport.requests.borrow().iter().filter(|k| k.starts_with("playlistItems")).count();
        assert_eq!(pages, 2);
    }

    #[test]
    fn statistics_failure_is_local_to_its_video() {
        let transport = two_page_transport().failing("videos:b", 500);
        let client = YouTubeClient::new(transport, 2);
        let results: Vec<_> = client.uploads("UU123").collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(FetchError::Api { status: 500, .. })));
        assert_eq!(results[2].as_ref().unwrap().video_id, "c");
    }

    #[test]
    fn page_failure_ends_the_sequence() {
        let transport = two_page_transport().failing("playlistItems:P2", 403);
        let client = YouTubeClient::new(transport, 2);
        let results: Vec<_> = client.uploads("UU123").collect();

        assert_eq!(results.len(), 3);
        assert!(results[..2].iter().all(Result::is_ok));
        assert!(matches!(results[2], Err(FetchError::Api { status: 403, .. })));
    }

    #[test]
    fn unavailable_video_has_no_counts() {
        let transport = two_page_transport().with("videos:a", json!({ "items": [] }));
        let client = YouTubeClient::new(transport, 2);
        let first = client.uploads("UU123").next().unwrap().unwrap();
        assert_eq!((first.views, first.like_count, first.dislike_count), (None, None, None));
    }

    #[test]
    fn statistics_accept_strings_numbers_and_gaps() {
        let s: VideoStatistics =
            serde_json::from_value(json!({ "viewCount": "42", "likeCount": 7, "favoriteCount": "0" })).unwrap();
        assert_eq!(s, VideoStatistics { view_count: Some(42), like_count: Some(7), dislike_count: None });

        let bad = serde_json::from_value::<VideoStatistics>(json!({ "likeCount": "lots" }));
        assert!(bad.is_err());
    }

    #[test]
    fn missing_thumbnails_deserialize_empty() {
        let page: PlaylistItemListResponse = serde_json::from_value(json!({
            "items": [{ "snippet": { "title": "t", "resourceId": { "videoId": "x" } } }]
        }))
        .unwrap();
        assert!(page.items[0].snippet.thumbnails.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
