//! YouTube Data API client.
//!
//! The video-listing provider: channel metadata, paginated video listing
//! with published-after filtering, and per-video duration/view-count
//! metadata.

use crate::error::{ArkivError, Result};
use crate::store::VideoMeta;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const PAGE_SIZE: usize = 50;

/// YouTube Data API v3 client.
pub struct YoutubeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: Url,
    video_id_regex: Regex,
}

/// Channel metadata from the listing provider.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub external_id: String,
    pub title: String,
}

impl YoutubeClient {
    /// Create a client with the given API key.
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom API base URL (useful for testing).
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        // Matches common YouTube URL formats and bare 11-char video ids.
        let video_id_regex = Regex::new(
            r"(?x)
            (?:
                (?:https?://)?
                (?:www\.)?
                (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex");

        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: Url::parse(base_url).expect("Invalid base URL"),
            video_id_regex,
        }
    }

    /// Extract a video id from a URL or bare id.
    pub fn extract_video_id(&self, input: &str) -> Option<String> {
        let caps = self.video_id_regex.captures(input.trim())?;
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!("{}/{}", self.base_url.path().trim_end_matches('/'), path))
            .map_err(|e| ArkivError::Provider(format!("Bad API URL: {}", e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", &self.api_key);
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ArkivError::NotFound("Resource not found upstream".into()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArkivError::Provider(format!(
                "Listing API returned {}: {}",
                status,
                body.chars().take(300).collect::<String>()
            )));
        }

        Ok(response.json::<T>().await?)
    }

    /// Fetch channel metadata.
    #[instrument(skip(self))]
    pub async fn fetch_channel(&self, channel_id: &str) -> Result<ChannelInfo> {
        let url = self.endpoint("channels", &[("part", "snippet"), ("id", channel_id)])?;
        let response: ListResponse<ChannelResource> = self.get_json(url).await?;

        let channel = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| ArkivError::NotFound(format!("Channel not found: {}", channel_id)))?;

        Ok(ChannelInfo {
            external_id: channel.id,
            title: channel.snippet.title.unwrap_or_else(|| "Unknown Channel".to_string()),
        })
    }

    /// Fetch full metadata for one video.
    #[instrument(skip(self))]
    pub async fn fetch_video(&self, video_id: &str) -> Result<VideoMeta> {
        let mut videos = self.fetch_video_details(&[video_id.to_string()]).await?;
        videos
            .pop()
            .ok_or_else(|| ArkivError::NotFound(format!("Video not found: {}", video_id)))
    }

    /// Channel id a video belongs to, with the channel title.
    #[instrument(skip(self))]
    pub async fn fetch_video_channel(&self, video_id: &str) -> Result<ChannelInfo> {
        let url = self.endpoint("videos", &[("part", "snippet"), ("id", video_id)])?;
        let response: ListResponse<VideoResource> = self.get_json(url).await?;

        let video = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| ArkivError::NotFound(format!("Video not found: {}", video_id)))?;

        match (video.snippet.channel_id, video.snippet.channel_title) {
            (Some(id), title) => Ok(ChannelInfo {
                external_id: id,
                title: title.unwrap_or_else(|| "Unknown Channel".to_string()),
            }),
            _ => Err(ArkivError::NotFound(format!(
                "No channel recorded for video {}",
                video_id
            ))),
        }
    }

    /// List a channel's videos published after the given instant, newest
    /// pages first, paging through the API up to `max_videos`.
    #[instrument(skip(self))]
    pub async fn list_videos_since(
        &self,
        channel_id: &str,
        published_after: DateTime<Utc>,
        max_videos: Option<usize>,
    ) -> Result<Vec<VideoMeta>> {
        let after = published_after.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let mut ids: Vec<String> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page_size = PAGE_SIZE.to_string();
            let mut params = vec![
                ("part", "id"),
                ("type", "video"),
                ("order", "date"),
                ("channelId", channel_id),
                ("publishedAfter", after.as_str()),
                ("maxResults", page_size.as_str()),
            ];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.as_str()));
            }

            let url = self.endpoint("search", &params)?;
            let response: ListResponse<SearchResource> = self.get_json(url).await?;

            for item in response.items {
                if let Some(id) = item.id.video_id {
                    ids.push(id);
                }
            }

            if let Some(cap) = max_videos {
                if ids.len() >= cap {
                    ids.truncate(cap);
                    break;
                }
            }

            match response.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Listed {} videos for channel {}", ids.len(), channel_id);

        // The search endpoint has no durations or view counts; resolve the
        // full metadata in batches.
        let mut videos = Vec::with_capacity(ids.len());
        for batch in ids.chunks(PAGE_SIZE) {
            videos.extend(self.fetch_video_details(batch).await?);
        }
        Ok(videos)
    }

    async fn fetch_video_details(&self, ids: &[String]) -> Result<Vec<VideoMeta>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = ids.join(",");
        let url = self.endpoint(
            "videos",
            &[
                ("part", "snippet,contentDetails,statistics"),
                ("id", joined.as_str()),
            ],
        )?;
        let response: ListResponse<VideoResource> = self.get_json(url).await?;

        Ok(response
            .items
            .into_iter()
            .map(|v| VideoMeta {
                external_id: v.id,
                title: v
                    .snippet
                    .title
                    .unwrap_or_else(|| "Unknown Title".to_string()),
                description: v.snippet.description,
                published_at: v.snippet.published_at.and_then(|s| {
                    DateTime::parse_from_rfc3339(&s)
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc))
                }),
                duration_seconds: v
                    .content_details
                    .and_then(|c| c.duration)
                    .and_then(|d| parse_iso8601_duration(&d)),
                view_count: v
                    .statistics
                    .and_then(|s| s.view_count)
                    .and_then(|c| c.parse().ok()),
            })
            .collect())
    }
}

/// Parse an ISO-8601 duration like `PT1H2M3S` into seconds.
pub fn parse_iso8601_duration(input: &str) -> Option<u32> {
    let rest = input.strip_prefix("PT").or_else(|| input.strip_prefix("P"))?;

    let mut seconds = 0u32;
    let mut number = String::new();
    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            number.push(ch);
            continue;
        }
        let value: u32 = number.parse().ok()?;
        number.clear();
        match ch {
            'D' => seconds += value * 86_400,
            'H' => seconds += value * 3_600,
            'M' => seconds += value * 60,
            'S' => seconds += value,
            'T' => return None,
            _ => return None,
        }
    }

    if number.is_empty() {
        Some(seconds)
    } else {
        None
    }
}

// === API response shapes ===

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default)]
    items: Vec<T>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelResource {
    id: String,
    snippet: Snippet,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResource {
    id: SearchId,
}

#[derive(Debug, Default, Deserialize)]
struct SearchId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct VideoResource {
    id: String,
    snippet: Snippet,
    #[serde(rename = "contentDetails")]
    content_details: Option<ContentDetails>,
    statistics: Option<Statistics>,
}

#[derive(Debug, Default, Deserialize)]
struct Snippet {
    title: Option<String>,
    description: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    #[serde(rename = "channelId")]
    channel_id: Option<String>,
    #[serde(rename = "channelTitle")]
    channel_title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Statistics {
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso8601_duration() {
        assert_eq!(parse_iso8601_duration("PT15S"), Some(15));
        assert_eq!(parse_iso8601_duration("PT4M13S"), Some(253));
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), Some(3723));
        assert_eq!(parse_iso8601_duration("P1DT2H"), None); // T inside is unsupported
        assert_eq!(parse_iso8601_duration("PT"), Some(0));
        assert_eq!(parse_iso8601_duration("garbage"), None);
    }

    #[test]
    fn test_extract_video_id() {
        let client = YoutubeClient::new("test-key");

        assert_eq!(
            client.extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            client.extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            client.extract_video_id("dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(client.extract_video_id("not-a-video-id"), None);
    }

    #[test]
    fn test_list_response_parses() {
        let json = r#"{
            "nextPageToken": "abc",
            "items": [{"id": {"videoId": "dQw4w9WgXcQ"}}]
        }"#;
        let parsed: ListResponse<SearchResource> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.next_page_token.as_deref(), Some("abc"));
        assert_eq!(parsed.items[0].id.video_id.as_deref(), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_video_resource_parses() {
        let json = r#"{
            "id": "abc12345678",
            "snippet": {
                "title": "A Video",
                "description": "About things",
                "publishedAt": "2024-05-01T12:00:00Z",
                "channelId": "UC123",
                "channelTitle": "Some Channel"
            },
            "contentDetails": {"duration": "PT10M1S"},
            "statistics": {"viewCount": "12345"}
        }"#;
        let parsed: VideoResource = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.content_details.unwrap().duration.unwrap(), "PT10M1S");
        assert_eq!(parsed.statistics.unwrap().view_count.unwrap(), "12345");
    }
}
