//! Published caption fetching.
//!
//! Talks to the timedtext endpoint and parses its json3 payload. A video
//! without captions is a normal miss, not an error.

use super::CaptionSegment;
use crate::error::{ArkivError, Result};
use serde::Deserialize;
use tracing::{debug, instrument};

const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

/// Caption endpoint client.
pub struct CaptionClient {
    http: reqwest::Client,
    base_url: String,
    language: String,
}

impl CaptionClient {
    pub fn new(language: &str) -> Self {
        Self::with_base_url(language, DEFAULT_BASE_URL)
    }

    /// Client against a custom base URL (useful for testing).
    pub fn with_base_url(language: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
        }
    }

    /// Fetch caption segments for a video. Returns an empty vec when the
    /// video has no published captions.
    #[instrument(skip(self))]
    pub async fn fetch(&self, video_id: &str) -> Result<Vec<CaptionSegment>> {
        let url = format!(
            "{}/api/timedtext?lang={}&v={}&fmt=json3",
            self.base_url, self.language, video_id
        );

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(ArkivError::Provider(format!(
                "Caption endpoint returned {}",
                status
            )));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            // No caption track published for this language.
            return Ok(Vec::new());
        }

        let segments = parse_json3(&body)?;
        debug!("Fetched {} caption segments for {}", segments.len(), video_id);
        Ok(segments)
    }
}

/// Parse a timedtext json3 payload into caption segments.
///
/// The payload is `{"events": [{"tStartMs": .., "dDurationMs": ..,
/// "segs": [{"utf8": ".."}]}]}`. Events without text (style/window events)
/// are skipped.
pub fn parse_json3(body: &str) -> Result<Vec<CaptionSegment>> {
    let payload: Json3Payload = serde_json::from_str(body)
        .map_err(|e| ArkivError::Provider(format!("Malformed caption payload: {}", e)))?;

    let segments = payload
        .events
        .into_iter()
        .filter_map(|event| {
            let text = event
                .segs
                .iter()
                .map(|s| s.utf8.as_str())
                .collect::<String>();
            let text = text.replace('\n', " ").trim().to_string();
            if text.is_empty() {
                return None;
            }

            let start = event.t_start_ms as f64 / 1000.0;
            let end = start + event.d_duration_ms.unwrap_or(0) as f64 / 1000.0;
            Some(CaptionSegment::new(start, end, text))
        })
        .collect();

    Ok(segments)
}

#[derive(Debug, Deserialize)]
struct Json3Payload {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    t_start_ms: u64,
    #[serde(rename = "dDurationMs")]
    d_duration_ms: Option<u64>,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json3() {
        let body = r#"{
            "events": [
                {"tStartMs": 0, "dDurationMs": 2000, "segs": [{"utf8": "hello "}, {"utf8": "there"}]},
                {"tStartMs": 2000, "dDurationMs": 1500, "segs": [{"utf8": "general\nkenobi"}]},
                {"tStartMs": 3500}
            ]
        }"#;

        let segments = parse_json3(body).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "hello there");
        assert_eq!(segments[0].start_seconds, 0.0);
        assert_eq!(segments[0].end_seconds, 2.0);
        assert_eq!(segments[1].text, "general kenobi");
        assert_eq!(segments[1].start_seconds, 2.0);
    }

    #[test]
    fn test_parse_json3_empty_events() {
        assert!(parse_json3(r#"{"events": []}"#).unwrap().is_empty());
        assert!(parse_json3(r#"{}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_json3_malformed() {
        assert!(parse_json3("<html>not json</html>").is_err());
    }
}
