//! Search URLs and first-result extraction
//!
//! Builds Google/YouTube search URLs and pulls the first organic result out
//! of a fetched results page.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::{Error, Result};

/// User agent sent when fetching result pages
const USER_AGENT: &str = "Mozilla/5.0";

const GOOGLE_SEARCH: &str = "https://www.google.com/search?q=";
const YOUTUBE_SEARCH: &str = "https://www.youtube.com/results?search_query=";
const YOUTUBE_BASE: &str = "https://www.youtube.com";

/// Video links embedded in script data rather than anchors
static WATCH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/watch\?v=[A-Za-z0-9_-]{6,}").expect("valid regex"));

/// Web search URL for a query
#[must_use]
pub fn google_search_url(query: &str) -> String {
    format!("{GOOGLE_SEARCH}{}", plus_encode(query))
}

/// Video search URL for a query
#[must_use]
pub fn youtube_search_url(query: &str) -> String {
    format!("{YOUTUBE_SEARCH}{}", plus_encode(query))
}

/// Encode words individually and join them with `+`
fn plus_encode(query: &str) -> String {
    query
        .split_whitespace()
        .map(|word| urlencoding::encode(word).into_owned())
        .collect::<Vec<_>>()
        .join("+")
}

/// First organic result on a Google results page
#[must_use]
pub fn extract_first_google_result(html: &str) -> Option<String> {
    first_href(html, |href| href.starts_with("/url?q=")).map(|href| {
        let target = href
            .trim_start_matches("/url?q=")
            .split('&')
            .next()
            .unwrap_or_default();
        urlencoding::decode(target).map_or_else(|_| target.to_string(), |s| s.into_owned())
    })
}

/// First video on a YouTube results page
#[must_use]
pub fn extract_first_youtube_video(html: &str) -> Option<String> {
    first_href(html, |href| href.starts_with("/watch"))
        .or_else(|| WATCH_REGEX.find(html).map(|m| m.as_str().to_string()))
        .map(|path| format!("{YOUTUBE_BASE}{path}"))
}

fn first_href(html: &str, accept: impl Fn(&str) -> bool) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").ok()?;

    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .find(|href| accept(*href))
        .map(String::from)
}

/// Looks up the first result behind a search URL
#[async_trait]
pub trait ResultFinder: Send + Sync {
    /// First organic link of a web search results page
    async fn first_web_result(&self, search_url: &str) -> Result<Option<String>>;

    /// First video link of a video search results page
    async fn first_video(&self, search_url: &str) -> Result<Option<String>>;
}

/// Fetches result pages over HTTP
pub struct HttpResultFinder {
    client: Client,
}

impl HttpResultFinder {
    /// Create a finder with the given request timeout
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "falling back to default HTTP client");
                Client::new()
            });
        Self { client }
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Scrape(format!("failed to fetch results: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Scrape(format!("HTTP error: {}", response.status())));
        }

        response
            .text()
            .await
            .map_err(|e| Error::Scrape(format!("failed to read results: {e}")))
    }
}

impl Default for HttpResultFinder {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl std::fmt::Debug for HttpResultFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResultFinder").finish_non_exhaustive()
    }
}

#[async_trait]
impl ResultFinder for HttpResultFinder {
    async fn first_web_result(&self, search_url: &str) -> Result<Option<String>> {
        let html = self.fetch(search_url).await?;
        Ok(extract_first_google_result(&html))
    }

    async fn first_video(&self, search_url: &str) -> Result<Option<String>> {
        let html = self.fetch(search_url).await?;
        Ok(extract_first_youtube_video(&html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_urls() {
        assert_eq!(
            google_search_url("cats and dogs"),
            "https://www.google.com/search?q=cats+and+dogs"
        );
        assert_eq!(
            youtube_search_url("lofi  beats"),
            "https://www.youtube.com/results?search_query=lofi+beats"
        );
        assert_eq!(google_search_url("c++ & rust"), "https://www.google.com/search?q=c%2B%2B+%26+rust");
    }

    #[test]
    fn test_first_google_result() {
        let html = r#"
            <a href="/search?q=cats&tbm=isch">Images</a>
            <a href="/url?q=https://en.wikipedia.org/wiki/Cat%3Fx&sa=U&ved=abc">Cat</a>
            <a href="/url?q=https://example.com&sa=U">Second</a>
        "#;
        assert_eq!(
            extract_first_google_result(html),
            Some("https://en.wikipedia.org/wiki/Cat?x".to_string())
        );
        assert_eq!(extract_first_google_result("<p>nothing</p>"), None);
    }

    #[test]
    fn test_first_youtube_video_from_anchor() {
        let html = r#"<a href="/feed">Feed</a><a href="/watch?v=abc123XYZ">Video</a>"#;
        assert_eq!(
            extract_first_youtube_video(html),
            Some("https://www.youtube.com/watch?v=abc123XYZ".to_string())
        );
    }

    #[test]
    fn test_first_youtube_video_from_script_data() {
        let html = r#"<script>var ytInitialData = {"url":"/watch?v=dQw4w9WgXcQ"};</script>"#;
        assert_eq!(
            extract_first_youtube_video(html),
            Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string())
        );
        assert_eq!(extract_first_youtube_video("<html></html>"), None);
    }
}
