//! Blocklist feed client
//!
//! Fetches `{base_url}/lists/{feed}.txt` and reduces the body to one address
//! per entry. Every fetch is followed by a fixed pause, successful or not.

use crate::config::FeedSettings;
use crate::error::{IngestError, Result};
use blocklist_common::types::FeedId;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

/// User agent sent with every feed request.
pub const USER_AGENT: &str = concat!("blocklist-ingest/", env!("CARGO_PKG_VERSION"));

/// Number of entries shown by [`FeedClient::probe`].
pub const PROBE_SAMPLE_SIZE: usize = 5;

/// Keep the entries of a feed body: lines are trimmed, blank lines and
/// `#` comments dropped, order preserved. Addresses are not validated.
///
/// Comment detection runs on the trimmed line, so an indented `  # note`
/// is dropped as a comment rather than kept as an entry.
///
/// ```
/// use blocklist_ingest::feed::parse_feed_lines;
///
/// let lines = parse_feed_lines("1.2.3.4\n\n# comment\n5.6.7.8  \n");
/// assert_eq!(lines, vec!["1.2.3.4", "5.6.7.8"]);
/// ```
pub fn parse_feed_lines(body: &str) -> Vec<String> {
    body.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Result of a connectivity probe against one feed
#[derive(Debug, Clone, Serialize)]
pub struct FeedProbe {
    pub url: String,
    pub entries: usize,
    pub sample: Vec<String>,
}

/// HTTP client for blocklist feeds
pub struct FeedClient {
    client: Client,
    settings: FeedSettings,
}

impl FeedClient {
    pub fn new(settings: FeedSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, settings })
    }

    /// URL the given feed is fetched from; also stored as each document's origin.
    pub fn feed_url(&self, feed: &FeedId) -> String {
        format!(
            "{}/lists/{}.txt",
            self.settings.base_url.trim_end_matches('/'),
            feed
        )
    }

    /// Fetch one feed and return its entries.
    ///
    /// Non-success statuses and transport errors are returned as errors. The
    /// configured delay is applied after the request either way.
    pub async fn fetch(&self, feed: &FeedId) -> Result<Vec<String>> {
        let url = self.feed_url(feed);
        info!(feed = %feed, url = %url, "Fetching feed");

        let result = self.download_with_retry(&url).await.map(|body| {
            let entries = parse_feed_lines(&body);
            info!(feed = %feed, count = entries.len(), "Fetched feed entries");
            entries
        });

        let delay = self.settings.delay();
        if !delay.is_zero() {
            debug!(delay_secs = delay.as_secs(), "Rate limit pause");
            tokio::time::sleep(delay).await;
        }

        result
    }

    /// Fetch a feed and report how many entries it holds plus the first few.
    pub async fn probe(&self, feed: &FeedId) -> Result<FeedProbe> {
        let url = self.feed_url(feed);
        let body = self.download_with_retry(&url).await?;
        let entries = parse_feed_lines(&body);

        Ok(FeedProbe {
            url,
            entries: entries.len(),
            sample: entries.into_iter().take(PROBE_SAMPLE_SIZE).collect(),
        })
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    async fn download_with_retry(&self, url: &str) -> Result<String> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.download(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < max_attempts => {
                    let backoff = self.settings.retry_backoff(attempt);
                    warn!(
                        url = %url,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Feed download failed, retrying in {:?}",
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                },
                Err(e) => return Err(e),
            }
        }
    }

    async fn download(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::IngestConfig;
    use proptest::prelude::*;

    #[test]
    fn test_parse_feed_lines_example() {
        assert_eq!(
            parse_feed_lines("1.2.3.4\n\n# comment\n5.6.7.8  \n"),
            vec!["1.2.3.4", "5.6.7.8"]
        );
    }

    #[test]
    fn test_parse_feed_lines_crlf_and_indented_comment() {
        let body = "# blocklist.de ssh\r\n  2001:db8::1\r\n   # indented note\r\n\t10.0.0.1\t\r\n";
        assert_eq!(parse_feed_lines(body), vec!["2001:db8::1", "10.0.0.1"]);
    }

    #[test]
    fn test_parse_feed_lines_keeps_invalid_addresses() {
        assert_eq!(parse_feed_lines("not-an-ip\n999.1.1.1"), vec!["not-an-ip", "999.1.1.1"]);
    }

    #[test]
    fn test_parse_feed_lines_empty_body() {
        assert!(parse_feed_lines("").is_empty());
        assert!(parse_feed_lines("\n\n# only comments\n").is_empty());
    }

    #[test]
    fn test_feed_url() {
        let client = FeedClient::new(IngestConfig::default().feed).unwrap();
        let ssh = FeedId::new("ssh").unwrap();
        assert_eq!(client.feed_url(&ssh), "https://lists.blocklist.de/lists/ssh.txt");

        let trailing = IngestConfig::builder()
            .feed_base_url("http://127.0.0.1:8080/")
            .build();
        let client = FeedClient::new(trailing.feed).unwrap();
        assert_eq!(client.feed_url(&ssh), "http://127.0.0.1:8080/lists/ssh.txt");
    }

    fn feed_line() -> impl Strategy<Value = String> {
        prop_oneof![
            "[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}",
            "[0-9a-f]{1,4}(:[0-9a-f]{1,4}){1,7}",
            "#[ a-z0-9]{0,12}",
            Just(String::new()),
        ]
    }

    proptest! {
        #[test]
        fn prop_keeps_exactly_entry_lines_in_order(
            lines in prop::collection::vec((feed_line(), "[ \t]{0,2}", "[ \t\r]{0,2}"), 0..40)
        ) {
            let body = lines
                .iter()
                .map(|(line, lead, trail)| format!("{lead}{line}{trail}"))
                .collect::<Vec<_>>()
                .join("\n");

            let expected: Vec<String> = lines
                .iter()
                .map(|(line, _, _)| line.clone())
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .collect();

            prop_assert_eq!(parse_feed_lines(&body), expected);
        }
    }
}
