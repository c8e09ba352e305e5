use super::domain::Domain;
use crate::config::Config;
use futures::{stream, StreamExt};
use reqwest::Client;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::io::StreamReader;
use tracing::{error, info, warn};

/// Shipped as a last resort so the engine never starts with zero static
/// coverage.
const FALLBACK_TRACKERS: [&str; 6] = [
    "doubleclick.net",
    "google-analytics.com",
    "facebook.net",
    "adservice.google.com",
    "googlesyndication.com",
    "scorecardresearch.com",
];

/// JSON list shape: `{"trackers": ["doubleclick.net", ...]}`.
#[derive(Deserialize)]
struct JsonList {
    trackers: Vec<String>,
}

/// Loads the static tracker list once at startup. Sources are named file
/// paths or http(s) URLs; `.json` sources use the JSON shape, everything
/// else is one domain per line with `#` comments.
pub struct StaticListLoader {
    config: Config,
    client: Client,
}

impl StaticListLoader {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            client: Client::builder()
                .user_agent("trackstop/0.1")
                .build()
                .unwrap(),
        }
    }

    fn parse_line(line: &str) -> Option<Domain> {
        let line = line.trim();
        // Skip comments and empty lines
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        Domain::parse(line).ok()
    }

    fn parse_json(name: &str, text: &str) -> Vec<Domain> {
        match serde_json::from_str::<JsonList>(text) {
            Ok(list) => list
                .trackers
                .iter()
                .filter_map(|entry| Domain::parse(entry).ok())
                .collect(),
            Err(e) => {
                error!("Failed to parse JSON list '{}': {}", name, e);
                vec![]
            }
        }
    }

    async fn fetch_url(client: &Client, name: String, url: String) -> Vec<Domain> {
        info!("Fetching tracker list '{}' from {}", name, url);
        let resp = match client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                error!("Failed to fetch {}: {}", url, e);
                return vec![];
            }
        };

        if url.ends_with(".json") {
            return match resp.text().await {
                Ok(text) => Self::parse_json(&name, &text),
                Err(e) => {
                    error!("Failed to read {}: {}", url, e);
                    vec![]
                }
            };
        }

        let stream = resp
            .bytes_stream()
            .map(|result| result.map_err(std::io::Error::other));
        let reader = StreamReader::new(stream);
        let mut lines = BufReader::new(reader).lines();
        let mut entries = Vec::new();

        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(domain) = Self::parse_line(&line) {
                entries.push(domain);
            }
        }

        info!("Parsed {} entries from '{}'", entries.len(), name);
        entries
    }

    async fn read_file(name: String, path: String) -> Vec<Domain> {
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to read list file {}: {}", path, e);
                return vec![];
            }
        };

        let entries = if path.ends_with(".json") {
            Self::parse_json(&name, &text)
        } else {
            text.lines().filter_map(Self::parse_line).collect()
        };

        info!("Parsed {} entries from '{}'", entries.len(), name);
        entries
    }

    /// Loads all configured sources concurrently and unions the results.
    /// When nothing usable loads, the built-in fallback set is substituted.
    pub async fn load(&self) -> FxHashSet<Domain> {
        let sources = self.config.get_sources_sorted();
        if sources.is_empty() {
            warn!("No static list sources configured, using built-in fallback");
            return Self::fallback();
        }

        let client = self.client.clone();
        let tasks = sources.into_iter().map(|(name, location)| {
            let client = client.clone();
            async move {
                if location.starts_with("http://") || location.starts_with("https://") {
                    Self::fetch_url(&client, name, location).await
                } else {
                    Self::read_file(name, location).await
                }
            }
        });

        let results: Vec<Vec<Domain>> = stream::iter(tasks)
            .buffer_unordered(self.config.lists.concurrent_downloads)
            .collect()
            .await;

        let set: FxHashSet<Domain> = results.into_iter().flatten().collect();
        if set.is_empty() {
            error!("Every static list source failed, using built-in fallback");
            return Self::fallback();
        }

        info!("Static blocklist loaded: {} distinct domains", set.len());
        set
    }

    pub fn fallback() -> FxHashSet<Domain> {
        FALLBACK_TRACKERS
            .iter()
            .filter_map(|d| Domain::parse(d).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_line_skips_comments_and_junk() {
        assert_eq!(StaticListLoader::parse_line("# comment"), None);
        assert_eq!(StaticListLoader::parse_line("   "), None);
        assert_eq!(StaticListLoader::parse_line("not a domain"), None);
        assert_eq!(
            StaticListLoader::parse_line("  Ads.Example  ").unwrap().as_str(),
            "ads.example"
        );
    }

    #[test]
    fn test_parse_json_list() {
        let text = r#"{"trackers": ["doubleclick.net", "bad entry", "Google-Analytics.com"]}"#;
        let entries = StaticListLoader::parse_json("test", text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].as_str(), "doubleclick.net");
        assert_eq!(entries[1].as_str(), "google-analytics.com");

        assert!(StaticListLoader::parse_json("test", "{ nope").is_empty());
    }

    #[test]
    fn test_fallback_never_empty() {
        let fallback = StaticListLoader::fallback();
        assert_eq!(fallback.len(), FALLBACK_TRACKERS.len());
        assert!(fallback.contains("doubleclick.net"));
    }

    #[tokio::test]
    async fn test_load_from_line_format_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# tracker list").unwrap();
        writeln!(file, "ads.example").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "pixel.example").unwrap();

        let mut config = Config::default();
        config.lists.sources.insert(
            "local".to_string(),
            file.path().to_string_lossy().into_owned(),
        );

        let set = StaticListLoader::new(config).load().await;
        assert_eq!(set.len(), 2);
        assert!(set.contains("ads.example"));
        assert!(set.contains("pixel.example"));
    }

    #[tokio::test]
    async fn test_load_falls_back_when_all_sources_fail() {
        let mut config = Config::default();
        config
            .lists
            .sources
            .insert("missing".to_string(), "/no/such/file.txt".to_string());

        let set = StaticListLoader::new(config).load().await;
        assert_eq!(set, StaticListLoader::fallback());
    }
}
