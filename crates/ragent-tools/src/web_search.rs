//! Web search: the [`WebSearchProvider`] capability, a DuckDuckGo HTML
//! scraper implementing it, and the [`WebSearchTool`] that formats results
//! for the model.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ragent_core::{RagError, RagResult, ToolOutput};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::format::{truncate_chars, MAX_TOOL_OUTPUT_CHARS};

/// Returned when a search produced nothing.
pub const NO_WEB_RESULTS: &str = "No relevant web results found.";

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// An external web-search capability.
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    /// Up to `max_results` hits, best first.
    async fn search(&self, query: &str, max_results: usize) -> RagResult<Vec<WebHit>>;

    /// Provider name, for logs.
    fn name(&self) -> &str;
}

/// Web search settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearchConfig {
    pub max_results: usize,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            base_url: "https://html.duckduckgo.com".to_string(),
            timeout_secs: 10,
        }
    }
}

impl WebSearchConfig {
    pub fn validate(&self) -> RagResult<()> {
        if self.max_results == 0 {
            return Err(RagError::Config(
                "web_search.max_results must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Scrapes the DuckDuckGo HTML endpoint (no API key).
pub struct DuckDuckGoSearch {
    base_url: String,
    http: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new(config: &WebSearchConfig) -> RagResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ragent/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RagError::WebSearch(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl WebSearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> RagResult<Vec<WebHit>> {
        let url = format!("{}/html/", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| RagError::WebSearch(format!("Search request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RagError::WebSearch(format!(
                "Search returned HTTP {status}"
            )));
        }

        let html = resp
            .text()
            .await
            .map_err(|e| RagError::WebSearch(format!("Failed to read search page: {e}")))?;
        let hits = parse_ddg_results(&html, max_results);
        debug!(query, hits = hits.len(), "DuckDuckGo search");
        Ok(hits)
    }

    fn name(&self) -> &str {
        "duckduckgo"
    }
}

/// Pull result titles, links, and snippets out of a DuckDuckGo HTML page.
pub fn parse_ddg_results(html: &str, max: usize) -> Vec<WebHit> {
    let mut results = Vec::new();

    for segment in html.split("class=\"result__a\"").skip(1) {
        if results.len() == max {
            break;
        }
        let title = extract_between(segment, ">", "</a>")
            .map(|t| clean_text(&t))
            .unwrap_or_default();
        let url = extract_between(segment, "href=\"", "\"")
            .map(|href| resolve_link(&href))
            .unwrap_or_default();
        let snippet = segment
            .split("class=\"result__snippet\"")
            .nth(1)
            .and_then(|s| extract_between(s, ">", "</a>"))
            .map(|s| clean_text(&s))
            .unwrap_or_default();

        if !title.is_empty() {
            results.push(WebHit {
                title,
                url,
                snippet,
            });
        }
    }
    results
}

fn extract_between(text: &str, start: &str, end: &str) -> Option<String> {
    let start_idx = text.find(start)? + start.len();
    let remaining = &text[start_idx..];
    let end_idx = remaining.find(end)?;
    Some(remaining[..end_idx].to_string())
}

/// Drop inline tags and decode the handful of entities DuckDuckGo emits.
fn clean_text(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Result links are redirects (`//duckduckgo.com/l/?uddg=<target>`); return the target.
fn resolve_link(href: &str) -> String {
    let href = href.replace("&amp;", "&");
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.clone()
    };
    reqwest::Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, target)| target.into_owned())
        })
        .unwrap_or(href)
}

/// Formats web hits for the model.
pub struct WebSearchTool {
    provider: Arc<dyn WebSearchProvider>,
    max_results: usize,
    max_chars: usize,
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn WebSearchProvider>, max_results: usize) -> Self {
        Self {
            provider,
            max_results,
            max_chars: MAX_TOOL_OUTPUT_CHARS,
        }
    }

    /// Override the output cap.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub async fn run(&self, query: &str) -> RagResult<ToolOutput> {
        let hits = self.provider.search(query, self.max_results).await?;
        debug!(
            provider = self.provider.name(),
            hits = hits.len(),
            "Web search tool output"
        );
        Ok(truncate_chars(&format_web_hits(&hits), self.max_chars))
    }
}

/// `- title\n  url\n  snippet` blocks separated by a blank line.
pub fn format_web_hits(hits: &[WebHit]) -> String {
    if hits.is_empty() {
        return NO_WEB_RESULTS.to_string();
    }
    hits.iter()
        .map(|hit| format!("- {}\n  {}\n  {}", hit.title, hit.url, hit.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}
