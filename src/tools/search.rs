//! Web tools crews can call
//!
//! - `web_search` queries Google through the Serper API.
//! - `scrape_website` downloads a page and reduces it to readable text.

use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::{json, Value};

pub const SERPER_API_URL: &str = "https://google.serper.dev";

const DEFAULT_NUM_RESULTS: u64 = 10;

/// Longest page text returned by `scrape_website`, in characters.
pub const MAX_SCRAPED_CHARS: usize = 8_000;

/// Web search tool backed by Serper
pub struct SearchTool {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl SearchTool {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, SERPER_API_URL)
    }

    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
    #[serde(default, rename = "answerBox")]
    answer_box: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the internet with Google and return the top results (title, url, snippet)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default: 10)",
                    "default": 10
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| AppError::InvalidInput("Missing 'query' parameter".to_string()))?;

        let num_results = args
            .get("num_results")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_NUM_RESULTS)
            .clamp(1, 100);

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Tool("SERPER_API_KEY is not set".to_string()))?;

        let response = self
            .http
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", api_key)
            .json(&json!({ "q": query, "num": num_results }))
            .send()
            .await
            .map_err(|e| AppError::Tool(format!("Search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Tool(format!(
                "Search failed ({}): {}",
                status, text
            )));
        }

        let body: SerperResponse = response
            .json()
            .await
            .map_err(|e| AppError::Tool(format!("Failed to parse search response: {}", e)))?;

        let results: Vec<Value> = body
            .organic
            .iter()
            .take(num_results as usize)
            .map(|r| {
                json!({
                    "title": r.title,
                    "url": r.link,
                    "snippet": r.snippet
                })
            })
            .collect();

        let mut output = json!({
            "query": query,
            "results": results,
            "count": results.len()
        });
        if let Some(answer) = body.answer_box {
            output["answer"] = answer;
        }
        Ok(output)
    }
}

/// Page scraping tool: fetches a URL and extracts its visible text
pub struct ScrapeWebsiteTool {
    http: reqwest::Client,
    max_chars: usize,
}

impl ScrapeWebsiteTool {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            max_chars: MAX_SCRAPED_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }
}

impl Default for ScrapeWebsiteTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ScrapeWebsiteTool {
    fn name(&self) -> &str {
        "scrape_website"
    }

    fn description(&self) -> &str {
        "Read a website and return its title and text content"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL of the page to read"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let url = args
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'url' parameter".to_string()))?;

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::InvalidInput(format!(
                "Only http(s) URLs can be scraped: {}",
                url
            )));
        }

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Tool(format!("Failed to fetch page: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Tool(format!(
                "Failed to fetch page ({}): {}",
                response.status(),
                url
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| AppError::Tool(format!("Failed to read page body: {}", e)))?;

        let page = extract_page(&html)?;
        let (content, truncated) = truncate_chars(&page.text, self.max_chars);

        Ok(json!({
            "url": url,
            "title": page.title,
            "content": content,
            "truncated": truncated,
            "word_count": page.text.split_whitespace().count()
        }))
    }
}

#[derive(Debug, PartialEq)]
struct PageText {
    title: Option<String>,
    text: String,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::Internal(format!("Bad selector '{}': {}", css, e)))
}

/// Title and whitespace-collapsed body text, skipping script and style content.
fn extract_page(html: &str) -> Result<PageText> {
    let document = Html::parse_document(html);

    let title = document
        .select(&selector("title")?)
        .next()
        .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    let skip = selector("script, style, noscript")?;
    let hidden: Vec<_> = document.select(&skip).map(|e| e.id()).collect();

    let mut text = String::new();
    if let Some(body) = document.select(&selector("body")?).next() {
        for node in body.descendants() {
            let Some(chunk) = node.value().as_text() else {
                continue;
            };
            let in_hidden = node.ancestors().any(|a| hidden.contains(&a.id()));
            if !in_hidden {
                text.push_str(chunk);
                text.push(' ');
            }
        }
    }

    Ok(PageText {
        title,
        text: collapse_whitespace(&text),
    })
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> (String, bool) {
    match s.char_indices().nth(max) {
        Some((idx, _)) => (s[..idx].to_string(), true),
        None => (s.to_string(), false),
    }
}
