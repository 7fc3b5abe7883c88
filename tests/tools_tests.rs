//! Web tools against mock HTTP servers.

use crew_memory::tools::search::{ScrapeWebsiteTool, SearchTool};
use crew_memory::tools::Tool;
use crew_memory::types::AppError;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============= web_search =============

#[tokio::test]
async fn test_search_maps_organic_results() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("X-API-KEY", "serper-key"))
        .and(body_json(json!({ "q": "zep memory", "num": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic": [
                { "title": "Zep", "link": "https://getzep.com", "snippet": "Memory for agents" },
                { "title": "Docs", "link": "https://help.getzep.com", "snippet": "Guides" },
                { "title": "Extra", "link": "https://example.com", "snippet": "Dropped" }
            ],
            "answerBox": { "answer": "A memory layer" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tool = SearchTool::with_base_url(Some("serper-key".to_string()), server.uri());
    let result = tool
        .execute(json!({ "query": "zep memory", "num_results": 2 }))
        .await
        .unwrap();

    assert_eq!(result["query"], "zep memory");
    assert_eq!(result["count"], 2);
    assert_eq!(result["results"][0]["url"], "https://getzep.com");
    assert_eq!(result["results"][1]["snippet"], "Guides");
    assert!(result["results"][1].get("description").is_none());
    assert_eq!(result["answer"]["answer"], "A memory layer");
}

#[tokio::test]
async fn test_search_without_answer_box() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "organic": [] })))
        .mount(&server)
        .await;

    let tool = SearchTool::with_base_url(Some("k".to_string()), server.uri());
    let result = tool.execute(json!({ "query": "nothing" })).await.unwrap();

    assert_eq!(result["count"], 0);
    assert!(result.get("answer").is_none());
}

#[tokio::test]
async fn test_search_error_status_is_tool_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Unauthorized."))
        .mount(&server)
        .await;

    let tool = SearchTool::with_base_url(Some("bad".to_string()), server.uri());
    let err = tool.execute(json!({ "query": "x" })).await.unwrap_err();

    assert!(matches!(&err, AppError::Tool(msg) if msg.contains("403")));
}

#[tokio::test]
async fn test_search_without_key_never_calls_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let tool = SearchTool::with_base_url(None, server.uri());
    let err = tool.execute(json!({ "query": "x" })).await.unwrap_err();

    assert!(err.to_string().contains("SERPER_API_KEY"));
}

// ============= scrape_website =============

const PAGE: &str = r#"<!doctype html>
<html>
  <head>
    <title>Agent Memory</title>
    <style>body { color: red; }</style>
    <script>var tracking = true;</script>
  </head>
  <body>
    <h1>Long-term memory</h1>
    <p>Agents remember   facts across sessions.</p>
    <noscript>Enable JavaScript</noscript>
  </body>
</html>"#;

#[tokio::test]
async fn test_scrape_extracts_visible_text() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PAGE, "text/html"))
        .mount(&server)
        .await;

    let url = format!("{}/article", server.uri());
    let result = ScrapeWebsiteTool::new()
        .execute(json!({ "url": url }))
        .await
        .unwrap();

    assert_eq!(result["url"], url);
    assert_eq!(result["title"], "Agent Memory");
    let content = result["content"].as_str().unwrap();
    assert!(content.contains("Long-term memory"));
    assert!(content.contains("Agents remember facts across sessions."));
    assert!(!content.contains("tracking"));
    assert!(!content.contains("color"));
    assert!(!content.contains("Enable JavaScript"));
    assert_eq!(result["truncated"], false);
}

#[tokio::test]
async fn test_scrape_truncates_long_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PAGE, "text/html"))
        .mount(&server)
        .await;

    let result = ScrapeWebsiteTool::new()
        .with_max_chars(10)
        .execute(json!({ "url": format!("{}/article", server.uri()) }))
        .await
        .unwrap();

    assert_eq!(result["truncated"], true);
    assert!(result["content"].as_str().unwrap().chars().count() <= 10);
    assert!(result["word_count"].as_u64().unwrap() > 2);
}

#[tokio::test]
async fn test_scrape_missing_page_is_tool_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = ScrapeWebsiteTool::new()
        .execute(json!({ "url": format!("{}/gone", server.uri()) }))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Tool(_)));
}
