use super::{
    GraphSearchQuery, GraphSearchResults, MemoryError, MemoryMessage, MemoryResult, MemorySession,
    MemoryStore, MemoryUser,
};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

/// Zep Cloud v2 REST client.
pub struct ZepClient {
    http: reqwest::Client,
    api_key: String,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default, deserialize_with = "super::null_as_default")]
    messages: Vec<MemoryMessage>,
}

impl ZepClient {
    pub fn new(api_key: impl Into<String>, base_url: &str) -> MemoryResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| MemoryError::Http(format!("invalid base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(MemoryError::Http(format!(
                "invalid base URL '{}'",
                base_url
            )));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url,
        })
    }

    /// Base URL with each segment appended, percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("Authorization", format!("Api-Key {}", self.api_key))
    }

    /// Send and decode, mapping 404 to `NotFound(what)`.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> MemoryResult<T> {
        let response = self.check(request, what).await?;
        response
            .json()
            .await
            .map_err(|e| MemoryError::Decode(format!("{}: {}", what, e)))
    }

    /// Existence check. The record is read best-effort; a body that is not
    /// JSON or lacks fields still counts as found.
    async fn lookup(&self, request: RequestBuilder, what: &str) -> MemoryResult<Value> {
        let response = self.check(request, what).await?;
        Ok(response.json().await.unwrap_or(Value::Null))
    }

    async fn check(&self, request: RequestBuilder, what: &str) -> MemoryResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| MemoryError::Http(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MemoryError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemoryError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl MemoryStore for ZepClient {
    async fn get_user(&self, user_id: &str) -> MemoryResult<MemoryUser> {
        let request = self.request(Method::GET, self.url(&["users", user_id]));
        let body = self.lookup(request, &format!("user '{}'", user_id)).await?;
        Ok(MemoryUser {
            user_id: user_id.to_string(),
            email: string_field(&body, "email"),
            first_name: string_field(&body, "first_name"),
            uuid: string_field(&body, "uuid"),
        })
    }

    async fn add_user(&self, user: &MemoryUser) -> MemoryResult<MemoryUser> {
        let request = self
            .request(Method::POST, self.url(&["users"]))
            .json(user);
        self.send(request, &format!("user '{}'", user.user_id)).await
    }

    async fn get_session(&self, session_id: &str) -> MemoryResult<MemorySession> {
        let request = self.request(Method::GET, self.url(&["sessions", session_id]));
        let body = self.lookup(request, &format!("session '{}'", session_id)).await?;
        Ok(MemorySession {
            session_id: session_id.to_string(),
            user_id: string_field(&body, "user_id").unwrap_or_default(),
            uuid: string_field(&body, "uuid"),
        })
    }

    async fn add_session(&self, session_id: &str, user_id: &str) -> MemoryResult<MemorySession> {
        let request = self
            .request(Method::POST, self.url(&["sessions"]))
            .json(&json!({ "session_id": session_id, "user_id": user_id }));
        self.send(request, &format!("session '{}'", session_id)).await
    }

    async fn add_messages(&self, session_id: &str, messages: &[MemoryMessage]) -> MemoryResult<()> {
        let request = self
            .request(Method::POST, self.url(&["sessions", session_id, "memory"]))
            .json(&json!({ "messages": messages }));
        self.check(request, &format!("session '{}'", session_id))
            .await
            .map(|_| ())
    }

    async fn graph_search(&self, query: &GraphSearchQuery) -> MemoryResult<GraphSearchResults> {
        let request = self
            .request(Method::POST, self.url(&["graph", "search"]))
            .json(query);
        self.send(request, &format!("graph for user '{}'", query.user_id))
            .await
    }

    async fn get_session_messages(
        &self,
        session_id: &str,
        limit: u32,
    ) -> MemoryResult<Vec<MemoryMessage>> {
        let request = self
            .request(Method::GET, self.url(&["sessions", session_id, "messages"]))
            .query(&[("limit", limit)]);
        let list: MessageList = self
            .send(request, &format!("session '{}'", session_id))
            .await?;
        Ok(list.messages)
    }
}

fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_segments_are_encoded() {
        let client = ZepClient::new("key", "https://api.getzep.com/api/v2/").unwrap();
        assert_eq!(
            client.url(&["sessions", "a b/c", "memory"]).as_str(),
            "https://api.getzep.com/api/v2/sessions/a%20b%2Fc/memory"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ZepClient::new("key", "not a url"),
            Err(MemoryError::Http(_))
        ));
    }
}
