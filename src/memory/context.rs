//! Text blocks describing what the memory service knows, handed to crews as
//! `zep_context`.

use super::{GraphSearchResults, MemoryMessage};
use crate::types::{Reranker, SearchScope};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::warn;

pub const GRAPH_CONTEXT_UNAVAILABLE: &str = "Graph search context unavailable.";
pub const HISTORY_UNAVAILABLE: &str = "Session history unavailable.";

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S %z";

pub fn format_graph_search_results(
    results: &GraphSearchResults,
    scope: SearchScope,
    reranker: Reranker,
    limit: u32,
    query: &str,
) -> String {
    let mut parts = vec![format!(
        "--- Start of Zep graph search context (query: '{}', scope: {}, reranker: {}, limit: {}) ---",
        query,
        scope.as_str(),
        reranker.as_str(),
        limit
    )];

    if !results.nodes.is_empty() {
        parts.push("Relevant nodes found:".to_string());
        for node in &results.nodes {
            let labels = if node.labels.is_empty() {
                "N/A".to_string()
            } else {
                node.labels.join(", ")
            };
            let attributes = if node.attributes.is_empty() {
                "None".to_string()
            } else {
                node.attributes
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, display_value(v)))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            parts.push(format!(
                "  - Node: {} (UUID: {})\n    Labels: {}\n    Summary: {}\n    Attributes: {}",
                non_blank(&node.name).unwrap_or("Unnamed"),
                node.uuid,
                labels,
                non_blank(&node.summary).unwrap_or("No summary."),
                attributes
            ));
        }
        parts.push(String::new());
    }

    if !results.edges.is_empty() {
        parts.push("Relevant facts/relations found:".to_string());
        for edge in &results.edges {
            parts.push(format!(
                "  - Fact: {} (Relation: {})\n    From: {} To: {}\n    Valid from: {} until {}",
                non_blank(&edge.fact).unwrap_or("N/A"),
                non_blank(&edge.name).unwrap_or("N/A"),
                edge.source_node_uuid,
                edge.target_node_uuid,
                non_blank(&edge.valid_at).unwrap_or("N/A"),
                non_blank(&edge.invalid_at).unwrap_or("Present"),
            ));
        }
        parts.push(String::new());
    }

    if results.is_empty() {
        parts.push(
            "No relevant results (nodes or edges) found in the Zep graph search with the given parameters."
                .to_string(),
        );
    }

    parts.push("--- End of Zep graph search context ---".to_string());
    parts.join("\n")
}

pub fn format_session_messages(
    messages: &[MemoryMessage],
    history_limit: u32,
    offset: FixedOffset,
) -> String {
    let mut parts = vec![format!(
        "--- Start of recent Zep session history (last {} messages, times in UTC{}) ---",
        history_limit, offset
    )];

    if messages.is_empty() {
        parts.push("No message history found for this session in Zep.".to_string());
    }

    for message in messages {
        let timestamp = match message.created_at.as_deref() {
            Some(raw) if !raw.trim().is_empty() => format_timestamp(raw, offset),
            _ => "Timestamp unavailable".to_string(),
        };
        parts.push(format!(
            "  [{}] {}: {}",
            timestamp,
            role_display(message),
            message.content
        ));
    }

    parts.push("--- End of recent Zep session history ---".to_string());
    parts.join("\n")
}

/// Render an RFC 3339 (or zone-less, assumed UTC) timestamp in `offset`.
/// Unparseable input is returned unchanged.
pub fn format_timestamp(raw: &str, offset: FixedOffset) -> String {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.and_utc())
        });

    match parsed {
        Ok(dt) => dt.with_timezone(&offset).format(TIMESTAMP_FORMAT).to_string(),
        Err(_) => {
            warn!("Could not parse message timestamp: {}", raw);
            raw.to_string()
        }
    }
}

fn role_display(message: &MemoryMessage) -> String {
    if let Some(role) = non_blank(&message.role) {
        if message.user_id.as_deref() != Some(role) {
            return role.to_string();
        }
    }
    match non_blank(&message.role_type) {
        Some(role_type) => capitalize(role_type),
        None => "Unknown".to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
