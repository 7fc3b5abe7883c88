//! Tools crew agents can call during a task
//!
//! - [`registry`](crate::tools::registry) - the [`Tool`](registry::Tool) trait and name-based lookup
//! - [`search`](crate::tools::search) - `web_search` (Serper) and `scrape_website`
//!
//! Agents only see the tools their definition names:
//! ```ignore
//! let registry = ToolRegistry::with_default_tools(&config.tools);
//! let defs = registry.get_tool_definitions_for(&["web_search"]);
//! let result = registry.execute("web_search", json!({"query": "zep"})).await?;
//! ```

/// Tool registry for managing available tools.
pub mod registry;
/// Web search and website scraping tools.
pub mod search;

pub use registry::{Tool, ToolRegistry};
