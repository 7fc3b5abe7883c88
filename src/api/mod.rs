//! HTTP API Handlers and Routes
//!
//! # Endpoints
//!
//! - `GET /health` - liveness check, public
//! - `POST /v1/create_crew/` - run a crew with memory context (bearer auth)
//! - `GET /v1/crews` - list registered crews (bearer auth)
//! - `GET /openapi.json` - OpenAPI document, when `DOCS_ENABLED` is on
//!
//! With the `swagger-ui` feature, interactive documentation is served at `/docs/`.
//!
//! Errors are returned as `{"detail": "<message>"}`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
