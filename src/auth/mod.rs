//! Bearer token authentication for the `/v1` routes.
//!
//! Callers send `Authorization: Bearer <token>`; the token must equal the
//! server's `BEARER_TOKEN`. A server started without a token rejects every
//! protected call with 500, since it cannot tell good callers from bad ones.
//!
//! ```ignore
//! let protected = Router::new()
//!     .route("/create_crew/", post(create_crew))
//!     .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
//! ```

/// Authentication middleware for protected routes.
pub mod middleware;

pub use middleware::auth_middleware;
