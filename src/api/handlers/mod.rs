/// Crew execution and listing.
pub mod crews;
/// Liveness check.
pub mod health;
