// Microblog - posts, groups, comments and follow feeds over a sqlx content store

// Content store - persistence for users, groups, posts, comments and follows
pub mod store;

// Domain rows and display helpers
pub mod models;

// Fixed-size page slicing with navigation metadata
pub mod pagination;

// Per-viewer feed resolution (home, group, profile, following)
pub mod feeds;

// Directed follow edges between users
pub mod graph;

// Mutation input schemas and field-level validation
pub mod forms;

// Viewer resolution middleware and authorization predicates
pub mod auth;

// Invalidation events published on content mutations
pub mod events;

// HTTP surface
pub mod routes;

// Common utilities
pub mod app_state;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
