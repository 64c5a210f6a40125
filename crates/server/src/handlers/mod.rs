//! # API Route Handlers
//!
//! This module organizes all the Axum route handlers for the `quizd-server`.
//! The handlers are split into logical sub-modules based on their
//! functionality (e.g., `quiz`, `admin`, `pills`).

pub mod admin_handlers;
pub mod bi_handlers;
pub mod challenge_handlers;
pub mod config_handlers;
pub mod general;
pub mod options_handlers;
pub mod pill_handlers;
pub mod question_handlers;
pub mod quiz_handlers;
pub mod stats_handlers;
pub mod user_handlers;

// Re-export all handlers from the sub-modules to make them easily accessible
// to the router under a single `handlers::` path.
pub use admin_handlers::*;
pub use bi_handlers::*;
pub use challenge_handlers::*;
pub use config_handlers::*;
pub use general::*;
pub use options_handlers::*;
pub use pill_handlers::*;
pub use question_handlers::*;
pub use quiz_handlers::*;
pub use stats_handlers::*;
pub use user_handlers::*;
