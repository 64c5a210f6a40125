//! # quizd
//!
//! Domain logic for the quiz/gamification backend: question store, quiz
//! session lifecycle with bonus-tier scoring, challenge campaigns,
//! leaderboards, and the knowledge-pill broadcaster.

pub mod challenge;
pub mod errors;
pub mod leaderboard;
pub mod notify;
pub mod options;
pub mod pills;
pub mod questions;
pub mod quiz;
pub mod scheduler;
pub mod settings;
pub mod store;
pub mod users;

pub use errors::QuizError;
pub use store::Store;
