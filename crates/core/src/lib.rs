//! Core business logic for warden.
//!
//! The authorization policy, the moderation workflow that applies it, and the
//! account services (authentication, profile, password reset) around them.

pub mod services;

pub use services::*;
pub use warden_db::entities::{
    ban_history::BanDurationKind,
    user::{UserRole, UserStatus},
};
