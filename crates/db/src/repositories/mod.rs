//! Repositories.

mod moderation;
mod password_reset;
mod user;

pub use moderation::{BanHistoryFilter, ModerationRepository};
pub use password_reset::PasswordResetRepository;
pub use user::UserRepository;
