//! Database entities.

#![allow(missing_docs)]

pub mod ban_history;
pub mod freeze_history;
pub mod password_reset_token;
pub mod role_history;
pub mod user;

pub use ban_history::Entity as BanHistory;
pub use freeze_history::Entity as FreezeHistory;
pub use password_reset_token::Entity as PasswordResetToken;
pub use role_history::Entity as RoleHistory;
pub use user::Entity as User;
