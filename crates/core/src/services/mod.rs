//! Business logic services.

#![allow(missing_docs)]

pub mod auth;
pub mod email;
pub mod gate;
pub mod moderation;
pub mod password;
pub mod policy;
pub mod seed;
pub mod token;
pub mod user;

pub use auth::{
    AuthService, AuthSession, ChangePasswordInput, LoginInput, RESET_REQUESTED_MESSAGE,
    RegisterInput, ResetRequestInput, UpdatePasswordInput,
};
pub use email::{LogMailer, MailerService, ResetMailer, SmtpMailer, mailer_from_config};
pub use gate::{Caller, RequestGate, bearer_token, check_admission, require_role};
pub use moderation::{
    BanHistoryEntry, BanInput, BanOutcome, FreezeInput, FreezeOutcome, ModerationService,
    RoleChange, RoleHistoryEntry, UnbanOutcome, UpdateRoleInput, UpdateStatusInput,
};
pub use password::{hash_password, verify_password};
pub use policy::{BanDuration, Decision, Party};
pub use seed::seed_default_user;
pub use token::{Claims, TokenService};
pub use user::{UpdateProfileInput, UserService};
