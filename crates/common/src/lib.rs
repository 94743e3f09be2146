//! Common utilities and shared types for warden.
//!
//! This crate provides foundational components used across all warden crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based identifiers and reset tokens via [`IdGenerator`]
//! - **Pagination**: Page/limit normalization and response metadata via [`PageQuery`]
//!
//! # Example
//!
//! ```no_run
//! use warden_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {id} for {}", config.server.host);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod pagination;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use pagination::{PageMeta, PageQuery, Paginated};
