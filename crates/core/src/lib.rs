#![warn(clippy::all, missing_docs)]

//! Core client logic for the auto-parts inventory front-end.
//!
//! This crate hosts the REST client, the persisted session, the
//! category/part managers and form validation used by the terminal UI and
//! any future frontends.

pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod resource;
pub mod services;
pub mod session;
pub mod validation;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use http::ApiClient;
pub use models::{Category, Part, Profile};
pub use resource::{CategoryManager, PartManager, PendingDelete, ResourceManager};
pub use services::AppServices;
pub use session::{SessionHandle, SessionStatus, SessionStore};
pub use validation::{FieldErrors, FormDraft, Validate, Validated};
