//! Client core for the data-entry work platform.
//!
//! DESIGN
//! ======
//! `session` is the work session state model: five mutually exclusive
//! statuses derived from start/submit timestamps, the penalty flag and the
//! clock. `workspace` drives it against the server: it polls status, feeds
//! the countdown, and gates the editor, auto-save and submission on the
//! resolved status. Everything that talks to the platform goes through
//! `api::ApiClient`, which checks capabilities from `access` against the
//! explicit `auth::AuthSession` before sending.

pub mod access;
pub mod api;
pub mod auth;
pub mod autosave;
pub mod config;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod notify;
pub mod search;
pub mod session;
pub mod site_config;
pub mod submission;
pub mod workspace;
pub mod writer;

pub use error::ClientError;
