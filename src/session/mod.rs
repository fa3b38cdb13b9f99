//! Work session state model.
//!
//! DESIGN
//! ======
//! `model` holds the raw per-user fields and enforces the write-once
//! invariants, `status` maps those fields to one of five states, and
//! `countdown` turns server-reported time remaining into display values.

pub mod countdown;
pub mod model;
pub mod status;

pub use countdown::Countdown;
pub use model::{REVIEW_WINDOW, WORK_WINDOW, WorkSession};
pub use status::{ReviewState, StatusSnapshot, WorkStatus, resolve};
