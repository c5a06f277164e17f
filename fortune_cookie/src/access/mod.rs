//! Access control: the daily gate, the admin gate and their UI collaborators.
//!
//! The backend decides; this module only turns its answer into exactly one
//! redirect or one [`DenialModal`].

pub mod admin;
pub mod countdown;
pub mod gate;
pub mod modal;
pub mod school;

pub use admin::AdminGate;
pub use countdown::{AVAILABLE_NOW, Remaining, remaining_at, run_countdown};
pub use gate::{AccessGate, AccessVerdict, DenialHandler};
pub use modal::{DenialModal, ModalAction};
pub use school::{SCHOOL_PLACEHOLDER, extract_school_name};
