//! User-facing messages and the macros printing them.
//!
//! ```rust,no_run
//! use runrun_tracker::libs::messages::Message;
//! use runrun_tracker::msg_success;
//!
//! msg_success!(Message::ConfigSaved);
//! ```

pub mod display;
pub mod macros;
pub mod types;

pub use types::Message;
