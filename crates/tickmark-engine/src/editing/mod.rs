//! # Editing
//!
//! The whole document lives in one [`xi_rope::Rope`]. Every change is a
//! [`Cmd`] compiled to a rope delta and applied in place, so saving writes
//! the buffer back verbatim with no formatting drift.
//!
//! - [`document`]: the buffer, line access and position resolution.
//! - [`commands`]: the edit commands and their delta compilation.
//! - [`transaction`]: batches of queued ops and callbacks.
//! - [`actions`]: todo level edits (toggle, create, metadata, lint fixes)
//!   built on transactions.

pub mod actions;
pub mod commands;
pub mod document;
pub mod patch;
pub mod transaction;

pub use actions::{
    add_metadata, apply_fixes, create_todo, remove_metadata, remove_todo_marker, set_todo_state,
    toggle_todo,
};
pub use commands::Cmd;
pub use document::Document;
pub use patch::Patch;
pub use transaction::Transaction;
