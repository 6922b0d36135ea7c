//! State management module.
//!
//! Keeps the last applied snapshot of resolved apps. `plan` diffs against it
//! and `apply` replaces it after the manifests are written.

mod local;
mod store;
mod types;

pub use local::{LocalStateStore, STATE_DIR};
pub use store::StateStore;
pub use types::{ApplyHistoryEntry, ApplyState, STATE_VERSION};
