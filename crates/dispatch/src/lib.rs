//! Notification dispatch core.
//!
//! Pulls pending rows from the records store, resolves each recipient's
//! gateway identifier, sends the templated message, and marks the row sent —
//! one row at a time, one commit per row, so a failure mid-batch never undoes
//! earlier progress.

pub mod gateway;
pub mod store;
pub mod workflow;
