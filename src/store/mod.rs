// src/store/mod.rs
pub mod calls;
pub mod commands;
pub mod types;

pub use calls::CallStore;
pub use commands::CommandStore;
pub use types::{CallRecord, CallStatus, CommandEntry, ListQuery, NewCall};
