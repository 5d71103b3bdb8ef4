// src/lib.rs

pub mod admin;
pub mod api;
pub mod capture;
pub mod config;
pub mod error;
pub mod invoke;
pub mod permissions;
pub mod reconcile;
pub mod registry;
pub mod server;
pub mod state;
pub mod store;

pub use error::{AdminError, AdminResult};
pub use state::AppState;
