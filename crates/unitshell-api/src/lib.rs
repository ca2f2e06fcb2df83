#![warn(missing_docs)]

//! UnitShell WebSocket API
//!
//! Accepts `GET /apps/{app}/shell` upgrades, authorizes the caller, binds
//! the connection to exactly one unit and bridges the socket to a shell
//! process on it until either side goes away.

pub mod bridge;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod reporter;
pub mod routes;
pub mod server;
pub mod session;
pub mod state;

pub use server::ApiServer;
pub use state::AppState;
