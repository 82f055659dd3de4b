#![doc = "The `todolist` library crate."]
#![doc = ""]
#![doc = "Domain models, persistence ports and their PostgreSQL and in-memory"]
#![doc = "implementations, the ownership-scoped task lifecycle, authentication,"]
#![doc = "the retention purge job, and the HTTP routes. The binary (`main.rs`)"]
#![doc = "wires them into an actix-web server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod purge;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use crate::error::AppError;
pub use crate::state::AppState;
