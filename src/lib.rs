#![doc = "The `taskdeck` library crate."]
#![doc = ""]
#![doc = "Domain models, persistence ports and adapters, authentication, services,"]
#![doc = "routing configuration and error handling for the taskdeck REST API."]
#![doc = "The binary (`main.rs`) wires these together into an `HttpServer`."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use error::AppError;
pub use state::AppState;
