pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod middleware;
pub mod services;
pub mod testing;

pub use app::{app, AppState};
pub use error::ApiError;
