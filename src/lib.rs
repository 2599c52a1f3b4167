//! Seoga Library Management System
//!
//! A Rust implementation of the Seoga departmental library backend,
//! providing a REST JSON API for the book catalog, user accounts,
//! rentals, reservations, reviews and liked books.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod marc;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
