pub mod app;
pub mod config;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod security;
pub mod services;
pub mod storage;
pub mod views;

pub use app::{build_app, create_app, StartupError};
pub use config::{Config, ConfigError};
pub use observability::{init_observability, shutdown_observability, Metrics};
