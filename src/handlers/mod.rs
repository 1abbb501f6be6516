pub mod api;
pub mod catalog;
pub mod forms;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod pages;

pub use api::ApiState;
pub use health::*;
pub use metrics::*;
pub use middleware::*;
pub use pages::AppState;
