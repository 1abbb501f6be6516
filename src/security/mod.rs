// Security module - form protection

pub mod csrf;

pub use csrf::{CsrfError, CsrfGuard};
