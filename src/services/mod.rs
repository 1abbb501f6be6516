// Services module - business logic layer

pub mod menu_service;

pub use menu_service::MenuService;
