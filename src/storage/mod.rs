// Storage module - uploaded image files

pub mod image_store;

pub use image_store::{ImageStore, LocalImageStore, StagedImage};
