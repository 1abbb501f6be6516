// Re-export all model types
pub use self::enums::*;
pub use self::errors::*;
pub use self::menu_item::*;
pub use self::upload::*;
pub use self::validation::*;

mod enums;
mod errors;
mod menu_item;
mod upload;
mod validation;
