pub mod events;
pub mod repository;
pub mod role;

pub use events::*;
pub use repository::*;
pub use role::*;
