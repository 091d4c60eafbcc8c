pub mod commands;
pub mod handlers;

pub use commands::*;
pub use handlers::{MIN_PASSWORD_LEN, UserCommandHandler, UserQueryHandler};
