pub mod auth;
pub mod authorization;
pub mod role;
pub mod session;
pub mod user;
