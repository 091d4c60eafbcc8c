pub mod permission;
pub mod role;
pub mod session;
pub mod unit_of_work;
pub mod user;
