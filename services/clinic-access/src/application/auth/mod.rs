mod service;

pub use service::{LoginOutcome, LoginService};
