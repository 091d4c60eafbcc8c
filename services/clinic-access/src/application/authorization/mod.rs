mod service;

pub use service::AuthorizationGuard;
