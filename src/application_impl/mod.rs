mod auth_service_impl;
mod auth_session_engine;
mod jwt_token_issuer;

pub use auth_service_impl::*;
pub use auth_session_engine::*;
pub use jwt_token_issuer::*;
