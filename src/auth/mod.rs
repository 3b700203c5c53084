mod api;
mod core;
mod db;

pub use crate::auth::{api::AuthApi, core::TokenConfig};

#[cfg(test)]
pub use crate::auth::core::{make_jwt, user_register, TokenKind, UserCreate, UserResponse};
