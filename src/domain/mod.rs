//! Domain layer - Pure business abstractions
//!
//! This layer contains NO framework dependencies (no SeaORM, no Axum).
//! Only trait definitions, the cart store and domain error types.

pub mod cart;
pub mod errors;
pub mod repositories;

pub use cart::{CartItem, CartStore};
pub use errors::DomainError;
pub use repositories::*;
