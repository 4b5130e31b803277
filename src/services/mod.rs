//! Services Layer
//!
//! Pure business logic for the checkout workflows, kept out of the HTTP
//! handlers so it can be tested against a bare database connection.

pub mod cart_service;
pub mod loan_service;
