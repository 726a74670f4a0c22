//! Gatehouse Types - Shared domain types
//!
//! This crate contains domain types used across the Gatehouse workspace:
//! - User identity and roles
//! - Access-token claims and token pairs

pub mod token;
pub mod user;

pub use token::*;
pub use user::*;
