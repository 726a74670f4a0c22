//! Gatehouse Auth Core - Authentication business logic
//!
//! Credential verification, access/refresh token issuance, rotation with
//! reuse detection, and revocation. The HTTP layer, user management, and
//! storage schema live elsewhere; this crate is the session state machine.

pub mod clock;
pub mod config;
pub mod crypto;
pub mod denylist;
pub mod error;
pub mod keyring;
pub mod ledger;
pub mod password;
pub mod service;
pub mod token;

pub use clock::{Clock, SystemClock};
pub use config::AuthConfig;
pub use crypto::{constant_time_eq, generate_refresh_secret, hash_token};
pub use denylist::AccessDenylist;
pub use error::AuthError;
pub use keyring::{Keyring, SigningKey};
pub use ledger::{IssuedRefreshToken, RefreshTokenLedger};
pub use password::PasswordHasher;
pub use service::AuthService;
pub use token::TokenCodec;
