//! Common test utilities for gatehouse-auth-core integration tests

pub mod clock;
pub mod mock_repos;

#[allow(unused_imports)]
pub use clock::ManualClock;
#[allow(unused_imports)]
pub use mock_repos::{MockRefreshTokenRepository, MockUserRepository};
