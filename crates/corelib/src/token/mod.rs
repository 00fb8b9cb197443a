//! Positions on the hash ring.

pub mod hashed;
pub mod traits;

pub use hashed::HashToken;
pub use traits::Token;
