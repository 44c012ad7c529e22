//! Identity-token claims, nonce helpers, and redacted session material.

pub mod claims;
pub mod nonce;
pub mod secret;
pub mod session;

pub use claims::*;
pub use nonce::*;
pub use secret::*;
pub use session::*;
