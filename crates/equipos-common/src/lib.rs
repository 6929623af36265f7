//! Shared building blocks for the EQUIPOS rental tools.
//!
//! Nothing in here knows about rentals: it is the ambient plumbing (logging,
//! retry policy, calendar helpers) the billing crate and its binary lean on.

pub mod dates;
pub mod logging;
pub mod retry;

pub use retry::{retry_with_backoff, RetryConfig};
