//! # Resilience Module
//!
//! Bounded retry for establishing connections to the worker's external
//! dependencies. Startup is the only place retries happen: once the worker is
//! consuming, store and broker failures are handled per message or per poll.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fulfillment_worker::resilience::{retry_connect, RetryPolicy};
//!
//! # async fn example() -> fulfillment_worker::Result<()> {
//! let policy = RetryPolicy::default(); // 5 attempts, fixed 2s delay
//!
//! let handle = retry_connect("example", &policy, |_attempt| async {
//!     Ok::<_, fulfillment_worker::WorkerError>("connected")
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod retry;

pub use retry::{retry_connect, BackoffKind, RetryPolicy};
