//! # Stateconf - Convergence Waits for Eventually-Consistent Resources
//!
//! Cloud APIs acknowledge a create or delete long before the resource is
//! actually ready or gone. Stateconf turns those asynchronous transitions into
//! synchronous operations: a status refresh function is polled with backoff
//! until the observed state lands in a target set, the timeout elapses, or the
//! caller cancels.
//!
//! ## Core Concepts
//!
//! - **Refresh functions**: one remote read per call, reporting a state label
//!   and payload, or absence
//! - **Wait specs**: pending and target state sets, timeout, backoff and an
//!   optional failure-reason inspector
//! - **Service adapters**: Lex Model Building and SESv2 clients, status
//!   adapters and waiters built on them
//! - **Resource handlers**: create/read/delete flows that block on waiters and
//!   report failures with action, service, resource and ID
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Resource handlers / CLI                           │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                   Service waiters (lexmodels, sesv2)                 │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!          ┌─────────────────────────┼─────────────────────────┐
//!          ▼                         ▼                         ▼
//! ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────────┐
//! │  Status refresh │   │  Convergence waiter │   │   Backoff policy    │
//! │    adapters     │   │   (tokio select!)   │   │   (rand jitter)     │
//! └─────────────────┘   └─────────────────────┘   └─────────────────────┘
//!          │
//!          ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │               Client traits (AWS SDK or in-memory fakes)             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use stateconf::prelude::*;
//! use stateconf::services::lexmodels::{wait_bot_version_created, LexModelsApi};
//!
//! async fn publish(conn: Arc<dyn LexModelsApi>) -> Result<()> {
//!     let ctx = WaitContext::new();
//!     let outcome =
//!         wait_bot_version_created(&ctx, &conn, "OrderFlowers", "2", Duration::from_secs(60))
//!             .await?;
//!     println!("last seen {:?} after {} polls", outcome.last_state, outcome.attempts);
//!     let bot = outcome.into_result()?;
//!     println!("bot is {:?}", bot.map(|b| b.status));
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    // Error handling
    pub use crate::error::{Error, Result};

    // Waiter
    pub use crate::waiter::{
        refresh_fn, BackoffPolicy, Failure, PollResult, Refresh, RefreshError, WaitContext,
        WaitError, WaitOutcome, WaitSpec, ABSENT,
    };

    // Resource handlers
    pub use crate::resource::{ProviderError, ResourceAction};

    // Service clients
    pub use crate::services::ApiError;
}

// ============================================================================
// Core Modules
// ============================================================================

/// Error types and result aliases for Stateconf operations.
pub mod error;

/// The convergence waiter: wait specs, refresh functions, backoff.
pub mod waiter;

/// Shared plumbing for resource CRUD handlers.
pub mod resource;

/// AWS service clients, status adapters, waiters and resources.
pub mod services;

// ============================================================================
// Configuration and Telemetry
// ============================================================================

/// Configuration management for Stateconf behavior.
///
/// Handles loading and merging configuration from config files and
/// environment variables.
pub mod config;

/// Structured logging setup.
pub mod telemetry;

// ============================================================================
// Version Information
// ============================================================================

/// Returns the current version of Stateconf.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
