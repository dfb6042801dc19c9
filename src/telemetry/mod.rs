//! Telemetry for Stateconf.
//!
//! Waits are instrumented with `tracing` events carrying structured fields
//! (`attempt`, `state`, `interval`, `elapsed`). This module installs the
//! subscriber that renders them.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use stateconf::telemetry::{LogFormat, LoggingBuilder};
//!
//! LoggingBuilder::new()
//!     .with_format(LogFormat::Json)
//!     .with_filter("stateconf::waiter=debug")
//!     .init()?;
//! # Ok::<(), stateconf::error::Error>(())
//! ```

pub mod logging;

pub use logging::{init_from_config, LogFormat, LogLevel, LoggingBuilder, LoggingConfig};
