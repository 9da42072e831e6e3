//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Apply flags → Validate → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Listener binds last (traffic only once the config is accepted)
//! - Missing upstream or bind failure exits non-zero

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
