//! Shared utilities for the Vouch workspace.

pub mod logging;
pub mod shutdown;

pub use logging::{init_logging, LogFormat};
pub use shutdown::{ShutdownController, Signal};
