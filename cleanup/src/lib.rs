//! Cleanup of dead verification records.
//!
//! [`Sweeper`] makes one pass over a snapshot of the token store, deleting
//! records past expiry plus a grace period, records past a hard maximum age,
//! undecodable records and pending submissions whose token is gone.
//! [`CleanupScheduler`] runs it on a fixed interval until shutdown.

pub mod config;
pub mod scheduler;
pub mod sweeper;

pub use config::CleanupConfig;
pub use scheduler::CleanupScheduler;
pub use sweeper::{SweepReport, Sweeper};
