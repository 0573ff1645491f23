//! # CivicDesk Service
//!
//! Complaint operations on top of the core engine and the SQLite store.
//!
//! - [`ComplaintService`]: submit, transition, lookup
//! - [`StatsService`]: cached summary counts
//! - [`ServiceContext`]: shared pool, audit log, locks and cache

pub mod complaints;
pub mod config;
pub mod context;
pub mod error;
pub mod locks;
pub mod stats;

pub use complaints::{ComplaintService, SubmissionResult, TransitionResult, COMPLAINT_SEQUENCE};
pub use config::ServiceConfig;
pub use context::ServiceContext;
pub use error::{ServiceError, ServiceResult};
pub use locks::LockRegistry;
pub use stats::{StatsCache, StatsService};
