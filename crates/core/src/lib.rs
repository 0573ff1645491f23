//! # CivicDesk Core
//!
//! Complaint lifecycle and identity verification.
//!
//! - [`verhoeff`]: national ID checksum validation
//! - [`IdentifierGenerator`]: sortable complaint identifiers
//! - [`LifecycleEngine`]: status state machine with an append-only audit trail
//! - [`StatsAggregator`]: per-status summary counts
//!
//! ## Example
//!
//! ```rust
//! use civicdesk_core::{ComplaintStatus, LifecycleEngine, NewComplaint, StatsAggregator, StatsScope};
//!
//! let engine = LifecycleEngine::default();
//! let mut complaint = engine
//!     .create("CMP-1", NewComplaint::new("Loud music", "Noise", "After midnight"), None)
//!     .unwrap();
//! engine
//!     .transition(&mut complaint, ComplaintStatus::Acknowledged, Some("reviewed"), None)
//!     .unwrap();
//!
//! let summary = StatsAggregator::aggregate([&complaint], &StatsScope::Global);
//! assert_eq!(summary.count(ComplaintStatus::Acknowledged), 1);
//! ```

pub mod complaint;
pub mod error;
pub mod event;
pub mod identifier;
pub mod lifecycle;
pub mod stats;
pub mod verhoeff;

pub use complaint::{
    Category, Complaint, ComplaintParts, ComplaintStatus, IdentityClaim, IdentityVerification,
    NewComplaint, Priority, ReporterType, StatusEntry,
};
pub use error::{CoreError, CoreResult};
pub use event::{ComplaintEvent, ComplaintEventKind};
pub use identifier::{AtomicSequence, IdentifierGenerator, ParsedId};
pub use lifecycle::{LifecycleEngine, Transition, TransitionTable};
pub use stats::{StatsAggregator, StatsScope, StatsSummary};
