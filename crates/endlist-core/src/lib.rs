//! # endlist-core
//!
//! Core types, eligibility rules, and the reconciliation engine for endlist.
//!
//! The engine computes an event's eligible roster from registration data and
//! compares its counts against the attendance snapshot. Storage is reached
//! only through the traits in [`traits`], implemented by `endlist-db` for
//! PostgreSQL and by [`mock`] for tests.

pub mod defaults;
pub mod eligibility;
pub mod error;
pub mod geography;
pub mod mock;
pub mod models;
pub mod projection;
pub mod reconcile;
pub mod snapshot;
pub mod traits;

// Re-export commonly used types at crate root
pub use eligibility::is_eligible;
pub use error::{Error, Result};
pub use geography::{format_class_grade, normalize_state, resolve};
pub use models::*;
pub use projection::{decode_managers, dedupe_managers, expected_counts, ProjectionBuilder};
pub use reconcile::reconcile;
pub use snapshot::SnapshotReader;
pub use traits::*;
