//! Domain logic - pure version and commit rules independent of the history store

pub mod commit;
pub mod version;

pub use commit::ParsedCommit;
pub use version::{BumpDecision, ReleaseTagVersion};
