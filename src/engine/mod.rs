//! Batch decision engine: scorer seam, universe, run coordination, snapshots

pub mod batch;
pub mod scorer;
pub mod snapshot;
pub mod universe;

pub use batch::BatchEngine;
pub use scorer::{MomentumScorer, ScoreOutcome, Scorer};
pub use snapshot::{DecisionSnapshot, SnapshotStore, SnapshotWriter};
pub use universe::{FileUniverse, UniverseSource};
