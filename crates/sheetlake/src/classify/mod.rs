//! Classification of discovered files and materialization of the snapshot.

mod orchestrator;
mod snapshot;

pub use orchestrator::{Classification, Classifier, ClassifierSettings, Inspection, StatusCounts};
pub use snapshot::{CopyOutcome, SnapshotMaterializer};
