pub mod pipeline;
pub mod reconcile;

pub use pipeline::{import_existing_file, ImportPlan, Orchestrator, RunSummary};
pub use plexboxd_sources::StepObserver;
pub use reconcile::{reconcile, Reconciliation};
