// Upload intake: format classification, text extraction, run orchestration and the
// notification feed that narrates each run.

pub mod extractors;
pub mod format;
pub mod handlers;
pub mod notify;
pub mod orchestrator;
