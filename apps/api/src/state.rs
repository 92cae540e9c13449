use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::ingest::extractors::OcrSettings;
use crate::ingest::notify::Notifier;
use crate::ingest::orchestrator::Orchestrator;
use crate::print::projector::PrintProjector;
use crate::record::controller::RecordController;
use crate::structuring::StructuringService;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// One editing session per process: the controller holds the only current record.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub controller: Arc<RecordController>,
    pub orchestrator: Arc<Orchestrator>,
    pub notifier: Arc<Notifier>,
    pub projector: Arc<PrintProjector>,
    /// Delay a print context waits before invoking the print action.
    pub print_settle: Duration,
}

impl AppState {
    pub fn new(config: Config, structurer: Arc<dyn StructuringService>) -> Self {
        let controller = Arc::new(RecordController::new());
        let notifier = Arc::new(Notifier::new());
        let orchestrator = Arc::new(Orchestrator::new(
            structurer,
            Arc::clone(&controller),
            Arc::clone(&notifier),
            OcrSettings {
                binary: config.tesseract_bin.clone(),
                language: config.tesseract_lang.clone(),
            },
        ));

        Self {
            projector: Arc::new(PrintProjector::new(config.print_footer.clone())),
            print_settle: Duration::from_millis(config.print_settle_ms),
            controller,
            orchestrator,
            notifier,
            config,
        }
    }
}
