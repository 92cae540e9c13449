//! Extraction Orchestrator: runs upload → extraction → structuring for the current run.
//!
//! # Run lifecycle
//! `Idle → Extracting → Structuring → Ready | Failed`, with `Cancelled` for a run that
//! was superseded by a newer submission while it was still extracting or structuring.
//!
//! # Supersession
//! Every submission takes the next [`RunId`]. Older runs keep running (in-flight library
//! calls are never aborted) but anything they produce is dropped: a run only advances
//! its phase, publishes a notification, or commits a record while its id is still the
//! latest one. The check and the commit happen under the same lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::ingest::extractors::{ExtractionResult, Extractor, OcrSettings, UploadedFile};
use crate::ingest::format::classify;
use crate::ingest::notify::{NotificationLevel, Notifier};
use crate::record::controller::RecordController;
use crate::record::schema::StructuredRecord;
use crate::record::validation::validate_response;
use crate::structuring::{StructuringRequest, StructuringService};

pub type RunId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Extracting,
    Structuring,
    Ready,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineStatus {
    pub run_id: Option<RunId>,
    pub phase: Phase,
    pub reason: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Unsupported file type: '{name}' ({mime_type})")]
    UnsupportedFormat { name: String, mime_type: String },

    #[error("Could not extract text from the uploaded file. {0}")]
    ExtractionFailure(String),

    #[error("Could not find any text in the file.")]
    EmptyExtraction,

    #[error("Failed to parse resume. {0}")]
    StructuringService(String),
}

impl PipelineError {
    fn title(&self) -> &'static str {
        match self {
            PipelineError::UnsupportedFormat { .. } => "Unsupported file",
            PipelineError::ExtractionFailure(_) | PipelineError::EmptyExtraction => {
                "Extraction failed"
            }
            PipelineError::StructuringService(_) => "Parsing error",
        }
    }
}

/// Why a run stopped before producing a record.
enum Interrupt {
    Superseded,
    Failed(PipelineError),
}

impl From<PipelineError> for Interrupt {
    fn from(err: PipelineError) -> Self {
        Interrupt::Failed(err)
    }
}

/// Handle to a submitted run. Dropping it detaches the task; the run still completes.
pub struct RunHandle {
    pub run_id: RunId,
    /// Resolves to the phase the run ended in from its own point of view.
    pub task: JoinHandle<Phase>,
}

struct RunBook {
    latest: RunId,
    status: PipelineStatus,
}

pub struct Orchestrator {
    structurer: Arc<dyn StructuringService>,
    controller: Arc<RecordController>,
    notifier: Arc<Notifier>,
    ocr: OcrSettings,
    runs: Mutex<RunBook>,
}

impl Orchestrator {
    pub fn new(
        structurer: Arc<dyn StructuringService>,
        controller: Arc<RecordController>,
        notifier: Arc<Notifier>,
        ocr: OcrSettings,
    ) -> Self {
        Self {
            structurer,
            controller,
            notifier,
            ocr,
            runs: Mutex::new(RunBook {
                latest: 0,
                status: PipelineStatus {
                    run_id: None,
                    phase: Phase::Idle,
                    reason: None,
                },
            }),
        }
    }

    pub fn status(&self) -> PipelineStatus {
        self.lock_runs().status.clone()
    }

    /// Starts a new run for `file`, superseding any run still in flight.
    ///
    /// The previous record is cleared before this returns. An unsupported format fails
    /// the new run immediately and is also returned to the caller.
    pub fn submit(self: &Arc<Self>, file: UploadedFile) -> Result<RunHandle, PipelineError> {
        let mut book = self.lock_runs();
        if matches!(book.status.phase, Phase::Extracting | Phase::Structuring) {
            info!(run_id = book.latest, "run superseded by a new upload");
        }
        book.latest += 1;
        let run_id = book.latest;
        self.controller.clear();

        let Some(format) = classify(&file.name, &file.mime_type) else {
            let err = PipelineError::UnsupportedFormat {
                name: file.name,
                mime_type: file.mime_type,
            };
            self.fail(&mut book, run_id, &err);
            return Err(err);
        };

        info!(run_id, ?format, name = %file.name, bytes = file.bytes.len(), "run started");
        book.status = PipelineStatus {
            run_id: Some(run_id),
            phase: Phase::Extracting,
            reason: None,
        };
        self.notifier.publish(
            run_id,
            NotificationLevel::Info,
            "Processing file...",
            "Please wait while we extract the text.",
        );
        drop(book);

        let extractor = Extractor::for_format(format, &self.ocr);
        let this = Arc::clone(self);
        let task = tokio::spawn(async move { this.run(run_id, extractor, file).await });
        Ok(RunHandle { run_id, task })
    }

    async fn run(&self, run_id: RunId, extractor: Extractor, file: UploadedFile) -> Phase {
        let outcome = self.execute(run_id, extractor, file).await;

        let mut book = self.lock_runs();
        if book.latest != run_id {
            warn!(run_id, latest = book.latest, "discarding result of superseded run");
            return Phase::Cancelled;
        }

        match outcome {
            Ok(record) => {
                self.controller.replace(record);
                book.status = PipelineStatus {
                    run_id: Some(run_id),
                    phase: Phase::Ready,
                    reason: None,
                };
                info!(run_id, "run ready");
                self.notifier.publish(
                    run_id,
                    NotificationLevel::Info,
                    "Success!",
                    "Your resume has been structured.",
                );
                Phase::Ready
            }
            Err(Interrupt::Failed(err)) => {
                self.fail(&mut book, run_id, &err);
                Phase::Failed
            }
            Err(Interrupt::Superseded) => Phase::Cancelled,
        }
    }

    async fn execute(
        &self,
        run_id: RunId,
        extractor: Extractor,
        file: UploadedFile,
    ) -> Result<StructuredRecord, Interrupt> {
        if extractor.is_slow() {
            self.notify_if_current(
                run_id,
                "Processing image...",
                "This may take a moment.",
            )?;
        }

        let text = match extractor.extract(&file).await {
            ExtractionResult::Text(text) => text,
            ExtractionResult::Failure(reason) => {
                return Err(PipelineError::ExtractionFailure(reason).into())
            }
        };
        drop(file);

        if text.trim().is_empty() {
            return Err(PipelineError::EmptyExtraction.into());
        }

        self.advance(run_id, Phase::Structuring)?;
        self.notify_if_current(
            run_id,
            "Text extracted!",
            "Now structuring the content with AI.",
        )?;

        let response = self
            .structurer
            .structure(StructuringRequest { resume_text: &text })
            .await
            .map_err(|e| PipelineError::StructuringService(e.to_string()))?;

        validate_response(&response).map_err(|report| {
            PipelineError::StructuringService(format!(
                "The response did not match the resume schema: {report}"
            ))
            .into()
        })
    }

    fn advance(&self, run_id: RunId, phase: Phase) -> Result<(), Interrupt> {
        let mut book = self.lock_runs();
        if book.latest != run_id {
            return Err(Interrupt::Superseded);
        }
        book.status.phase = phase;
        Ok(())
    }

    fn notify_if_current(
        &self,
        run_id: RunId,
        title: &str,
        description: &str,
    ) -> Result<(), Interrupt> {
        let book = self.lock_runs();
        if book.latest != run_id {
            return Err(Interrupt::Superseded);
        }
        self.notifier
            .publish(run_id, NotificationLevel::Info, title, description);
        Ok(())
    }

    fn fail(&self, book: &mut RunBook, run_id: RunId, err: &PipelineError) {
        warn!(run_id, error = %err, "run failed");
        book.status = PipelineStatus {
            run_id: Some(run_id),
            phase: Phase::Failed,
            reason: Some(err.to_string()),
        };
        self.notifier
            .publish(run_id, NotificationLevel::Error, err.title(), err.to_string());
    }

    fn lock_runs(&self) -> MutexGuard<'_, RunBook> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;
    use serde_json::{json, Value};
    use tokio::sync::oneshot;

    use crate::ingest::notify::Notification;
    use crate::print::projector::{PrintProjector, SECTION_ORDER};
    use crate::llm_client::LlmError;
    use crate::structuring::StructuringError;

    fn response_for(name: &str, designation: &str) -> Value {
        json!({
            "name": name,
            "designation": designation,
            "nationality": "Not specified",
            "totalExperience": "Not specified",
            "relevantExperience": "Not specified",
            "education": "Not specified",
            "keyCompetencies": "Not specified",
            "personalScorecard": ["Not specified"],
            "professionalExperiences": ["Not specified"],
            "projectExperiences": ["Not specified"]
        })
    }

    /// Derives a record from the first line of the resume text: "Name, Designation".
    struct EchoStructurer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StructuringService for EchoStructurer {
        async fn structure(
            &self,
            request: StructuringRequest<'_>,
        ) -> Result<Value, StructuringError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let line = request.resume_text.lines().next().unwrap_or_default();
            let (name, designation) = line.split_once(',').unwrap_or((line, "Unknown"));
            Ok(response_for(name.trim(), designation.trim()))
        }
    }

    /// Returns a fixed reply (or error) for every call.
    struct FixedStructurer(Result<Value, String>);

    #[async_trait]
    impl StructuringService for FixedStructurer {
        async fn structure(&self, _: StructuringRequest<'_>) -> Result<Value, StructuringError> {
            self.0.clone().map_err(|message| {
                StructuringError::Llm(LlmError::Api {
                    status: 529,
                    message,
                })
            })
        }
    }

    /// Holds each call until the test releases the gate registered for that resume text.
    struct GatedStructurer {
        gates: Mutex<Vec<(String, oneshot::Receiver<()>)>>,
    }

    impl GatedStructurer {
        fn new() -> Self {
            Self {
                gates: Mutex::new(Vec::new()),
            }
        }

        fn gate(&self, text: &str) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().push((text.to_string(), rx));
            tx
        }
    }

    #[async_trait]
    impl StructuringService for GatedStructurer {
        async fn structure(
            &self,
            request: StructuringRequest<'_>,
        ) -> Result<Value, StructuringError> {
            let gate = {
                let mut gates = self.gates.lock().unwrap();
                let pos = gates
                    .iter()
                    .position(|(text, _)| text == request.resume_text)
                    .expect("no gate registered");
                gates.remove(pos).1
            };
            let _ = gate.await;
            Ok(response_for(request.resume_text, "Engineer"))
        }
    }

    fn orchestrator(structurer: Arc<dyn StructuringService>) -> Arc<Orchestrator> {
        Arc::new(Orchestrator::new(
            structurer,
            Arc::new(RecordController::new()),
            Arc::new(Notifier::new()),
            OcrSettings {
                binary: "/nonexistent/vitae-tesseract".into(),
                language: "eng".into(),
            },
        ))
    }

    fn text_file(content: &str) -> UploadedFile {
        UploadedFile {
            bytes: Bytes::from(content.to_string()),
            name: "resume.txt".into(),
            mime_type: "text/plain".into(),
        }
    }

    fn titles(notifications: &[Notification]) -> Vec<&str> {
        notifications.iter().map(|n| n.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_plain_text_end_to_end() {
        let structurer = Arc::new(EchoStructurer {
            calls: AtomicUsize::new(0),
        });
        let orch = orchestrator(structurer.clone());

        let handle = orch.submit(text_file("John Doe, Software Engineer")).unwrap();
        assert_eq!(handle.task.await.unwrap(), Phase::Ready);

        let snapshot = orch.controller.snapshot().unwrap();
        assert!(snapshot.valid);
        assert_eq!(snapshot.record.name, "John Doe");
        assert_eq!(snapshot.record.designation, "Software Engineer");
        assert_eq!(orch.status().phase, Phase::Ready);
        assert_eq!(structurer.calls.load(Ordering::SeqCst), 1);

        let doc = PrintProjector::new("Vitae").project(&snapshot.record).unwrap();
        let positions: Vec<usize> = SECTION_ORDER
            .iter()
            .map(|s| doc.markup().find(&format!("data-section=\"{s}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert_eq!(
            titles(&orch.notifier.recent()),
            vec!["Processing file...", "Text extracted!", "Success!"]
        );
    }

    #[tokio::test]
    async fn test_whitespace_only_text_never_reaches_structuring() {
        for blank in ["", "   ", "\n\t \r\n"] {
            let structurer = Arc::new(EchoStructurer {
                calls: AtomicUsize::new(0),
            });
            let orch = orchestrator(structurer.clone());
            let handle = orch.submit(text_file(blank)).unwrap();
            assert_eq!(handle.task.await.unwrap(), Phase::Failed);

            let status = orch.status();
            assert_eq!(status.phase, Phase::Failed);
            assert_eq!(
                status.reason.as_deref(),
                Some(PipelineError::EmptyExtraction.to_string().as_str())
            );
            assert_eq!(structurer.calls.load(Ordering::SeqCst), 0);
            assert!(orch.controller.snapshot().is_none());
        }
    }

    #[tokio::test]
    async fn test_unsupported_format_fails_run_and_clears_record() {
        let orch = orchestrator(Arc::new(EchoStructurer {
            calls: AtomicUsize::new(0),
        }));
        orch.submit(text_file("Ada Lovelace, Analyst"))
            .unwrap()
            .task
            .await
            .unwrap();
        assert!(orch.controller.snapshot().is_some());

        let err = orch
            .submit(UploadedFile {
                bytes: Bytes::from_static(b"PK"),
                name: "resume.zip".into(),
                mime_type: "application/zip".into(),
            })
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::UnsupportedFormat { .. }));
        assert!(orch.controller.snapshot().is_none());
        assert_eq!(orch.status().phase, Phase::Failed);
        let last = orch.notifier.recent().pop().unwrap();
        assert_eq!(last.level, NotificationLevel::Error);
        assert_eq!(last.title, "Unsupported file");
    }

    #[tokio::test]
    async fn test_service_error_text_is_surfaced() {
        let orch = orchestrator(Arc::new(FixedStructurer(Err(
            "model overloaded".to_string()
        ))));
        let handle = orch.submit(text_file("John Doe")).unwrap();
        assert_eq!(handle.task.await.unwrap(), Phase::Failed);
        let reason = orch.status().reason.unwrap();
        assert!(reason.starts_with("Failed to parse resume."));
        assert!(reason.contains("model overloaded"));
        assert_eq!(orch.notifier.recent().pop().unwrap().title, "Parsing error");
    }

    #[tokio::test]
    async fn test_schema_violation_is_hard_failure() {
        let mut response = response_for("John Doe", "Engineer");
        response.as_object_mut().unwrap().remove("education");
        let orch = orchestrator(Arc::new(FixedStructurer(Ok(response))));
        let handle = orch.submit(text_file("John Doe")).unwrap();
        assert_eq!(handle.task.await.unwrap(), Phase::Failed);
        assert!(orch.status().reason.unwrap().contains("education is required"));
        assert!(orch.controller.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_extraction_failure_is_reported() {
        let orch = orchestrator(Arc::new(EchoStructurer {
            calls: AtomicUsize::new(0),
        }));
        let handle = orch
            .submit(UploadedFile {
                bytes: Bytes::from_static(&[0xc3, 0x28]),
                name: "resume.txt".into(),
                mime_type: "text/plain".into(),
            })
            .unwrap();
        assert_eq!(handle.task.await.unwrap(), Phase::Failed);
        let reason = orch.status().reason.unwrap();
        assert!(reason.starts_with("Could not extract text from the uploaded file."));
    }

    #[tokio::test]
    async fn test_image_announces_slow_path_before_ocr() {
        let orch = orchestrator(Arc::new(EchoStructurer {
            calls: AtomicUsize::new(0),
        }));
        let handle = orch
            .submit(UploadedFile {
                bytes: Bytes::from_static(b"\x89PNG"),
                name: "scan.png".into(),
                mime_type: "image/png".into(),
            })
            .unwrap();
        // The OCR binary does not exist, so the run fails after the announcement.
        assert_eq!(handle.task.await.unwrap(), Phase::Failed);
        assert_eq!(
            titles(&orch.notifier.recent()),
            vec!["Processing file...", "Processing image...", "Extraction failed"]
        );
    }

    #[tokio::test]
    async fn test_newer_run_wins_when_older_finishes_last() {
        let structurer = Arc::new(GatedStructurer::new());
        let release_a = structurer.gate("Alice");
        let release_b = structurer.gate("Bob");
        let orch = orchestrator(structurer.clone());

        let a = orch.submit(text_file("Alice")).unwrap();
        while orch.status().phase != Phase::Structuring {
            tokio::task::yield_now().await;
        }
        let b = orch.submit(text_file("Bob")).unwrap();
        assert!(orch.controller.snapshot().is_none());

        release_b.send(()).unwrap();
        assert_eq!(b.task.await.unwrap(), Phase::Ready);
        release_a.send(()).unwrap();
        assert_eq!(a.task.await.unwrap(), Phase::Cancelled);

        assert_eq!(orch.controller.snapshot().unwrap().record.name, "Bob");
        assert_eq!(orch.status().run_id, Some(b.run_id));
        assert!(orch
            .notifier
            .recent()
            .iter()
            .all(|n| n.run_id == b.run_id || n.title != "Success!"));
    }

    #[tokio::test]
    async fn test_newer_run_wins_when_older_finishes_first() {
        let structurer = Arc::new(GatedStructurer::new());
        let release_a = structurer.gate("Alice");
        let release_b = structurer.gate("Bob");
        let orch = orchestrator(structurer.clone());

        let a = orch.submit(text_file("Alice")).unwrap();
        while orch.status().phase != Phase::Structuring {
            tokio::task::yield_now().await;
        }
        let b = orch.submit(text_file("Bob")).unwrap();

        release_a.send(()).unwrap();
        assert_eq!(a.task.await.unwrap(), Phase::Cancelled);
        assert!(orch.controller.snapshot().is_none());

        release_b.send(()).unwrap();
        assert_eq!(b.task.await.unwrap(), Phase::Ready);
        assert_eq!(orch.controller.snapshot().unwrap().record.name, "Bob");
    }

    #[tokio::test]
    async fn test_run_superseded_while_extracting_is_cancelled() {
        let structurer = Arc::new(GatedStructurer::new());
        let release_b = structurer.gate("Bob");
        let orch = orchestrator(structurer.clone());

        // Submitted back to back: A is still in Extracting when B arrives.
        let a = orch.submit(text_file("Alice")).unwrap();
        let b = orch.submit(text_file("Bob")).unwrap();
        assert!(b.run_id > a.run_id);

        assert_eq!(a.task.await.unwrap(), Phase::Cancelled);
        release_b.send(()).unwrap();
        assert_eq!(b.task.await.unwrap(), Phase::Ready);
        assert_eq!(orch.controller.snapshot().unwrap().record.name, "Bob");
        assert!(orch
            .notifier
            .recent()
            .iter()
            .all(|n| n.run_id == b.run_id || n.title == "Processing file..."));
    }
}
