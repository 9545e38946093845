//! Session controller
//!
//! Owns every piece of session state (documents, upload progress, context
//! source, conversation, notification, health) and changes it only through
//! named transitions. Slow work runs in spawned tasks that report back with a
//! [`SessionEvent`]; events are applied one at a time through `&mut self`, so
//! state never needs a lock.
//!
//! ```text
//! user action ──▶ transition ──▶ spawned read/query/probe/timer
//!                     ▲                         │
//!                     └──── apply(SessionEvent) ◀┘
//! ```

mod dispatch;
mod scheduler;

pub use dispatch::*;
pub use scheduler::*;

use crate::backend::Backend;
use crate::chat::ChatSession;
use crate::config::{Config, IngestConfig, NotificationConfig};
use crate::error::Result;
use crate::health;
use crate::ingest::{self, partition_batch, truncate_display_name, EncodedFile, FileBlob, FormatFilter};
use crate::models::{
    Document, HealthIndicator, MessageGroup, Notification, ProgressStatus, Severity,
    UploadProgressEntry,
};
use crate::notify::NotificationQueue;
use crate::source::{ActiveTag, ContextSource, SourceSelector};
use crate::store::DocumentStore;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Completion of asynchronous work, applied by [`SessionController::apply`]
#[derive(Debug)]
pub enum SessionEvent {
    ReadProgress {
        id: String,
        percent: u8,
    },
    ReadFinished {
        id: String,
        name: String,
        result: Result<EncodedFile>,
    },
    QueryFinished {
        group_id: u64,
        outcome: Result<String>,
    },
    HealthChecked(HealthIndicator),
    NotificationExpired {
        generation: u64,
    },
    ProgressExpired {
        id: String,
    },
}

/// What happened to an ingested batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub accepted: usize,
    pub skipped: usize,
}

/// Serializable projection of the session
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub health: HealthIndicator,
    pub source: ContextSource,
    pub active_tags: Vec<ActiveTag>,
    pub documents: Vec<Document>,
    pub uploads: Vec<UploadProgressEntry>,
    pub messages: Vec<MessageGroup>,
    pub notification: Option<Notification>,
    pub in_flight: bool,
    pub input: String,
}

pub struct SessionController {
    backend: Arc<dyn Backend>,
    ingest_config: IngestConfig,
    notification_config: NotificationConfig,
    filter: FormatFilter,

    documents: DocumentStore,
    uploads: Vec<UploadProgressEntry>,
    selector: SourceSelector,
    chat: ChatSession,
    notifications: NotificationQueue,
    health: HealthIndicator,
    input: String,

    /// Group awaiting an answer; `Some` is the in-flight gate
    in_flight: Option<u64>,
    pending_reads: usize,
    health_started: bool,
    health_pending: bool,

    scheduler: Scheduler,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
}

impl SessionController {
    pub fn new(config: &Config, backend: Arc<dyn Backend>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            ingest_config: config.ingest.clone(),
            notification_config: config.notifications.clone(),
            filter: FormatFilter::from_config(&config.ingest),
            documents: DocumentStore::new(),
            uploads: Vec::new(),
            selector: SourceSelector::new(config.session.default_source),
            chat: ChatSession::new(),
            notifications: NotificationQueue::new(),
            health: HealthIndicator::Checking,
            input: String::new(),
            in_flight: None,
            pending_reads: 0,
            health_started: false,
            health_pending: false,
            scheduler: Scheduler::new(),
            events_tx,
            events_rx,
        }
    }

    // ---- projections ----

    pub fn documents(&self) -> &[Document] {
        self.documents.documents()
    }

    pub fn uploads(&self) -> &[UploadProgressEntry] {
        &self.uploads
    }

    pub fn messages(&self) -> &[MessageGroup] {
        self.chat.groups()
    }

    pub fn message(&self, group_id: u64) -> Option<&MessageGroup> {
        self.chat.get(group_id)
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notifications.current()
    }

    /// Changes every time a notification is raised
    pub fn notification_generation(&self) -> u64 {
        self.notifications.generation()
    }

    pub fn health(&self) -> &HealthIndicator {
        &self.health
    }

    pub fn active_source(&self) -> ContextSource {
        self.selector.active()
    }

    pub fn active_tags(&self) -> Vec<ActiveTag> {
        self.selector.active_tags(self.documents.len())
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether any file read has not reported back yet
    pub fn reads_pending(&self) -> bool {
        self.pending_reads > 0
    }

    /// Whether reads, a query or the health probe are still outstanding
    pub fn is_busy(&self) -> bool {
        self.pending_reads > 0 || self.in_flight.is_some() || self.health_pending
    }

    pub fn scheduled_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            health: self.health.clone(),
            source: self.selector.active(),
            active_tags: self.active_tags(),
            documents: self.documents.documents().to_vec(),
            uploads: self.uploads.clone(),
            messages: self.chat.groups().to_vec(),
            notification: self.notifications.current().cloned(),
            in_flight: self.in_flight(),
            input: self.input.clone(),
        }
    }

    // ---- transitions ----

    /// Launch the one-shot health probe. Later calls do nothing.
    pub fn start(&mut self) {
        if self.health_started {
            return;
        }
        self.health_started = true;
        self.health_pending = true;

        let backend = Arc::clone(&self.backend);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let indicator = health::probe(backend.as_ref()).await;
            let _ = tx.send(SessionEvent::HealthChecked(indicator));
        });
    }

    /// Accept a batch of dropped or picked files
    pub fn ingest(&mut self, batch: Vec<FileBlob>) -> IngestOutcome {
        let (accepted, skipped) = partition_batch(batch, &self.filter);

        if accepted.is_empty() {
            info!(skipped, "Rejected batch with no supported files");
            let message = self.filter.rejection_message();
            self.notify(message, Severity::Error);
            return IngestOutcome {
                accepted: 0,
                skipped,
            };
        }

        let count = accepted.len();
        for blob in accepted {
            self.begin_read(blob);
        }
        info!(accepted = count, skipped, "Ingesting files");

        IngestOutcome {
            accepted: count,
            skipped,
        }
    }

    pub fn select_source(&mut self, source: ContextSource) {
        debug!(%source, "Context source selected");
        self.selector.select(source);
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Remove a registered document
    pub fn remove_document(&mut self, id: &str) -> Result<Document> {
        match self.documents.remove(id) {
            Ok(doc) => {
                info!(id, name = %doc.name, "Removed document");
                let display = truncate_display_name(&doc.name, self.ingest_config.max_display_name_chars);
                self.notify(format!("Removed {}", display), Severity::Info);
                Ok(doc)
            }
            Err(e) => {
                self.notify(e.to_string(), Severity::Error);
                Err(e)
            }
        }
    }

    /// Abort every scheduled cleanup. Reads and queries already issued still
    /// deliver their events.
    pub fn shutdown(&mut self) {
        self.scheduler.cancel_all();
    }

    // ---- event loop ----

    /// Wait for the next event without applying it
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    /// Wait for one event and apply it
    pub async fn step(&mut self) {
        if let Some(event) = self.next_event().await {
            self.apply(event);
        }
    }

    /// Apply events already queued, without waiting
    pub fn pump(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
        }
    }

    /// Apply events until no read, query or probe is outstanding. Scheduled
    /// cleanups are not waited for.
    pub async fn settle(&mut self) {
        while self.is_busy() {
            self.step().await;
        }
        self.pump();
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ReadProgress { id, percent } => {
                if let Some(entry) = self.uploads.iter_mut().find(|e| e.id == id) {
                    if entry.status == ProgressStatus::InProgress {
                        entry.percent = entry.percent.max(percent.min(99));
                    }
                }
            }
            SessionEvent::ReadFinished { id, name, result } => self.finish_read(id, name, result),
            SessionEvent::QueryFinished { group_id, outcome } => self.resolve(group_id, outcome),
            SessionEvent::HealthChecked(indicator) => {
                self.health_pending = false;
                self.health = indicator;
            }
            SessionEvent::NotificationExpired { generation } => {
                // A stale expiry must not forget the task of the newer notice
                if self.notifications.expire(generation) {
                    self.scheduler.finished(&TaskKey::NotificationExpiry);
                }
            }
            SessionEvent::ProgressExpired { id } => {
                self.scheduler.finished(&TaskKey::ProgressRemoval(id.clone()));
                self.uploads
                    .retain(|e| !(e.id == id && e.status == ProgressStatus::Complete));
            }
        }
    }

    // ---- internals ----

    fn notify(&mut self, message: impl Into<String>, severity: Severity) {
        let generation = self.notifications.raise(message, severity);
        self.scheduler.schedule(
            TaskKey::NotificationExpiry,
            self.notification_config.duration(),
            self.events_tx.clone(),
            SessionEvent::NotificationExpired { generation },
        );
    }

    fn begin_read(&mut self, blob: FileBlob) {
        let uploads = &self.uploads;
        let id = self
            .documents
            .fresh_id(|candidate| uploads.iter().any(|e| e.id == candidate));

        self.uploads.push(UploadProgressEntry {
            id: id.clone(),
            name: blob.name.clone(),
            status: ProgressStatus::InProgress,
            percent: 0,
        });
        self.pending_reads += 1;

        let tx = self.events_tx.clone();
        let chunk_bytes = self.ingest_config.read_chunk_bytes;
        tokio::spawn(async move {
            let progress_tx = tx.clone();
            let progress_id = id.clone();
            let result = ingest::read_and_encode(&blob, chunk_bytes, |percent| {
                let _ = progress_tx.send(SessionEvent::ReadProgress {
                    id: progress_id.clone(),
                    percent,
                });
            })
            .await;
            let _ = tx.send(SessionEvent::ReadFinished {
                id,
                name: blob.name,
                result,
            });
        });
    }

    fn finish_read(&mut self, id: String, name: String, result: Result<EncodedFile>) {
        self.pending_reads = self.pending_reads.saturating_sub(1);
        let display = truncate_display_name(&name, self.ingest_config.max_display_name_chars);

        let registered = result.and_then(|encoded| {
            self.documents.insert(Document {
                id: id.clone(),
                name: name.clone(),
                size: encoded.size,
                data: encoded.data,
            })
        });

        match registered {
            Ok(()) => {
                if let Some(entry) = self.uploads.iter_mut().find(|e| e.id == id) {
                    entry.status = ProgressStatus::Complete;
                    entry.percent = 100;
                }
                info!(%id, %name, "Uploaded document");
                self.notify(format!("{} uploaded successfully", display), Severity::Success);
                self.scheduler.schedule(
                    TaskKey::ProgressRemoval(id.clone()),
                    self.ingest_config.progress_clear_delay(),
                    self.events_tx.clone(),
                    SessionEvent::ProgressExpired { id },
                );
            }
            Err(e) => {
                warn!(%name, "Upload failed: {}", e);
                self.uploads.retain(|entry| entry.id != id);
                self.notify(format!("Failed to read {}", display), Severity::Error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::ScriptedBackend;
    use proptest::prelude::*;
    use std::time::Duration;

    fn controller(backend: Arc<ScriptedBackend>) -> SessionController {
        SessionController::new(&Config::default(), backend)
    }

    fn pdf(name: &str) -> FileBlob {
        FileBlob::from_bytes(name, Some("application/pdf"), b"%PDF-1.7 body".to_vec())
    }

    fn text(name: &str) -> FileBlob {
        FileBlob::from_bytes(name, Some("text/plain"), b"plain".to_vec())
    }

    #[tokio::test]
    async fn test_mixed_batch_registers_supported_only() {
        let mut session = controller(Arc::new(ScriptedBackend::new(vec![])));

        let outcome = session.ingest(vec![pdf("a.pdf"), text("b.txt")]);
        assert_eq!(outcome, IngestOutcome { accepted: 1, skipped: 1 });
        assert_eq!(session.uploads().len(), 1);
        assert_eq!(session.uploads()[0].status, ProgressStatus::InProgress);
        assert!(session.notification().is_none());

        session.settle().await;

        assert_eq!(session.documents().len(), 1);
        assert_eq!(session.documents()[0].name, "a.pdf");
        assert_eq!(session.documents()[0].id, session.uploads()[0].id);
        assert_eq!(session.uploads()[0].status, ProgressStatus::Complete);
        assert_eq!(session.uploads()[0].percent, 100);

        let notice = session.notification().unwrap();
        assert_eq!(notice.severity, Severity::Success);
        assert!(notice.message.contains("a.pdf"));
    }

    #[tokio::test]
    async fn test_batch_registers_exactly_supported_count() {
        let mut session = controller(Arc::new(ScriptedBackend::new(vec![])));
        let batch = vec![
            pdf("1.pdf"),
            text("2.txt"),
            pdf("3.pdf"),
            FileBlob::from_bytes("4.PDF", None, vec![1, 2, 3]),
            FileBlob::from_bytes("5.png", Some("image/png"), vec![0]),
        ];

        let outcome = session.ingest(batch);
        session.settle().await;

        assert_eq!(outcome.accepted, 3);
        assert_eq!(session.documents().len(), 3);
        let mut ids: Vec<&str> = session.documents().iter().map(|d| d.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_any_batch_registers_its_supported_files(supported in prop::collection::vec(any::<bool>(), 0..12)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let expected = supported.iter().filter(|s| **s).count();

            let (documents, outcome) = runtime.block_on(async {
                let mut session = controller(Arc::new(ScriptedBackend::new(vec![])));
                let batch = supported
                    .iter()
                    .enumerate()
                    .map(|(i, ok)| if *ok { pdf(&format!("{}.pdf", i)) } else { text(&format!("{}.txt", i)) })
                    .collect();
                let outcome = session.ingest(batch);
                session.settle().await;
                (session.documents().len(), outcome)
            });

            prop_assert_eq!(documents, expected);
            prop_assert_eq!(outcome.accepted, expected);
            prop_assert_eq!(outcome.skipped, supported.len() - expected);
        }
    }

    #[tokio::test]
    async fn test_rejection_names_configured_formats() {
        let mut config = Config::default();
        config.ingest.accepted_extensions = vec!["pdf".to_string(), "epub".to_string()];
        config.ingest.accepted_media_types = Vec::new();
        let mut session =
            SessionController::new(&config, Arc::new(ScriptedBackend::new(vec![])));

        session.ingest(vec![text("notes.txt")]);

        let notice = session.notification().unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert_eq!(notice.message, "Only PDF or EPUB files are supported");
    }

    #[tokio::test]
    async fn test_unsupported_batch_rejected_once() {
        let mut session = controller(Arc::new(ScriptedBackend::new(vec![])));

        let outcome = session.ingest(vec![text("b.txt"), text("c.md")]);
        assert_eq!(outcome, IngestOutcome { accepted: 0, skipped: 2 });
        assert!(!session.is_busy());
        assert!(session.uploads().is_empty());
        assert!(session.documents().is_empty());

        let notice = session.notification().unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.message.contains("PDF"));
    }

    #[tokio::test]
    async fn test_read_failure_leaves_no_trace() {
        let mut session = controller(Arc::new(ScriptedBackend::new(vec![])));

        session.ingest(vec![FileBlob::from_path("/no/such/dir/missing.pdf")]);
        assert_eq!(session.uploads().len(), 1);
        session.settle().await;

        assert!(session.documents().is_empty());
        assert!(session.uploads().is_empty());
        let notice = session.notification().unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.message.contains("missing.pdf"));
    }

    #[tokio::test]
    async fn test_store_order_follows_completion() {
        let mut config = Config::default();
        config.ingest.read_chunk_bytes = 4;
        let mut session = SessionController::new(&config, Arc::new(ScriptedBackend::new(vec![])));

        let slow = FileBlob::from_bytes("slow.pdf", None, vec![0u8; 40]);
        let fast = FileBlob::from_bytes("fast.pdf", None, vec![0u8; 4]);
        session.ingest(vec![slow, fast]);
        session.settle().await;

        let names: Vec<&str> = session.documents().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["fast.pdf", "slow.pdf"]);
    }

    #[tokio::test]
    async fn test_long_names_truncated_in_notice() {
        let mut session = controller(Arc::new(ScriptedBackend::new(vec![])));
        let name = "an_extremely_long_file_name_for_a_conference_paper.pdf";

        session.ingest(vec![pdf(name)]);
        session.settle().await;

        let notice = session.notification().unwrap();
        assert!(!notice.message.contains(name));
        assert!(notice.message.contains("an_extremely_long_file_name_fo..."));
        assert_eq!(session.documents()[0].name, name);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_entry_removed_after_delay() {
        let mut session = controller(Arc::new(ScriptedBackend::new(vec![])));
        session.ingest(vec![pdf("a.pdf")]);
        session.settle().await;
        assert_eq!(session.uploads().len(), 1);

        tokio::time::advance(Duration::from_millis(1600)).await;
        session.step().await;

        assert!(session.uploads().is_empty());
        assert_eq!(session.documents().len(), 1);
        // The notification window (3s) is still open
        assert!(session.notification().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_notification_restarts_window() {
        let mut session = controller(Arc::new(ScriptedBackend::new(vec![])));

        assert!(session.remove_document("first").is_err());
        tokio::time::advance(Duration::from_millis(2000)).await;
        assert!(session.remove_document("second").is_err());

        tokio::time::advance(Duration::from_millis(2000)).await;
        tokio::task::yield_now().await;
        session.pump();
        let notice = session.notification().unwrap();
        assert!(notice.message.contains("second"));

        tokio::time::advance(Duration::from_millis(1100)).await;
        session.step().await;
        assert!(session.notification().is_none());
    }

    #[tokio::test]
    async fn test_remove_document() {
        let mut session = controller(Arc::new(ScriptedBackend::new(vec![])));
        session.ingest(vec![pdf("a.pdf"), pdf("b.pdf")]);
        session.settle().await;

        let id = session.documents()[0].id.clone();
        let removed = session.remove_document(&id).unwrap();
        assert_eq!(session.documents().len(), 1);
        assert!(session.documents().iter().all(|d| d.id != removed.id));
        assert_eq!(session.notification().unwrap().severity, Severity::Info);
    }

    #[tokio::test]
    async fn test_health_probe_runs_once() {
        let backend = Arc::new(ScriptedBackend::new(vec![]).with_label("S3-Bucket"));
        let mut session = controller(backend.clone());
        assert_eq!(*session.health(), HealthIndicator::Checking);

        session.start();
        session.start();
        session.settle().await;
        session.start();
        session.settle().await;

        assert_eq!(backend.health_calls(), 1);
        assert_eq!(
            *session.health(),
            HealthIndicator::Online {
                label: "S3-Bucket".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_health_offline() {
        let mut session = controller(Arc::new(ScriptedBackend::offline()));
        session.start();
        session.settle().await;
        assert_eq!(*session.health(), HealthIndicator::Offline);
    }

    #[tokio::test]
    async fn test_source_switch_and_tags() {
        let mut session = controller(Arc::new(ScriptedBackend::new(vec![])));
        assert_eq!(session.active_source(), ContextSource::Both);
        assert_eq!(session.active_tags(), vec![ActiveTag::ExternalCorpus]);

        session.ingest(vec![pdf("a.pdf")]);
        session.settle().await;
        session.select_source(ContextSource::Uploads);
        assert_eq!(session.active_tags(), vec![ActiveTag::Uploads { count: 1 }]);

        let view = session.view();
        assert_eq!(view.source, ContextSource::Uploads);
        assert_eq!(view.documents.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_scheduled_tasks() {
        let mut session = controller(Arc::new(ScriptedBackend::new(vec![])));
        session.ingest(vec![pdf("a.pdf")]);
        session.settle().await;
        assert!(session.scheduled_tasks() >= 2);

        session.shutdown();
        assert_eq!(session.scheduled_tasks(), 0);
    }
}
