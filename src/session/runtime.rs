// Session runtime: one task owns the controller. Front ends send intents and
// read snapshots; network completions and timers come back as events.

use super::{Completion, SessionController, SessionSnapshot};
use crate::clipboard::ClipboardWriter;
use crate::summary::{
    SummaryError, SummaryLength, SummaryRequest, SummaryResponse, SummaryTransport,
};
use crate::upload::SelectedFile;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use uuid::Uuid;

#[derive(Debug)]
pub enum Intent {
    SelectFile(SelectedFile),
    SetSummaryLength(SummaryLength),
    Clear,
    Submit,
    CopyResult,
}

enum Event {
    Completed {
        generation: u64,
        request_id: Uuid,
        outcome: Result<SummaryResponse, SummaryError>,
    },
    RevertCopyFeedback {
        stamp: u64,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("Session runtime has stopped")]
pub struct SessionClosed;

#[derive(Clone)]
pub struct SessionHandle {
    intents: mpsc::UnboundedSender<Intent>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub fn send(&self, intent: Intent) -> Result<(), SessionClosed> {
        self.intents.send(intent).map_err(|_| SessionClosed)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Resolve once a published snapshot satisfies `predicate`.
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<SessionSnapshot, SessionClosed>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(|snap| predicate(snap))
            .await
            .map_err(|_| SessionClosed)?;
        Ok(snapshot.clone())
    }
}

pub struct SessionRuntime {
    controller: SessionController,
    transport: Arc<dyn SummaryTransport>,
    clipboard: Arc<dyn ClipboardWriter>,
    copy_feedback_delay: Duration,
    snapshots: watch::Sender<SessionSnapshot>,
    events: mpsc::UnboundedSender<Event>,
    copy_timer: Option<JoinHandle<()>>,
}

impl SessionRuntime {
    /// Start the session task. It stops once every [`SessionHandle`] is dropped.
    pub fn spawn(
        controller: SessionController,
        transport: Arc<dyn SummaryTransport>,
        clipboard: Arc<dyn ClipboardWriter>,
        copy_feedback_delay: Duration,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

        tracing::info!("Session runtime started (transport: {})", transport.name());

        let runtime = Self {
            controller,
            transport,
            clipboard,
            copy_feedback_delay,
            snapshots: snapshot_tx,
            events: event_tx,
            copy_timer: None,
        };
        let task = tokio::spawn(runtime.run(intent_rx, event_rx));

        (
            SessionHandle {
                intents: intent_tx,
                snapshots: snapshot_rx,
            },
            task,
        )
    }

    async fn run(
        mut self,
        mut intents: mpsc::UnboundedReceiver<Intent>,
        mut events: mpsc::UnboundedReceiver<Event>,
    ) {
        loop {
            tokio::select! {
                intent = intents.recv() => match intent {
                    Some(intent) => self.handle_intent(intent),
                    None => break,
                },
                Some(event) = events.recv() => self.handle_event(event),
            }
        }

        self.cancel_copy_timer();
        tracing::info!("Session runtime stopped");
    }

    fn handle_intent(&mut self, intent: Intent) {
        match intent {
            Intent::SelectFile(file) => {
                self.cancel_copy_timer();
                self.controller.select_file(file);
            }
            Intent::SetSummaryLength(length) => self.controller.set_summary_length(length),
            Intent::Clear => {
                self.cancel_copy_timer();
                self.controller.clear();
            }
            Intent::Submit => {
                if let Ok(pending) = self.controller.submit() {
                    // Publish the cleared in-flight state before the request starts.
                    self.publish();
                    self.spawn_request(pending.generation, pending.request_id, pending.request);
                }
            }
            Intent::CopyResult => self.copy_result(),
        }
        self.publish();
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Completed {
                generation,
                request_id,
                outcome,
            } => {
                if self.controller.complete(generation, outcome) == Completion::Stale {
                    tracing::debug!("Response for request {} arrived after reset", request_id);
                    return;
                }
                tracing::info!("Request {} finished", request_id);
            }
            Event::RevertCopyFeedback { stamp } => {
                if !self.controller.revert_copy_feedback(stamp) {
                    return;
                }
                self.copy_timer = None;
            }
        }
        self.publish();
    }

    fn spawn_request(&self, generation: u64, request_id: Uuid, request: SummaryRequest) {
        let transport = self.transport.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = transport.summarize(&request).await;
            let _ = events.send(Event::Completed {
                generation,
                request_id,
                outcome,
            });
        });
    }

    fn copy_result(&mut self) {
        let Some(ticket) = self.controller.copy_result() else {
            return;
        };

        // The label flips whether or not the write succeeds.
        let clipboard = self.clipboard.clone();
        let text = ticket.text;
        tokio::task::spawn_blocking(move || {
            if let Err(e) = clipboard.write_text(&text) {
                tracing::warn!("Copy to clipboard failed: {}", e);
            }
        });

        if self.cancel_copy_timer() {
            tracing::debug!("Copy feedback timer rescheduled");
        }

        let events = self.events.clone();
        let delay = self.copy_feedback_delay;
        let stamp = ticket.stamp;
        self.copy_timer = Some(tokio::spawn(async move {
            sleep(delay).await;
            let _ = events.send(Event::RevertCopyFeedback { stamp });
        }));
    }

    fn cancel_copy_timer(&mut self) -> bool {
        match self.copy_timer.take() {
            Some(timer) => {
                timer.abort();
                true
            }
            None => false,
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.controller.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::{ClipboardError, MemoryClipboard};
    use crate::session::{CopyFeedback, SubmissionState};
    use crate::upload::DocumentKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;
    use tokio::time::timeout;

    const COPY_DELAY: Duration = Duration::from_millis(2000);

    type Responder = Box<dyn Fn() -> Result<SummaryResponse, SummaryError> + Send + Sync>;

    struct FakeTransport {
        requests: Mutex<Vec<SummaryRequest>>,
        respond: Responder,
    }

    impl FakeTransport {
        fn new(respond: Responder) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                respond,
            })
        }

        fn summary(text: &'static str) -> Arc<Self> {
            Self::new(Box::new(move || {
                Ok(SummaryResponse {
                    summary: text.to_string(),
                    original_text_length: Some(42),
                })
            }))
        }

        fn requests(&self) -> Vec<SummaryRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SummaryTransport for FakeTransport {
        async fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResponse, SummaryError> {
            self.requests.lock().unwrap().push(request.clone());
            (self.respond)()
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    /// Holds every request until `release` is called.
    struct GatedTransport {
        started: AtomicUsize,
        finished: AtomicUsize,
        gate: Notify,
    }

    #[async_trait]
    impl SummaryTransport for GatedTransport {
        async fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResponse, SummaryError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(SummaryResponse {
                summary: format!("summary of {}", request.file.name),
                original_text_length: None,
            })
        }

        fn name(&self) -> &str {
            "gated"
        }
    }

    fn pdf(name: &str) -> SelectedFile {
        SelectedFile::new(name, DocumentKind::Pdf, b"%PDF-1.4 test".to_vec())
    }

    /// Clipboard that takes a while to accept each write.
    struct SlowClipboard {
        delay: Duration,
        inner: MemoryClipboard,
    }

    impl ClipboardWriter for SlowClipboard {
        fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
            std::thread::sleep(self.delay);
            self.inner.write_text(text)
        }
    }

    struct BrokenClipboard {
        attempts: AtomicUsize,
    }

    impl ClipboardWriter for BrokenClipboard {
        fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(ClipboardError::WriteFailed("selection owner went away".to_string()))
        }
    }

    fn start(
        transport: Arc<dyn SummaryTransport>,
        clipboard: Arc<dyn ClipboardWriter>,
    ) -> SessionHandle {
        let (handle, _task) = SessionRuntime::spawn(
            SessionController::default(),
            transport,
            clipboard,
            COPY_DELAY,
        );
        handle
    }

    async fn wait(
        handle: &SessionHandle,
        predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> SessionSnapshot {
        timeout(Duration::from_secs(10), handle.wait_for(predicate))
            .await
            .expect("snapshot condition not reached")
            .expect("session closed")
    }

    #[tokio::test]
    async fn submit_without_file_makes_no_request() {
        let transport = FakeTransport::summary("unused");
        let handle = start(transport.clone(), Arc::new(MemoryClipboard::new()));

        handle.send(Intent::Submit).unwrap();
        let snap = wait(&handle, |s| s.error.is_some()).await;

        assert_eq!(snap.error.as_deref(), Some("Please upload a file first."));
        assert_eq!(snap.status, SubmissionState::Idle);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn submit_sends_one_request_and_stores_summary() {
        let transport = FakeTransport::summary("Example summary.");
        let handle = start(transport.clone(), Arc::new(MemoryClipboard::new()));

        handle.send(Intent::SelectFile(pdf("report.pdf"))).unwrap();
        handle.send(Intent::SetSummaryLength(SummaryLength::Short)).unwrap();
        handle.send(Intent::Submit).unwrap();
        let snap = wait(&handle, |s| s.status == SubmissionState::Succeeded).await;

        assert_eq!(snap.summary_text(), Some("Example summary."));
        assert_eq!(snap.result.as_ref().unwrap().original_text_length, Some(42));
        assert_eq!(snap.error, None);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].file.name, "report.pdf");
        assert_eq!(requests[0].summary_length, SummaryLength::Short);
    }

    #[tokio::test]
    async fn failure_detail_reaches_snapshot() {
        let transport = FakeTransport::new(Box::new(|| {
            Err(SummaryError::Http {
                status: 413,
                detail: Some("File too large.".to_string()),
            })
        }));
        let handle = start(transport, Arc::new(MemoryClipboard::new()));

        handle.send(Intent::SelectFile(pdf("huge.pdf"))).unwrap();
        handle.send(Intent::Submit).unwrap();
        let snap = wait(&handle, |s| s.status == SubmissionState::Failed).await;

        assert_eq!(snap.error.as_deref(), Some("Error: File too large."));
        assert_eq!(snap.result, None);
    }

    #[tokio::test(start_paused = true)]
    async fn new_file_mid_flight_does_not_cancel_request_but_drops_its_result() {
        let transport = Arc::new(GatedTransport {
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            gate: Notify::new(),
        });
        let handle = start(transport.clone(), Arc::new(MemoryClipboard::new()));

        handle.send(Intent::SelectFile(pdf("old.pdf"))).unwrap();
        handle.send(Intent::Submit).unwrap();
        wait(&handle, |s| s.status == SubmissionState::InFlight).await;

        handle.send(Intent::SelectFile(pdf("new.pdf"))).unwrap();
        let snap = wait(&handle, |s| {
            s.file.as_ref().map(|f| f.name.as_str()) == Some("new.pdf")
        })
        .await;
        assert_eq!(snap.status, SubmissionState::Idle);
        assert_eq!(snap.result, None);
        assert_eq!(snap.error, None);

        transport.gate.notify_one();
        sleep(Duration::from_millis(50)).await;

        assert_eq!(transport.started.load(Ordering::SeqCst), 1);
        assert_eq!(transport.finished.load(Ordering::SeqCst), 1);
        let snap = handle.snapshot();
        assert_eq!(snap.result, None);
        assert_eq!(snap.status, SubmissionState::Idle);
        assert_eq!(snap.file.unwrap().name, "new.pdf");
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_state_is_published_before_completion() {
        let transport = Arc::new(GatedTransport {
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            gate: Notify::new(),
        });
        let handle = start(transport.clone(), Arc::new(MemoryClipboard::new()));

        handle.send(Intent::SelectFile(pdf("a.pdf"))).unwrap();
        handle.send(Intent::Submit).unwrap();
        let snap = wait(&handle, |s| s.status == SubmissionState::InFlight).await;
        assert!(!snap.can_submit());

        handle.send(Intent::Submit).unwrap();
        sleep(Duration::from_millis(50)).await;
        assert_eq!(transport.started.load(Ordering::SeqCst), 1);

        transport.gate.notify_one();
        let snap = wait(&handle, |s| s.status == SubmissionState::Succeeded).await;
        assert_eq!(snap.summary_text(), Some("summary of a.pdf"));
    }

    #[tokio::test]
    async fn copy_without_summary_writes_nothing() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let handle = start(FakeTransport::summary("unused"), clipboard.clone());

        handle.send(Intent::CopyResult).unwrap();
        handle.send(Intent::SetSummaryLength(SummaryLength::Long)).unwrap();
        let snap = wait(&handle, |s| s.summary_length == SummaryLength::Long).await;

        assert_eq!(snap.copy_feedback, CopyFeedback::Copy);
        assert!(clipboard.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn copy_label_reverts_once_after_last_copy() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let handle = start(FakeTransport::summary("Example summary."), clipboard.clone());

        handle.send(Intent::SelectFile(pdf("a.pdf"))).unwrap();
        handle.send(Intent::Submit).unwrap();
        wait(&handle, |s| s.status == SubmissionState::Succeeded).await;

        handle.send(Intent::CopyResult).unwrap();
        let snap = wait(&handle, |s| s.copy_feedback == CopyFeedback::Copied).await;
        assert_eq!(snap.copy_feedback.label(), "Copied!");

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(handle.snapshot().copy_feedback, CopyFeedback::Copied);
        assert_eq!(clipboard.last().as_deref(), Some("Example summary."));

        // Second copy at t=1.5s pushes the reversion to t=3.5s.
        handle.send(Intent::CopyResult).unwrap();
        sleep(Duration::from_millis(1000)).await;
        assert_eq!(handle.snapshot().copy_feedback, CopyFeedback::Copied);
        assert_eq!(clipboard.writes().len(), 2);

        sleep(Duration::from_millis(1100)).await;
        assert_eq!(handle.snapshot().copy_feedback, CopyFeedback::Copy);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_resets_copy_label_immediately() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let handle = start(FakeTransport::summary("text"), clipboard);

        handle.send(Intent::SelectFile(pdf("a.pdf"))).unwrap();
        handle.send(Intent::Submit).unwrap();
        wait(&handle, |s| s.status == SubmissionState::Succeeded).await;
        handle.send(Intent::CopyResult).unwrap();
        wait(&handle, |s| s.copy_feedback == CopyFeedback::Copied).await;

        handle.send(Intent::Clear).unwrap();
        let snap = wait(&handle, |s| s.file.is_none()).await;

        assert_eq!(snap.copy_feedback, CopyFeedback::Copy);
        assert_eq!(snap.result, None);
        assert_eq!(snap.summary_length, SummaryLength::Medium);
    }

    #[tokio::test]
    async fn slow_clipboard_does_not_hold_up_the_session() {
        let clipboard = Arc::new(SlowClipboard {
            delay: Duration::from_millis(500),
            inner: MemoryClipboard::new(),
        });
        let handle = start(FakeTransport::summary("Example summary."), clipboard.clone());

        handle.send(Intent::SelectFile(pdf("a.pdf"))).unwrap();
        handle.send(Intent::Submit).unwrap();
        wait(&handle, |s| s.status == SubmissionState::Succeeded).await;

        handle.send(Intent::CopyResult).unwrap();
        handle.send(Intent::SetSummaryLength(SummaryLength::Long)).unwrap();
        let snap = timeout(
            Duration::from_millis(200),
            handle.wait_for(|s| s.summary_length == SummaryLength::Long),
        )
        .await
        .expect("length change waited on the clipboard write")
        .expect("session closed");
        assert_eq!(snap.copy_feedback, CopyFeedback::Copied);

        timeout(Duration::from_secs(5), async {
            while clipboard.inner.writes().is_empty() {
                sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("clipboard write never landed");
        assert_eq!(clipboard.inner.last().as_deref(), Some("Example summary."));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_clipboard_write_still_shows_copied_then_reverts() {
        let clipboard = Arc::new(BrokenClipboard {
            attempts: AtomicUsize::new(0),
        });
        let handle = start(FakeTransport::summary("Example summary."), clipboard.clone());

        handle.send(Intent::SelectFile(pdf("a.pdf"))).unwrap();
        handle.send(Intent::Submit).unwrap();
        wait(&handle, |s| s.status == SubmissionState::Succeeded).await;

        handle.send(Intent::CopyResult).unwrap();
        let snap = wait(&handle, |s| s.copy_feedback == CopyFeedback::Copied).await;
        assert_eq!(snap.copy_feedback.label(), "Copied!");

        sleep(Duration::from_millis(1900)).await;
        assert_eq!(clipboard.attempts.load(Ordering::SeqCst), 1);
        assert_eq!(handle.snapshot().copy_feedback, CopyFeedback::Copied);

        sleep(Duration::from_millis(200)).await;
        let snap = handle.snapshot();
        assert_eq!(snap.copy_feedback, CopyFeedback::Copy);
        assert_eq!(snap.summary_text(), Some("Example summary."));
    }
}
