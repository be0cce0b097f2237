//! Client-side interaction recorder.
//!
//! Records which content type the learner opens, keeps the history in a
//! durable store and, once the learner has been quiet for the debounce window,
//! asks the classifier for their favourite type. All failures are absorbed
//! here; callers only ever see the current preference.

mod client;
mod debounce;
mod store;

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::RecorderConfig;
use crate::content::ContentType;

pub use client::{ClassifierClient, ClassifyRequest, HttpClassifierClient, CLASSIFY_PATH};
pub use debounce::DebounceState;
pub use store::{FileStore, InteractionStore, MemoryStore, STORAGE_KEY};

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("classifier returned HTTP {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("unexpected preference label: {0:?}")]
    UnexpectedLabel(String),
}

struct Session {
    log: Vec<ContentType>,
    debounce: DebounceState,
    generation: u64,
}

struct Inner {
    window: Duration,
    store: Arc<dyn InteractionStore>,
    client: Arc<dyn ClassifierClient>,
    session: Mutex<Session>,
    preference: watch::Sender<Option<ContentType>>,
}

/// Session-scoped recorder context. Must be created and used inside a Tokio
/// runtime. Dropping it cancels the pending timer.
pub struct InteractionRecorder {
    inner: Arc<Inner>,
}

impl InteractionRecorder {
    /// Restores the durable log and, when one was found, classifies it right
    /// away without waiting for the debounce window.
    pub fn start(
        config: &RecorderConfig,
        store: Arc<dyn InteractionStore>,
        client: Arc<dyn ClassifierClient>,
    ) -> Self {
        let restored = restore_log(store.as_ref());
        let (preference, _) = watch::channel(None);

        let inner = Arc::new(Inner {
            window: config.debounce_window,
            store,
            client,
            session: Mutex::new(Session {
                log: restored.clone().unwrap_or_default(),
                debounce: DebounceState::Idle,
                generation: 0,
            }),
            preference,
        });

        if let Some(log) = restored {
            info!(count = log.len(), "restored interaction log, classifying");
            let weak = Arc::downgrade(&inner);
            tokio::spawn(async move {
                classify_and_apply(weak, log).await;
            });
        }

        Self { inner }
    }

    /// File-backed store plus HTTP classifier, both from `config`.
    pub fn from_config(config: &RecorderConfig) -> Self {
        let store = Arc::new(FileStore::new(config.store_dir.clone()));
        let client = Arc::new(HttpClassifierClient::new(
            &config.classifier_base_url,
            config.request_timeout,
        ));
        Self::start(config, store, client)
    }

    /// Appends `kind`, rewrites the durable record and restarts the debounce
    /// window. Never blocks on the network.
    pub fn log_interaction(&self, kind: ContentType) {
        let inner = &self.inner;
        let mut session = inner.session.lock();

        session.log.push(kind);
        match serde_json::to_string(&session.log) {
            Ok(json) => {
                if let Err(err) = inner.store.save(STORAGE_KEY, &json) {
                    warn!(error = %err, "failed to persist interaction log");
                }
            }
            Err(err) => warn!(error = %err, "failed to encode interaction log"),
        }

        session.generation += 1;
        let generation = session.generation;
        let deadline = Instant::now() + inner.window;
        let weak = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            fire(weak, generation).await;
        });
        session.debounce.schedule(generation, deadline, handle);

        debug!(%kind, count = session.log.len(), "interaction logged");
    }

    pub fn preference(&self) -> Option<ContentType> {
        *self.inner.preference.borrow()
    }

    pub fn is_preferred(&self, kind: ContentType) -> bool {
        self.preference() == Some(kind)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ContentType>> {
        self.inner.preference.subscribe()
    }

    pub fn interactions(&self) -> Vec<ContentType> {
        self.inner.session.lock().log.clone()
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.inner.session.lock().debounce.deadline()
    }

    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for InteractionRecorder {
    fn drop(&mut self) {
        self.inner.session.lock().debounce.cancel();
    }
}

fn restore_log(store: &dyn InteractionStore) -> Option<Vec<ContentType>> {
    let raw = match store.load(STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(error = %err, "failed to read stored interactions");
            return None;
        }
    };

    match serde_json::from_str::<Vec<ContentType>>(&raw) {
        Ok(log) => Some(log),
        Err(err) => {
            warn!(error = %err, "failed to parse stored interactions");
            None
        }
    }
}

async fn fire(weak: Weak<Inner>, generation: u64) {
    let snapshot = {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let mut session = inner.session.lock();
        if !session.debounce.begin_firing(generation) {
            return;
        }
        session.log.clone()
    };

    classify_and_apply(weak.clone(), snapshot).await;

    if let Some(inner) = weak.upgrade() {
        inner.session.lock().debounce.finish_firing();
    }
}

async fn classify_and_apply(weak: Weak<Inner>, interactions: Vec<ContentType>) {
    let Some(client) = weak.upgrade().map(|inner| Arc::clone(&inner.client)) else {
        return;
    };

    let count = interactions.len();
    let result = client.classify(interactions).await;

    let Some(inner) = weak.upgrade() else {
        debug!("recorder closed before classification returned");
        return;
    };

    match result.and_then(|reply| parse_label(&reply)) {
        Ok(label) => {
            inner.preference.send_replace(Some(label));
            info!(%label, count, "preference updated");
        }
        Err(err) => warn!(error = %err, count, "preference update skipped"),
    }
}

/// First line of the reply, stripped of surrounding punctuation.
fn parse_label(reply: &str) -> Result<ContentType, RecorderError> {
    let first_line = reply.trim().lines().next().unwrap_or_default();
    let word = first_line.trim_matches(|c: char| !c.is_ascii_alphabetic());
    word.parse()
        .map_err(|_| RecorderError::UnexpectedLabel(reply.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use proptest::prelude::*;
    use ContentType::*;

    struct FakeClient {
        reply: Mutex<Result<String, ()>>,
        calls: Mutex<Vec<(Instant, Vec<ContentType>)>>,
    }

    impl FakeClient {
        fn new(reply: Result<&str, ()>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(reply.map(str::to_string)),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn set_reply(&self, reply: Result<&str, ()>) {
            *self.reply.lock() = reply.map(str::to_string);
        }

        fn calls(&self) -> Vec<(Instant, Vec<ContentType>)> {
            self.calls.lock().clone()
        }
    }

    impl ClassifierClient for FakeClient {
        fn classify(&self, interactions: Vec<ContentType>) -> BoxFuture<'_, Result<String, RecorderError>> {
            self.calls.lock().push((Instant::now(), interactions));
            let reply = self.reply.lock().clone();
            Box::pin(async move {
                reply.map_err(|_| RecorderError::HttpStatus(reqwest::StatusCode::INTERNAL_SERVER_ERROR))
            })
        }
    }

    fn config() -> RecorderConfig {
        RecorderConfig {
            debounce_window: Duration::from_secs(120),
            ..RecorderConfig::default()
        }
    }

    fn recorder_with(
        record: Option<&str>,
        reply: Result<&str, ()>,
    ) -> (InteractionRecorder, Arc<MemoryStore>, Arc<FakeClient>) {
        let store = Arc::new(match record {
            Some(value) => MemoryStore::with_record(STORAGE_KEY, value),
            None => MemoryStore::new(),
        });
        let client = FakeClient::new(reply);
        let recorder = InteractionRecorder::start(&config(), store.clone(), client.clone());
        (recorder, store, client)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    async fn advance(secs: u64) {
        tokio::time::advance(Duration::from_secs(secs)).await;
        settle().await;
    }

    /// Store whose disk is gone: every read and write fails.
    struct BrokenStore;

    impl InteractionStore for BrokenStore {
        fn load(&self, _key: &str) -> Result<Option<String>, RecorderError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "store unreadable").into())
        }

        fn save(&self, _key: &str, _value: &str) -> Result<(), RecorderError> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into())
        }
    }

    fn stored(store: &MemoryStore) -> Vec<ContentType> {
        serde_json::from_str(&store.get(STORAGE_KEY).unwrap()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_durable_record_follows_every_append() {
        let (recorder, store, _client) = recorder_with(None, Ok("audio"));

        recorder.log_interaction(Written);
        assert_eq!(stored(&store), vec![Written]);

        recorder.log_interaction(Audio);
        recorder.log_interaction(Written);
        assert_eq!(stored(&store), vec![Written, Audio, Written]);
        assert_eq!(recorder.interactions(), vec![Written, Audio, Written]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_coalesces_burst_into_one_call() {
        let start = Instant::now();
        let (recorder, _store, client) = recorder_with(None, Ok("visual"));

        recorder.log_interaction(Written);
        advance(30).await;
        recorder.log_interaction(Visual);
        advance(60).await;
        recorder.log_interaction(Visual);
        assert_eq!(recorder.pending_deadline(), Some(start + Duration::from_secs(210)));

        advance(30).await;
        assert!(client.calls().is_empty(), "no call at 120s");

        advance(89).await;
        assert!(client.calls().is_empty(), "no call before 210s");

        tokio::time::advance(Duration::from_millis(1_005)).await;
        settle().await;
        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        let fired_after = calls[0].0 - start;
        assert!(fired_after >= Duration::from_secs(210));
        assert!(fired_after < Duration::from_millis(210_050));
        assert_eq!(calls[0].1, vec![Written, Visual, Visual]);
        assert_eq!(recorder.preference(), Some(Visual));
        assert!(recorder.pending_deadline().is_none());

        advance(240).await;
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_is_full_history_not_delta() {
        let (recorder, _store, client) = recorder_with(None, Ok("audio"));

        recorder.log_interaction(Audio);
        advance(121).await;
        recorder.log_interaction(Written);
        advance(121).await;

        let calls = client.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1, vec![Audio]);
        assert_eq!(calls[1].1, vec![Audio, Written]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cold_start_classifies_immediately() {
        let (recorder, _store, client) =
            recorder_with(Some(r#"["audio","audio","visual"]"#), Ok("audio"));
        settle().await;

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, vec![Audio, Audio, Visual]);
        assert_eq!(recorder.interactions(), vec![Audio, Audio, Visual]);
        assert_eq!(recorder.preference(), Some(Audio));
        assert!(recorder.is_preferred(Audio));
        assert!(!recorder.is_preferred(Visual));
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_record_does_not_classify() {
        let (recorder, _store, client) = recorder_with(None, Ok("audio"));
        settle().await;

        assert!(client.calls().is_empty());
        assert!(recorder.interactions().is_empty());
        assert_eq!(recorder.preference(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_record_starts_empty() {
        let (recorder, _store, client) = recorder_with(Some("{not json"), Ok("audio"));
        settle().await;

        assert!(recorder.interactions().is_empty());
        assert_eq!(recorder.preference(), None);
        assert!(client.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_label_in_record_starts_empty() {
        let (recorder, _store, client) = recorder_with(Some(r#"["audio","kinesthetic"]"#), Ok("audio"));
        settle().await;

        assert!(recorder.interactions().is_empty());
        assert!(client.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_store_starts_empty() {
        let client = FakeClient::new(Ok("audio"));
        let recorder = InteractionRecorder::start(&config(), Arc::new(BrokenStore), client.clone());
        settle().await;

        assert!(recorder.interactions().is_empty());
        assert_eq!(recorder.preference(), None);
        assert!(client.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_write_failure_still_schedules_classification() {
        let client = FakeClient::new(Ok("audio"));
        let recorder = InteractionRecorder::start(&config(), Arc::new(BrokenStore), client.clone());

        recorder.log_interaction(Audio);
        assert_eq!(recorder.interactions(), vec![Audio]);
        assert!(recorder.pending_deadline().is_some());

        advance(121).await;
        let calls: Vec<_> = client.calls().into_iter().map(|(_, batch)| batch).collect();
        assert_eq!(calls, vec![vec![Audio]]);
        assert_eq!(recorder.preference(), Some(Audio));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_classification_keeps_previous_label() {
        let (recorder, _store, client) = recorder_with(Some(r#"["written"]"#), Ok("written"));
        settle().await;
        assert_eq!(recorder.preference(), Some(Written));

        client.set_reply(Err(()));
        recorder.log_interaction(Audio);
        advance(121).await;

        assert_eq!(client.calls().len(), 2);
        assert_eq!(recorder.preference(), Some(Written));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_reply_keeps_previous_label() {
        let (recorder, _store, client) = recorder_with(None, Ok("kinesthetic"));

        recorder.log_interaction(Audio);
        advance(121).await;

        assert_eq!(client.calls().len(), 1);
        assert_eq!(recorder.preference(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_reads_are_stable() {
        let (recorder, _store, _client) = recorder_with(Some(r#"["visual"]"#), Ok("visual"));
        settle().await;

        let first = recorder.preference();
        for _ in 0..5 {
            assert_eq!(recorder.preference(), first);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_audio_scenario_updates_subscribers() {
        let (recorder, _store, client) = recorder_with(None, Ok("audio"));
        let mut updates = recorder.subscribe();

        for _ in 0..3 {
            recorder.log_interaction(Audio);
        }
        advance(121).await;
        settle().await;

        assert_eq!(client.calls()[0].1, vec![Audio, Audio, Audio]);
        assert!(updates.has_changed().unwrap());
        assert_eq!(*updates.borrow_and_update(), Some(Audio));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_timer() {
        let (recorder, _store, client) = recorder_with(None, Ok("audio"));

        recorder.log_interaction(Visual);
        recorder.shutdown();
        advance(300).await;

        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_file_backed_recorder_survives_unreachable_classifier() {
        let dir = tempfile::tempdir().unwrap();
        FileStore::new(dir.path())
            .save(STORAGE_KEY, r#"["written","audio"]"#)
            .unwrap();

        let config = RecorderConfig {
            debounce_window: Duration::from_secs(120),
            classifier_base_url: "http://127.0.0.1:9".to_string(),
            request_timeout: Duration::from_secs(2),
            store_dir: dir.path().to_path_buf(),
        };
        let recorder = InteractionRecorder::from_config(&config);
        assert_eq!(recorder.interactions(), vec![Written, Audio]);

        recorder.log_interaction(Visual);
        let persisted = FileStore::new(dir.path()).load(STORAGE_KEY).unwrap().unwrap();
        assert_eq!(persisted, r#"["written","audio","visual"]"#);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(recorder.preference(), None);
    }

    #[test]
    fn test_parse_label_normalizes_reply() {
        assert_eq!(parse_label("audio").unwrap(), Audio);
        assert_eq!(parse_label(" Visual.\nvisual: 80, audio: 20").unwrap(), Visual);
        assert_eq!(parse_label("\"written\"").unwrap(), Written);
        assert!(matches!(
            parse_label("I think audio"),
            Err(RecorderError::UnexpectedLabel(_))
        ));
        assert!(parse_label("").is_err());
    }

    proptest! {
        #[test]
        fn prop_durable_record_matches_call_order(picks in prop::collection::vec(0usize..3, 1..40)) {
            let kinds: Vec<ContentType> = picks.iter().map(|i| ContentType::ALL[*i]).collect();
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .start_paused(true)
                .build()
                .unwrap();

            let persisted = runtime.block_on(async {
                let (recorder, store, _client) = recorder_with(None, Ok("audio"));
                for kind in &kinds {
                    recorder.log_interaction(*kind);
                }
                stored(&store)
            });

            prop_assert_eq!(persisted, kinds);
        }
    }
}
