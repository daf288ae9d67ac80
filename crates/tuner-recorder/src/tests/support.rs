//! In-memory collaborators and a harness driving a session under test.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use crate::{
    CaptionTrack, Channel, ChannelCatalog, ChannelHandle, CoreResult, ProgramCatalog,
    ProgramMetadata, ProgramUri, RecordedProgramHandle, RecordedProgramRecord,
    RecordedProgramStore, RecorderListener, RecordingErrorCode, SampleRecorder,
    SampleRecorderFactory, SessionCallback, SessionConfig, SessionDeps, SessionFacade,
    SourceEventSink, StorageSufficiencyOracle, TunerSource, TunerSourceManager,
};

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    time::Duration,
};

use tempfile::TempDir;
use tokio::{sync::mpsc, time::Instant};

pub(crate) const NEWS_CHANNEL: &str = "content://tv/channel/7";
pub(crate) const NEWS_CHANNEL_ID: u64 = 7;
pub(crate) const PROHIBITED_CHANNEL: &str = "content://tv/channel/9";
pub(crate) const EVENING_NEWS: &str = "content://tv/program/1001";
pub(crate) const LATE_MOVIE: &str = "content://tv/program/1002";

/// Samples the fake recorder claims to have written.
pub(crate) const FAKE_BYTES_WRITTEN: u64 = 188 * 4_096;

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub(crate) fn evening_news() -> ProgramMetadata {
    ProgramMetadata {
        channel_id: NEWS_CHANNEL_ID,
        title: Some("Evening News".to_string()),
        description: Some("Headlines and weather".to_string()),
        start_time_utc_millis: Some(1_700_000_000_000),
        end_time_utc_millis: Some(1_700_001_800_000),
        ..ProgramMetadata::default()
    }
}

pub(crate) fn late_movie() -> ProgramMetadata {
    ProgramMetadata {
        channel_id: NEWS_CHANNEL_ID,
        title: Some("Late Movie".to_string()),
        start_time_utc_millis: Some(1_700_010_000_000),
        end_time_utc_millis: Some(1_700_017_200_000),
        ..ProgramMetadata::default()
    }
}

/// What the session reported through its callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallbackEvent {
    Tuned(ChannelHandle),
    RecordFinished(RecordedProgramHandle),
    Error(RecordingErrorCode),
}

struct ChannelRecorder {
    events_tx: mpsc::UnboundedSender<CallbackEvent>,
}

impl SessionCallback for ChannelRecorder {
    fn on_tuned(&self, channel: &ChannelHandle) {
        let _ = self.events_tx.send(CallbackEvent::Tuned(channel.clone()));
    }

    fn on_record_finished(&self, recording: &RecordedProgramHandle) {
        let _ = self
            .events_tx
            .send(CallbackEvent::RecordFinished(recording.clone()));
    }

    fn on_error(&self, code: RecordingErrorCode) {
        let _ = self.events_tx.send(CallbackEvent::Error(code));
    }
}

pub(crate) struct FakeChannels {
    channels: HashMap<ChannelHandle, Channel>,
}

impl Default for FakeChannels {
    fn default() -> Self {
        let channels = [
            Channel {
                id: NEWS_CHANNEL_ID,
                handle: ChannelHandle::new(NEWS_CHANNEL),
                display_name: "News 7".to_string(),
                recording_prohibited: false,
            },
            Channel {
                id: 9,
                handle: ChannelHandle::new(PROHIBITED_CHANNEL),
                display_name: "Premium 9".to_string(),
                recording_prohibited: true,
            },
        ]
        .into_iter()
        .map(|channel| (channel.handle.clone(), channel))
        .collect();

        Self { channels }
    }
}

impl ChannelCatalog for FakeChannels {
    fn resolve(&self, handle: &ChannelHandle) -> Option<Channel> {
        self.channels.get(handle).cloned()
    }
}

pub(crate) struct FakeStorage {
    sufficient: AtomicBool,
    root: PathBuf,
}

impl FakeStorage {
    pub(crate) fn set_sufficient(&self, sufficient: bool) {
        self.sufficient.store(sufficient, Ordering::SeqCst);
    }
}

impl StorageSufficiencyOracle for FakeStorage {
    fn is_sufficient(&self) -> bool {
        self.sufficient.load(Ordering::SeqCst)
    }

    fn recording_root_directory(&self) -> PathBuf {
        self.root.clone()
    }
}

struct FakeSource {
    id: u64,
}

impl TunerSource for FakeSource {
    fn source_id(&self) -> u64 {
        self.id
    }
}

#[derive(Default)]
pub(crate) struct FakeTuners {
    busy_attempts: AtomicU32,
    acquired_at: Mutex<Vec<Instant>>,
    sinks: Mutex<Vec<SourceEventSink>>,
    released: AtomicU32,
}

impl FakeTuners {
    /// Fail the next `attempts` acquisitions.
    pub(crate) fn busy_for(&self, attempts: u32) {
        self.busy_attempts.store(attempts, Ordering::SeqCst);
    }

    pub(crate) fn acquire_times(&self) -> Vec<Instant> {
        self.acquired_at.lock().unwrap().clone()
    }

    pub(crate) fn acquire_count(&self) -> usize {
        self.acquired_at.lock().unwrap().len()
    }

    pub(crate) fn release_count(&self) -> u32 {
        self.released.load(Ordering::SeqCst)
    }

    pub(crate) fn last_sink(&self) -> SourceEventSink {
        self.sinks.lock().unwrap().last().cloned().unwrap()
    }
}

impl TunerSourceManager for FakeTuners {
    fn acquire(&self, _channel: &Channel, events: SourceEventSink) -> Option<Box<dyn TunerSource>> {
        let mut acquired_at = self.acquired_at.lock().unwrap();
        acquired_at.push(Instant::now());

        let busy = self
            .busy_attempts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if busy {
            return None;
        }

        self.sinks.lock().unwrap().push(events);
        Some(Box::new(FakeSource {
            id: acquired_at.len() as u64,
        }))
    }

    fn release(&self, _source: Box<dyn TunerSource>) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// How the next recorder built by [`FakeRecorders`] behaves.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RecorderPlan {
    pub(crate) not_ready_polls: u32,
    pub(crate) fail_prepare: bool,
    /// Position reported on release, in microseconds of extracted content.
    pub(crate) position_on_release: Option<u64>,
    /// When false the test reports completion itself through the listener.
    pub(crate) complete_on_release: bool,
}

impl Default for RecorderPlan {
    fn default() -> Self {
        Self {
            not_ready_polls: 0,
            fail_prepare: false,
            position_on_release: Some(30_000_000),
            complete_on_release: true,
        }
    }
}

/// Test-side view of one fake recorder.
pub(crate) struct RecorderSpy {
    pub(crate) storage_dir: PathBuf,
    pub(crate) listener: RecorderListener,
    prepare_calls: AtomicU32,
    started: AtomicBool,
    released: AtomicBool,
}

impl RecorderSpy {
    pub(crate) fn prepare_calls(&self) -> u32 {
        self.prepare_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub(crate) fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

struct FakeRecorder {
    spy: Arc<RecorderSpy>,
    plan: RecorderPlan,
    polls_left: u32,
}

impl SampleRecorder for FakeRecorder {
    fn prepare(&mut self) -> io::Result<bool> {
        self.spy.prepare_calls.fetch_add(1, Ordering::SeqCst);
        if self.plan.fail_prepare {
            return Err(io::Error::other("sample sink unavailable"));
        }
        if self.polls_left > 0 {
            self.polls_left -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    fn start(&mut self) {
        fs::write(self.spy.storage_dir.join("samples.ts"), b"\x47\x00\x11\x10").unwrap();
        self.spy.started.store(true, Ordering::SeqCst);
    }

    fn release(&mut self) {
        self.spy.released.store(true, Ordering::SeqCst);
        if self.spy.started() && self.plan.complete_on_release {
            self.spy
                .listener
                .on_completion(true, self.plan.position_on_release);
        }
    }

    fn bytes_written(&self) -> u64 {
        if self.spy.started() { FAKE_BYTES_WRITTEN } else { 0 }
    }
}

#[derive(Default)]
pub(crate) struct FakeRecorders {
    plan: Mutex<RecorderPlan>,
    spies: Mutex<Vec<Arc<RecorderSpy>>>,
}

impl FakeRecorders {
    pub(crate) fn set_plan(&self, plan: RecorderPlan) {
        *self.plan.lock().unwrap() = plan;
    }

    pub(crate) fn last(&self) -> Arc<RecorderSpy> {
        self.spies.lock().unwrap().last().cloned().unwrap()
    }

    pub(crate) fn count(&self) -> usize {
        self.spies.lock().unwrap().len()
    }
}

impl SampleRecorderFactory for FakeRecorders {
    fn create(
        &self,
        _source: &dyn TunerSource,
        storage_dir: &Path,
        listener: RecorderListener,
    ) -> Box<dyn SampleRecorder> {
        let plan = *self.plan.lock().unwrap();
        let spy = Arc::new(RecorderSpy {
            storage_dir: storage_dir.to_path_buf(),
            listener,
            prepare_calls: AtomicU32::new(0),
            started: AtomicBool::new(false),
            released: AtomicBool::new(false),
        });
        self.spies.lock().unwrap().push(Arc::clone(&spy));

        Box::new(FakeRecorder {
            spy,
            plan,
            polls_left: plan.not_ready_polls,
        })
    }
}

pub(crate) struct FakePrograms {
    by_uri: HashMap<ProgramUri, ProgramMetadata>,
    overlapping: Option<ProgramMetadata>,
    queries: Mutex<Vec<(u64, i64, i64)>>,
}

impl Default for FakePrograms {
    fn default() -> Self {
        let by_uri = [
            (ProgramUri::new(EVENING_NEWS), evening_news()),
            (ProgramUri::new(LATE_MOVIE), late_movie()),
        ]
        .into_iter()
        .collect();

        Self {
            by_uri,
            overlapping: Some(evening_news()),
            queries: Mutex::new(Vec::new()),
        }
    }
}

impl FakePrograms {
    pub(crate) fn overlapping_queries(&self) -> Vec<(u64, i64, i64)> {
        self.queries.lock().unwrap().clone()
    }
}

impl ProgramCatalog for FakePrograms {
    fn program(&self, uri: &ProgramUri) -> Option<ProgramMetadata> {
        self.by_uri.get(uri).cloned()
    }

    fn query_overlapping(
        &self,
        channel_id: u64,
        start_utc_millis: i64,
        end_utc_millis: i64,
    ) -> Option<ProgramMetadata> {
        self.queries
            .lock()
            .unwrap()
            .push((channel_id, start_utc_millis, end_utc_millis));
        self.overlapping.clone()
    }
}

#[derive(Default)]
pub(crate) struct FakeStore {
    failing: AtomicBool,
    records: Mutex<Vec<RecordedProgramRecord>>,
}

impl FakeStore {
    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn records(&self) -> Vec<RecordedProgramRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl RecordedProgramStore for FakeStore {
    fn insert(&self, record: &RecordedProgramRecord) -> Option<RecordedProgramHandle> {
        if self.failing.load(Ordering::SeqCst) {
            return None;
        }
        let mut records = self.records.lock().unwrap();
        records.push(record.clone());
        Some(RecordedProgramHandle::new(format!(
            "content://tv/recorded_program/{}",
            records.len()
        )))
    }
}

type Spawner = fn(SessionDeps, Arc<dyn SessionCallback>, SessionConfig) -> CoreResult<SessionFacade>;

/// A session wired to fakes, plus the fakes themselves.
pub(crate) struct Harness {
    pub(crate) facade: SessionFacade,
    pub(crate) events: mpsc::UnboundedReceiver<CallbackEvent>,
    pub(crate) storage: Arc<FakeStorage>,
    pub(crate) tuners: Arc<FakeTuners>,
    pub(crate) recorders: Arc<FakeRecorders>,
    pub(crate) programs: Arc<FakePrograms>,
    pub(crate) store: Arc<FakeStore>,
    pub(crate) root: TempDir,
}

impl Harness {
    /// Session on the test runtime with default timings.
    pub(crate) fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub(crate) fn with_config(config: SessionConfig) -> Self {
        Self::build(config, SessionFacade::spawn_in_runtime)
    }

    /// Session on its own worker thread.
    pub(crate) fn on_dedicated_thread() -> Self {
        Self::build(SessionConfig::default(), SessionFacade::spawn)
    }

    fn build(config: SessionConfig, spawn: Spawner) -> Self {
        init_tracing();

        let root = TempDir::new().unwrap();
        let storage = Arc::new(FakeStorage {
            sufficient: AtomicBool::new(true),
            root: root.path().to_path_buf(),
        });
        let tuners = Arc::new(FakeTuners::default());
        let recorders = Arc::new(FakeRecorders::default());
        let programs = Arc::new(FakePrograms::default());
        let store = Arc::new(FakeStore::default());

        let deps = SessionDeps {
            input_id: "tuner.input/HW1".to_string(),
            channels: Arc::new(FakeChannels::default()),
            storage: Arc::clone(&storage) as Arc<dyn StorageSufficiencyOracle>,
            tuners: Arc::clone(&tuners) as Arc<dyn TunerSourceManager>,
            recorders: Arc::clone(&recorders) as Arc<dyn SampleRecorderFactory>,
            programs: Arc::clone(&programs) as Arc<dyn ProgramCatalog>,
            store: Arc::clone(&store) as Arc<dyn RecordedProgramStore>,
        };

        let (events_tx, events) = mpsc::unbounded_channel();
        let callback: Arc<dyn SessionCallback> = Arc::new(ChannelRecorder { events_tx });
        let facade = spawn(deps, callback, config).unwrap();

        Self {
            facade,
            events,
            storage,
            tuners,
            recorders,
            programs,
            store,
            root,
        }
    }

    /// Next callback, failing the test if none arrives within an hour of
    /// (possibly paused) runtime time.
    pub(crate) async fn next_event(&mut self) -> CallbackEvent {
        tokio::time::timeout(Duration::from_secs(3_600), self.events.recv())
            .await
            .expect("no session callback within an hour")
            .expect("callback channel closed")
    }

    /// Assert no callback arrives for `window`. A terminated session, whose
    /// callback has been dropped, counts as quiet.
    pub(crate) async fn assert_quiet(&mut self, window: Duration) {
        if let Ok(Some(event)) = tokio::time::timeout(window, self.events.recv()).await {
            panic!("unexpected session callback: {:?}", event);
        }
    }

    pub(crate) async fn tune_news(&mut self) {
        self.facade.tune(ChannelHandle::new(NEWS_CHANNEL));
        assert_eq!(
            self.next_event().await,
            CallbackEvent::Tuned(ChannelHandle::new(NEWS_CHANNEL))
        );
    }

    /// Release and wait until the worker and its background jobs are done.
    pub(crate) async fn shutdown(&self) {
        self.facade.release();
        self.facade.terminated().await;
    }

    /// Recording directories currently under the storage root.
    pub(crate) fn recording_dirs(&self) -> Vec<PathBuf> {
        fs::read_dir(self.root.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.is_dir())
            .collect()
    }
}

pub(crate) fn caption_tracks() -> Vec<CaptionTrack> {
    vec![
        CaptionTrack {
            service_number: 1,
            language: Some("eng".to_string()),
            digital: true,
            easy_reader: false,
        },
        CaptionTrack {
            service_number: 2,
            language: Some("spa".to_string()),
            digital: true,
            easy_reader: false,
        },
    ]
}
