pub mod cache;

use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use serde::Serialize;
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::libs::layout::LayoutParams;
use crate::libs::pipeline::{self, Stage};
use cache::ResultCache;

/// Jobs older than this are evicted opportunistically on each start call.
pub const JOB_TTL: Duration = Duration::from_secs(3600);
// Progress channel capacity; the publisher drops updates when full.
const CHANNEL_CAPACITY: usize = 256;
// Subscriber poll timeout; bounds how long a handler can sit suspended
// before re-checking the done flag.
const SUBSCRIBE_POLL: Duration = Duration::from_millis(200);

/// One progress update as published to subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEvent {
    fn new(stage: Stage, progress: f64) -> Self {
        Self {
            stage,
            progress,
            error: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: Stage::Error,
            progress: 0.0,
            error: Some(message.into()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Server-push wire form: `data: <json>\n\n`.
    pub fn to_sse(&self) -> String {
        format!(
            "data: {}\n\n",
            serde_json::to_string(self).unwrap_or_default()
        )
    }
}

/// A background graph build. The worker thread only touches its own
/// record: the outcome field transitions write-once (worker) to read-many
/// (handlers), which `OnceLock` publishes safely.
pub struct Job {
    pub id: String,
    created_at: Instant,
    tx: Sender<ProgressEvent>,
    rx: Receiver<ProgressEvent>,
    // Scratch files delete themselves when the job record drops
    input: NamedTempFile,
    result: NamedTempFile,
    outcome: OnceLock<Result<(), String>>,
}

impl Job {
    // Nonblocking publish; updates are dropped under pressure, the
    // terminal event is recoverable from `outcome`.
    fn post(&self, stage: Stage, progress: f64) {
        let _ = self.tx.try_send(ProgressEvent::new(stage, progress));
    }

    fn post_failed(&self, message: &str) {
        let _ = self.tx.try_send(ProgressEvent::failed(message));
    }

    pub fn is_done(&self) -> bool {
        self.outcome.get().is_some()
    }
}

/// Outcome of a result fetch.
#[derive(Debug)]
pub enum JobResult {
    Ready(Vec<u8>),
    NotReady,
    NotFound,
    Failed(String),
}

/// Process-wide job table plus the worker spawn/evict logic. All map
/// mutations happen on caller threads; workers hold an `Arc` to their own
/// record only.
pub struct Orchestrator {
    jobs: Mutex<HashMap<String, Arc<Job>>>,
    params: LayoutParams,
    cache: Option<ResultCache>,
}

impl Orchestrator {
    pub fn new(params: LayoutParams) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            params,
            cache: None,
        }
    }

    /// Consult (and fill) an on-disk result cache before computing.
    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Register a job, spool the input to disk, spawn its worker thread
    /// and return the fresh job id immediately.
    pub fn start(&self, mut input: impl Read) -> anyhow::Result<String> {
        self.evict_expired();

        let mut input_file = NamedTempFile::new()?;
        std::io::copy(&mut input, input_file.as_file_mut())?;

        let (tx, rx) = bounded(CHANNEL_CAPACITY);
        let job = Arc::new(Job {
            id: Uuid::new_v4().to_string(),
            created_at: Instant::now(),
            tx,
            rx,
            input: input_file,
            result: NamedTempFile::new()?,
            outcome: OnceLock::new(),
        });

        self.jobs
            .lock()
            .unwrap()
            .insert(job.id.clone(), Arc::clone(&job));

        let worker_job = Arc::clone(&job);
        let params = self.params.clone();
        let cache = self.cache.clone();
        std::thread::Builder::new()
            .name(format!("treegl-job-{}", &job.id[..8]))
            .spawn(move || run_worker(worker_job, params, cache))?;

        log::info!("started job {}", job.id);
        Ok(job.id.clone())
    }

    /// Subscribe to a job's progress events. For a job that already
    /// finished, the stream yields exactly one synthesized terminal event.
    pub fn subscribe(&self, job_id: &str) -> Option<ProgressStream> {
        let job = self.jobs.lock().unwrap().get(job_id).cloned()?;
        let late = job.is_done();
        Some(ProgressStream {
            rx: job.rx.clone(),
            job,
            late,
            finished: false,
        })
    }

    /// Fetch the compressed payload of a finished job.
    pub fn result(&self, job_id: &str) -> JobResult {
        let job = match self.jobs.lock().unwrap().get(job_id).cloned() {
            Some(job) => job,
            None => return JobResult::NotFound,
        };

        match job.outcome.get() {
            None => JobResult::NotReady,
            Some(Err(message)) => JobResult::Failed(message.clone()),
            Some(Ok(())) => match std::fs::read(job.result.path()) {
                Ok(bytes) => JobResult::Ready(bytes),
                Err(e) => JobResult::Failed(e.to_string()),
            },
        }
    }

    fn evict_expired(&self) {
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        // Dropping the Arc releases the job's temp files
        jobs.retain(|_, job| job.created_at.elapsed() < JOB_TTL);
        let evicted = before - jobs.len();
        if evicted > 0 {
            log::info!("evicted {} expired jobs", evicted);
        }
    }
}

fn run_worker(job: Arc<Job>, params: LayoutParams, cache: Option<ResultCache>) {
    let outcome = compute(&job, &params, cache.as_ref());
    match outcome {
        Ok(()) => {
            // Outcome is set before the terminal event so a subscriber
            // finding the channel empty can synthesize it
            let _ = job.outcome.set(Ok(()));
            job.post(Stage::Complete, 100.0);
        }
        Err(message) => {
            log::error!("job {} failed: {}", job.id, message);
            let _ = job.outcome.set(Err(message.clone()));
            job.post_failed(&message);
        }
    }
}

fn compute(job: &Job, params: &LayoutParams, cache: Option<&ResultCache>) -> Result<(), String> {
    job.post(Stage::Reading, 0.0);
    let text = std::fs::read_to_string(job.input.path()).map_err(|e| e.to_string())?;

    if let Some(cache) = cache {
        if cache
            .fetch(text.as_bytes(), job.result.path())
            .map_err(|e| e.to_string())?
        {
            log::info!("job {}: cache hit", job.id);
            return Ok(());
        }
    }

    let sink = job.result.reopen().map_err(|e| e.to_string())?;
    pipeline::run_to_sink(&text, params, sink, &mut |stage, p| job.post(stage, p))
        .map_err(|e| e.to_string())?;

    if let Some(cache) = cache {
        if let Err(e) = cache.store(text.as_bytes(), job.result.path()) {
            log::warn!("job {}: cache store failed: {}", job.id, e);
        }
    }
    Ok(())
}

/// Iterator over a job's progress events. Polls the channel with a bounded
/// timeout and checks the done flag whenever the channel is empty, so the
/// final terminal event always arrives even when the channel dropped it.
pub struct ProgressStream {
    job: Arc<Job>,
    rx: Receiver<ProgressEvent>,
    late: bool,
    finished: bool,
}

impl Iterator for ProgressStream {
    type Item = ProgressEvent;

    fn next(&mut self) -> Option<ProgressEvent> {
        if self.finished {
            return None;
        }
        if self.late {
            self.finished = true;
            return self.job.outcome.get().map(synthesize_terminal);
        }

        loop {
            match self.rx.recv_timeout(SUBSCRIBE_POLL) {
                Ok(event) => {
                    if event.is_terminal() {
                        self.finished = true;
                    }
                    return Some(event);
                }
                Err(RecvTimeoutError::Timeout) => {
                    if let Some(outcome) = self.job.outcome.get() {
                        // Drain anything the worker raced in after the flag
                        if let Ok(event) = self.rx.try_recv() {
                            if event.is_terminal() {
                                self.finished = true;
                            }
                            return Some(event);
                        }
                        self.finished = true;
                        return Some(synthesize_terminal(outcome));
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.finished = true;
                    return self.job.outcome.get().map(synthesize_terminal);
                }
            }
        }
    }
}

fn synthesize_terminal(outcome: &Result<(), String>) -> ProgressEvent {
    match outcome {
        Ok(()) => ProgressEvent::new(Stage::Complete, 100.0),
        Err(message) => ProgressEvent::failed(message.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Cursor;

    fn wait_result(orch: &Orchestrator, id: &str) -> JobResult {
        for _ in 0..500 {
            match orch.result(id) {
                JobResult::NotReady => std::thread::sleep(Duration::from_millis(10)),
                other => return other,
            }
        }
        panic!("job {} did not finish in time", id);
    }

    fn decode(bytes: &[u8]) -> serde_json::Value {
        let mut text = String::new();
        GzDecoder::new(bytes).read_to_string(&mut text).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn test_job_end_to_end() {
        let orch = Orchestrator::new(LayoutParams::default());
        let id = orch.start(Cursor::new("(A:1,B:2);")).unwrap();

        let events: Vec<ProgressEvent> = orch.subscribe(&id).unwrap().collect();
        let last = events.last().unwrap();
        assert_eq!(last.stage, Stage::Complete);
        assert_eq!(last.progress, 100.0);
        // Stage progression is monotonic even if individual updates drop
        let stages: Vec<Stage> = events.iter().map(|e| e.stage).collect();
        assert!(stages.contains(&Stage::Complete));

        match wait_result(&orch, &id) {
            JobResult::Ready(bytes) => {
                let value = decode(&bytes);
                // 3 logical nodes + 3 bends + 2 markers
                assert_eq!(value["nodes"].as_array().unwrap().len(), 8);
                assert_eq!(value["links"].as_array().unwrap().len(), 7);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_job_error_event() {
        let orch = Orchestrator::new(LayoutParams::default());
        let id = orch.start(Cursor::new("(A,B")).unwrap();

        let events: Vec<ProgressEvent> = orch.subscribe(&id).unwrap().collect();
        let last = events.last().unwrap();
        assert_eq!(last.stage, Stage::Error);
        assert!(last.error.as_ref().unwrap().contains("MalformedInput"));

        match wait_result(&orch, &id) {
            JobResult::Failed(message) => assert!(message.contains("MalformedInput")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_late_subscription_synthesizes_terminal() {
        let orch = Orchestrator::new(LayoutParams::default());
        let id = orch.start(Cursor::new("(A:1,B:2);")).unwrap();
        wait_result(&orch, &id);

        let events: Vec<ProgressEvent> = orch.subscribe(&id).unwrap().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].stage, Stage::Complete);
    }

    #[test]
    fn test_unknown_job() {
        let orch = Orchestrator::new(LayoutParams::default());
        assert!(matches!(orch.result("nope"), JobResult::NotFound));
        assert!(orch.subscribe("nope").is_none());
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::open(dir.path()).unwrap();
        let orch = Orchestrator::new(LayoutParams::default()).with_cache(cache);

        let id1 = orch.start(Cursor::new("(A:1,B:2);")).unwrap();
        let first = match wait_result(&orch, &id1) {
            JobResult::Ready(bytes) => bytes,
            other => panic!("unexpected result: {:?}", other),
        };

        let id2 = orch.start(Cursor::new("(A:1,B:2);")).unwrap();
        let second = match wait_result(&orch, &id2) {
            JobResult::Ready(bytes) => bytes,
            other => panic!("unexpected result: {:?}", other),
        };
        assert_eq!(first, second);
    }

    #[test]
    fn test_event_sse_shape() {
        let ev = ProgressEvent::new(Stage::Parsing, 12.5);
        assert_eq!(
            ev.to_sse(),
            "data: {\"stage\":\"parsing\",\"progress\":12.5}\n\n"
        );

        let ev = ProgressEvent::failed("boom");
        assert!(ev.to_sse().contains("\"error\":\"boom\""));
    }
}
