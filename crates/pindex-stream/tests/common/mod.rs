//! Shared fakes for partition stream tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use pindex_stream::{PIndexManager, PartitionIndex, PartitionState, StreamSender};
use pindex_types::{EngineError, IndexEngine, StreamSettings};

/// Calls observed by [`RecordingEngine`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Index(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
    DeleteAll,
    GetInternal(Vec<u8>),
    SetInternal(Vec<u8>, Vec<u8>),
    Close,
}

/// In-memory engine that records every call.
#[derive(Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
    docs: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    internal: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    /// Keys whose operations fail
    failing: Mutex<HashSet<Vec<u8>>>,
    closed: AtomicBool,
    /// Close releases everything but still reports an error
    fail_close: AtomicBool,
    close_count: AtomicUsize,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_key(&self, key: &[u8]) {
        self.failing.lock().unwrap().insert(key.to_vec());
    }

    pub fn fail_close(&self) {
        self.fail_close.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than close.
    pub fn write_calls(&self) -> Vec<EngineCall> {
        self.calls()
            .into_iter()
            .filter(|c| *c != EngineCall::Close)
            .collect()
    }

    pub fn doc(&self, id: impl AsRef<[u8]>) -> Option<Vec<u8>> {
        self.docs.lock().unwrap().get(id.as_ref()).cloned()
    }

    pub fn doc_count(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, key: &[u8]) -> Result<(), EngineError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EngineError::Closed);
        }
        if self.failing.lock().unwrap().contains(key) {
            return Err(EngineError::Backend(format!(
                "injected failure for {}",
                String::from_utf8_lossy(key)
            )));
        }
        Ok(())
    }
}

impl IndexEngine for RecordingEngine {
    fn index(&self, id: &[u8], doc: &[u8]) -> Result<(), EngineError> {
        self.record(EngineCall::Index(id.to_vec(), doc.to_vec()));
        self.check(id)?;
        self.docs.lock().unwrap().insert(id.to_vec(), doc.to_vec());
        Ok(())
    }

    fn delete(&self, id: &[u8]) -> Result<(), EngineError> {
        self.record(EngineCall::Delete(id.to_vec()));
        self.check(id)?;
        self.docs.lock().unwrap().remove(id);
        Ok(())
    }

    fn delete_all(&self) -> Result<(), EngineError> {
        self.record(EngineCall::DeleteAll);
        self.check(b"")?;
        self.docs.lock().unwrap().clear();
        Ok(())
    }

    fn get_internal(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        self.record(EngineCall::GetInternal(key.to_vec()));
        self.check(key)?;
        Ok(self.internal.lock().unwrap().get(key).cloned())
    }

    fn set_internal(&self, key: &[u8], value: &[u8]) -> Result<(), EngineError> {
        self.record(EngineCall::SetInternal(key.to_vec(), value.to_vec()));
        self.check(key)?;
        self.internal
            .lock()
            .unwrap()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    /// Counts every call so double closes show up in tests.
    fn close(&self) -> Result<(), EngineError> {
        self.closed.store(true, Ordering::SeqCst);
        self.record(EngineCall::Close);
        self.close_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(EngineError::Backend("injected close failure".to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Manager that records calls and can wait for a rollback acknowledgement.
#[derive(Default)]
pub struct RecordingManager {
    close_calls: AtomicUsize,
    kicks: Mutex<Vec<String>>,
    /// Signalled by the test once the rollback requester got its reply
    ack: Mutex<Option<oneshot::Receiver<()>>>,
    acked_before_close: AtomicBool,
    state_during_close: Mutex<Option<PartitionState>>,
    path_gone_during_close: AtomicBool,
}

impl RecordingManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make `close_pindex` wait until the returned sender fires.
    ///
    /// Stands in for a manager that has to stop the feed before it can
    /// finish closing the partition.
    pub fn gate_close_on_ack(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.ack.lock().unwrap() = Some(rx);
        tx
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn kicks(&self) -> Vec<String> {
        self.kicks.lock().unwrap().clone()
    }

    pub fn acked_before_close(&self) -> bool {
        self.acked_before_close.load(Ordering::SeqCst)
    }

    pub fn state_during_close(&self) -> Option<PartitionState> {
        *self.state_during_close.lock().unwrap()
    }

    pub fn path_gone_during_close(&self) -> bool {
        self.path_gone_during_close.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PIndexManager for RecordingManager {
    async fn close_pindex(&self, pindex: &Arc<PartitionIndex>) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        *self.state_during_close.lock().unwrap() = Some(pindex.state());
        self.path_gone_during_close
            .store(!pindex.path().exists(), Ordering::SeqCst);

        let ack = self.ack.lock().unwrap().take();
        if let Some(ack) = ack {
            let acked = tokio::time::timeout(Duration::from_secs(5), ack).await;
            self.acked_before_close
                .store(matches!(acked, Ok(Ok(()))), Ordering::SeqCst);
        }
    }

    fn kick(&self, reason: &str) {
        self.kicks.lock().unwrap().push(reason.to_string());
    }
}

/// A partition backed by a [`RecordingEngine`] with a real directory.
pub struct Fixture {
    pub _temp_dir: tempfile::TempDir,
    pub path: PathBuf,
    pub engine: Arc<RecordingEngine>,
    pub manager: Arc<RecordingManager>,
    pub pindex: Arc<PartitionIndex>,
    pub sender: StreamSender,
}

impl Fixture {
    pub fn new(index_type: &str, mailbox_capacity: usize) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("p0");
        std::fs::create_dir_all(&path).expect("Failed to create partition dir");
        std::fs::write(path.join("segment"), b"data").expect("Failed to write partition file");

        let engine = RecordingEngine::new();
        let manager = RecordingManager::new();
        let (pindex, sender) = PartitionIndex::new(
            "p0",
            index_type,
            &path,
            engine.clone(),
            mailbox_capacity,
        );

        Self {
            _temp_dir: temp_dir,
            path,
            engine,
            manager,
            pindex,
            sender,
        }
    }

    pub fn path_exists(&self) -> bool {
        Path::new(&self.path).exists()
    }
}

pub fn init_tracing() {
    let settings = StreamSettings {
        log_level: "warn".to_string(),
        ..Default::default()
    };
    // Already installed by an earlier test in this binary.
    let _ = pindex_stream::init_tracing(&settings);
}
