//! In-memory fakes of the core ports, shared by the unit tests.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use tripmate_types::chat::RoomId;
use tripmate_types::error::{HttpError, RealtimeError};
use tripmate_types::plan::PlanArtifact;

use crate::http::{ApiRequest, HttpTransport, Method, RawResponse};
use crate::plan::PlanSource;
use crate::realtime::{Publish, RealtimeLink, RealtimeTransport};

type Handler = dyn Fn(&ApiRequest, Option<&str>) -> Result<RawResponse, HttpError> + Send + Sync;

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

/// HTTP transport answering from a closure and recording every call.
pub(crate) struct FakeHttp {
    handler: Box<Handler>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    delay: Duration,
}

impl FakeHttp {
    pub fn new(
        handler: impl Fn(&ApiRequest, Option<&str>) -> Result<RawResponse, HttpError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Arc::default(),
            delay: Duration::ZERO,
        }
    }

    /// Every response is delivered after `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<RecordedCall>>> {
        self.calls.clone()
    }
}

impl HttpTransport for FakeHttp {
    fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> impl Future<Output = Result<RawResponse, HttpError>> + Send {
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method,
            path: request.path.clone(),
            bearer: bearer.map(str::to_string),
            body: request.body.clone(),
        });
        let result = (self.handler)(request, bearer);
        let delay = self.delay;
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }
}

/// The test's side of a `RealtimeLink`.
pub(crate) struct LinkPeer {
    pub inbound: mpsc::Sender<String>,
    pub outbound: mpsc::Receiver<Publish>,
    pub shutdown: CancellationToken,
}

pub(crate) fn link_pair() -> (RealtimeLink, LinkPeer) {
    let (inbound_tx, inbound_rx) = mpsc::channel(32);
    let (outbound_tx, outbound_rx) = mpsc::channel(32);
    let shutdown = CancellationToken::new();
    let link = RealtimeLink {
        inbound: inbound_rx,
        outbound: outbound_tx,
        shutdown: shutdown.clone(),
    };
    let peer = LinkPeer {
        inbound: inbound_tx,
        outbound: outbound_rx,
        shutdown,
    };
    (link, peer)
}

/// Realtime transport handing out pre-scripted connection outcomes.
#[derive(Default)]
pub(crate) struct FakeRealtime {
    outcomes: Mutex<VecDeque<Result<RealtimeLink, RealtimeError>>>,
    pub connects: Mutex<Vec<RoomId>>,
}

impl FakeRealtime {
    /// Script a successful connection and return the peer end.
    pub fn accept(&self) -> LinkPeer {
        let (link, peer) = link_pair();
        self.outcomes.lock().unwrap().push_back(Ok(link));
        peer
    }

    pub fn reject(&self, error: RealtimeError) {
        self.outcomes.lock().unwrap().push_back(Err(error));
    }
}

impl RealtimeTransport for Arc<FakeRealtime> {
    fn connect(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<RealtimeLink, RealtimeError>> + Send {
        self.connects.lock().unwrap().push(room_id);
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RealtimeError::Connect("no scripted link".to_string())));
        async move { outcome }
    }
}

/// Plan source returning a fixed list and counting fetches.
pub(crate) struct FakePlans {
    artifacts: Mutex<Result<Vec<PlanArtifact>, HttpError>>,
    fetches: AtomicUsize,
}

impl FakePlans {
    pub fn new(artifacts: Vec<PlanArtifact>) -> Self {
        Self {
            artifacts: Mutex::new(Ok(artifacts)),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            artifacts: Mutex::new(Err(HttpError::Network("offline".to_string()))),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, artifacts: Vec<PlanArtifact>) {
        *self.artifacts.lock().unwrap() = Ok(artifacts);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl PlanSource for Arc<FakePlans> {
    fn list_plans(
        &self,
        _room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<PlanArtifact>, HttpError>> + Send {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let result = self.artifacts.lock().unwrap().clone();
        async move { result }
    }
}

pub(crate) fn artifact(id: i64, name: &str) -> PlanArtifact {
    PlanArtifact {
        id,
        file_name: name.to_string(),
        created_at: None,
        downloadable: true,
        download_url: None,
    }
}
