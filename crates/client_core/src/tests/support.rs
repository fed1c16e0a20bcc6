//! Scripted transport shared by the orchestrator, handler and import tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;
use shared::{domain::ProjectName, error::ApiError};

use crate::{
    error::TransportError,
    lock::ScreenLock,
    orchestrator::Orchestrator,
    store::Store,
    transport::{ApiRequest, ApiTransport, HttpMethod, UploadRequest},
};

pub(crate) const PROJECT: &str = "demo";
pub(crate) const USER: &str = "alice";

#[derive(Clone)]
enum Reply {
    Settle(Result<Value, TransportError>),
    Hang,
}

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<HashMap<(HttpMethod, String), VecDeque<Reply>>>,
    calls: Mutex<Vec<ApiRequest>>,
    uploads: Mutex<Vec<UploadRequest>>,
    upload_failures: Mutex<HashMap<String, String>>,
    observed_lock: Mutex<Option<ScreenLock>>,
    lock_observations: Mutex<Vec<bool>>,
}

pub(crate) fn api_error(status: u16, message: &str) -> TransportError {
    TransportError::Api {
        status,
        error: ApiError::new(message),
    }
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues one reply for the next `method path` call. Unscripted calls
    /// settle with `null`.
    pub(crate) fn respond(&self, method: HttpMethod, path: impl Into<String>, value: Value) {
        self.push(method, path.into(), Reply::Settle(Ok(value)));
    }

    pub(crate) fn fail(&self, method: HttpMethod, path: impl Into<String>, error: TransportError) {
        self.push(method, path.into(), Reply::Settle(Err(error)));
    }

    /// The next `method path` call never settles.
    pub(crate) fn hang(&self, method: HttpMethod, path: impl Into<String>) {
        self.push(method, path.into(), Reply::Hang);
    }

    pub(crate) fn fail_upload(&self, file_name: &str, message: &str) {
        self.upload_failures
            .lock()
            .expect("upload failures")
            .insert(file_name.to_string(), message.to_string());
    }

    /// Records `lock.is_engaged()` at the moment each request is issued.
    pub(crate) fn track_lock(&self, lock: ScreenLock) {
        *self.observed_lock.lock().expect("observed lock") = Some(lock);
    }

    pub(crate) fn lock_observations(&self) -> Vec<bool> {
        self.lock_observations.lock().expect("observations").clone()
    }

    pub(crate) fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().expect("calls").clone()
    }

    pub(crate) fn calls_to(&self, method: HttpMethod, path: &str) -> Vec<ApiRequest> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method && call.path == path)
            .collect()
    }

    pub(crate) fn uploads(&self) -> Vec<UploadRequest> {
        self.uploads.lock().expect("uploads").clone()
    }

    /// Waits until at least `count` requests have been issued.
    pub(crate) async fn wait_for_calls(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.calls.lock().expect("calls").len() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("requests were not issued in time");
    }

    fn push(&self, method: HttpMethod, path: String, reply: Reply) {
        self.replies
            .lock()
            .expect("replies")
            .entry((method, path))
            .or_default()
            .push_back(reply);
    }

    fn record_lock_state(&self) {
        if let Some(lock) = self.observed_lock.lock().expect("observed lock").as_ref() {
            self.lock_observations
                .lock()
                .expect("observations")
                .push(lock.is_engaged());
        }
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        self.record_lock_state();
        let reply = self
            .replies
            .lock()
            .expect("replies")
            .get_mut(&(request.method, request.path.clone()))
            .and_then(VecDeque::pop_front);
        self.calls.lock().expect("calls").push(request);

        match reply {
            Some(Reply::Settle(result)) => result,
            Some(Reply::Hang) => std::future::pending().await,
            None => Ok(Value::Null),
        }
    }

    async fn upload(&self, request: UploadRequest) -> Result<Value, TransportError> {
        let failure = self
            .upload_failures
            .lock()
            .expect("upload failures")
            .get(&request.file_name)
            .cloned();
        self.uploads.lock().expect("uploads").push(request);
        tokio::task::yield_now().await;

        match failure {
            Some(message) => Err(api_error(400, &message)),
            None => Ok(serde_json::json!({ "message": "Launch is imported" })),
        }
    }
}

pub(crate) fn orchestrator_with(
    transport: Arc<ScriptedTransport>,
    project: Option<&str>,
    user: Option<&str>,
) -> Arc<Orchestrator> {
    let store = Store::with_session(project.map(ProjectName::from), user.map(str::to_string));
    let orchestrator = Orchestrator::new(Arc::new(store), transport.clone(), Duration::from_secs(5));
    transport.track_lock(orchestrator.lock().clone());
    orchestrator
}

pub(crate) fn demo_orchestrator(transport: Arc<ScriptedTransport>) -> Arc<Orchestrator> {
    orchestrator_with(transport, Some(PROJECT), Some(USER))
}

pub(crate) fn project() -> ProjectName {
    ProjectName::from(PROJECT)
}
