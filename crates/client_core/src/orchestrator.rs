//! Intent orchestration: lock, network exchange, outcome, unlock.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use serde_json::Value;
use shared::domain::ProjectName;
use tokio::{
    sync::{broadcast, mpsc},
    task::{AbortHandle, JoinHandle},
};
use tracing::{debug, error, info, warn};

use crate::{
    config::ClientSettings,
    error::{OrchestratorError, Result, TransportError},
    handlers,
    intent::{Intent, IntentKind, ModalPolicy},
    lock::{LockGuard, ScreenLock},
    notification::NotificationCenter,
    store::{Mutation, Store},
    transport::{ApiRequest, ApiTransport, HttpTransport},
    ClientEvent,
};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Everything a handler may touch. Cheap to clone.
#[derive(Clone)]
pub struct Context {
    pub store: Arc<Store>,
    pub transport: Arc<dyn ApiTransport>,
    pub lock: ScreenLock,
    pub notifications: Arc<NotificationCenter>,
    pub events: broadcast::Sender<ClientEvent>,
}

impl Context {
    pub fn project(&self) -> Result<ProjectName> {
        self.store
            .select(|state| state.session.project.clone())
            .ok_or_else(|| OrchestratorError::precondition("no active project"))
    }

    pub fn user(&self) -> Result<String> {
        self.store
            .select(|state| state.session.user.clone())
            .ok_or_else(|| OrchestratorError::precondition("no signed-in user"))
    }

    pub async fn send(&self, request: ApiRequest) -> Result<Value> {
        let method = request.method.as_str();
        let path = request.path.clone();
        match self.transport.send(request).await {
            Ok(value) => {
                debug!(method, path = %path, "orchestrator: request settled");
                Ok(value)
            }
            Err(err) => {
                debug!(method, path = %path, error = %err, "orchestrator: request failed");
                Err(err.into())
            }
        }
    }

    pub fn commit(&self, mutation: Mutation) {
        self.store.commit(mutation);
    }

    pub fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentPhase {
    Pending,
    Resolved,
    Rejected,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentOutcome {
    pub ticket: u64,
    pub kind: IntentKind,
    pub phase: IntentPhase,
    pub error: Option<OrchestratorError>,
}

impl IntentOutcome {
    pub fn is_resolved(&self) -> bool {
        self.phase == IntentPhase::Resolved
    }
}

/// Handle to a spawned intent.
pub struct IntentTicket {
    pub id: u64,
    pub kind: IntentKind,
    handle: JoinHandle<Option<IntentOutcome>>,
}

impl IntentTicket {
    /// Waits for the intent to settle; `None` when it was cancelled.
    pub async fn outcome(self) -> Option<IntentOutcome> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => None,
            Err(err) => {
                error!(ticket = self.id, intent = self.kind.name(), "orchestrator: intent task failed: {err}");
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    Full,
    Closed,
}

/// Producer side of the dispatcher queue.
#[derive(Clone)]
pub struct IntentSender {
    tx: mpsc::Sender<Intent>,
}

impl IntentSender {
    pub fn submit(&self, intent: Intent) -> std::result::Result<(), SubmitError> {
        let kind = intent.kind();
        match self.tx.try_send(intent) {
            Ok(()) => {
                debug!(intent = kind.name(), "orchestrator: queued intent");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => Err(SubmitError::Full),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SubmitError::Closed),
        }
    }
}

pub struct Orchestrator {
    ctx: Context,
    next_ticket: AtomicU64,
    in_flight: Mutex<HashMap<u64, (IntentKind, AbortHandle)>>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<Store>,
        transport: Arc<dyn ApiTransport>,
        notification_lifetime: Duration,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let notifications = Arc::new(NotificationCenter::new(
            notification_lifetime,
            events.clone(),
        ));
        Arc::new(Self {
            ctx: Context {
                store,
                transport,
                lock: ScreenLock::with_events(events.clone()),
                notifications,
                events,
            },
            next_ticket: AtomicU64::new(1),
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    /// Builds an orchestrator talking to the configured server over HTTP.
    pub fn connect(settings: &ClientSettings) -> std::result::Result<Arc<Self>, TransportError> {
        let transport = HttpTransport::new(
            &settings.server_url,
            settings.api_token.clone(),
            settings.request_timeout(),
        )?;
        let store = Store::with_session(
            settings.project.as_deref().map(ProjectName::from),
            settings.user.clone(),
        );
        Ok(Self::new(
            Arc::new(store),
            Arc::new(transport),
            settings.notification_lifetime(),
        ))
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.ctx.store
    }

    pub fn lock(&self) -> &ScreenLock {
        &self.ctx.lock
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.ctx.notifications
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.ctx.events.subscribe()
    }

    /// Runs an intent on the current task and returns its terminal outcome.
    pub async fn run(&self, intent: Intent) -> IntentOutcome {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let attempt = begin(&self.ctx, ticket, intent).await;
        finish(&self.ctx, ticket, attempt)
    }

    /// Spawns an intent. Every dispatch runs independently of earlier ones.
    pub fn dispatch(self: &Arc<Self>, intent: Intent) -> IntentTicket {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let kind = intent.kind();
        let orchestrator = Arc::clone(self);

        // Hold the registry while spawning so the task cannot deregister first.
        let mut in_flight = self.in_flight();
        let handle = tokio::spawn(async move {
            let attempt = begin(&orchestrator.ctx, ticket, intent).await;
            // Whoever removes the ticket owns the terminal phase. A cancel that
            // claimed it first has already emitted `Cancelled`.
            if orchestrator.in_flight().remove(&ticket).is_none() {
                debug!(ticket, "orchestrator: outcome dropped after cancel");
                return None;
            }
            Some(finish(&orchestrator.ctx, ticket, attempt))
        });
        in_flight.insert(ticket, (kind, handle.abort_handle()));

        IntentTicket {
            id: ticket,
            kind,
            handle,
        }
    }

    /// Aborts every in-flight intent of `kind`. Aborted intents emit no
    /// notification and no other terminal phase; their lock is released on drop.
    /// A handler that already returned keeps the mirror writes it made.
    pub fn cancel(&self, kind: IntentKind) -> usize {
        self.cancel_where(|candidate| candidate == kind)
    }

    pub fn cancel_all(&self) -> usize {
        self.cancel_where(|_| true)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight().len()
    }

    /// Starts a single consumer that dispatches queued intents in arrival order.
    pub fn spawn_dispatcher(self: &Arc<Self>, capacity: usize) -> (IntentSender, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(capacity.max(1));
        let orchestrator = Arc::clone(self);
        let task = tokio::spawn(async move {
            while let Some(intent) = rx.recv().await {
                orchestrator.dispatch(intent);
            }
            debug!("orchestrator: dispatcher queue closed");
        });
        (IntentSender { tx }, task)
    }

    fn cancel_where(&self, matches: impl Fn(IntentKind) -> bool) -> usize {
        let cancelled: Vec<(u64, IntentKind)> = {
            let mut in_flight = self.in_flight();
            let tickets: Vec<u64> = in_flight
                .iter()
                .filter(|(_, (kind, _))| matches(*kind))
                .map(|(ticket, _)| *ticket)
                .collect();
            tickets
                .into_iter()
                .filter_map(|ticket| {
                    let (kind, handle) = in_flight.remove(&ticket)?;
                    handle.abort();
                    Some((ticket, kind))
                })
                .collect()
        };

        for (ticket, kind) in &cancelled {
            info!(ticket, intent = kind.name(), "orchestrator: intent cancelled");
            self.ctx.emit(ClientEvent::IntentPhase {
                ticket: *ticket,
                kind: *kind,
                phase: IntentPhase::Cancelled,
            });
        }
        cancelled.len()
    }

    fn in_flight(&self) -> MutexGuard<'_, HashMap<u64, (IntentKind, AbortHandle)>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An intent that ran its handler but has not reported anything yet.
struct Attempt {
    kind: IntentKind,
    lock_guard: Option<LockGuard>,
    result: Result<()>,
}

async fn begin(ctx: &Context, ticket: u64, intent: Intent) -> Attempt {
    let kind = intent.kind();

    let lock_guard = match kind.lock_category() {
        Some(category) => match ctx.lock.engage(category) {
            Ok(guard) => Some(guard),
            Err(err) => {
                return Attempt {
                    kind,
                    lock_guard: None,
                    result: Err(err),
                }
            }
        },
        None => None,
    };

    ctx.emit(ClientEvent::IntentPhase {
        ticket,
        kind,
        phase: IntentPhase::Pending,
    });
    info!(ticket, intent = kind.name(), "orchestrator: intent pending");

    if kind.modal_policy() == ModalPolicy::CloseImmediately {
        ctx.commit(Mutation::ModalHidden);
    }

    let result = handlers::handle(ctx, intent).await;
    Attempt {
        kind,
        lock_guard,
        result,
    }
}

/// Reports the attempt while its lock is still held, then unlocks and settles.
fn finish(ctx: &Context, ticket: u64, attempt: Attempt) -> IntentOutcome {
    let Attempt {
        kind,
        lock_guard,
        result,
    } = attempt;

    let error = match result {
        Ok(()) => {
            if let Some(key) = kind.success_message() {
                ctx.notifications.success(key);
            }
            if kind.modal_policy() == ModalPolicy::CloseOnSuccess {
                ctx.commit(Mutation::ModalHidden);
            }
            None
        }
        Err(err @ OrchestratorError::Busy(_)) => {
            warn!(ticket, intent = kind.name(), "orchestrator: {err}");
            ctx.notifications.error_text(err.user_message());
            Some(err)
        }
        Err(err) => {
            warn!(ticket, intent = kind.name(), error = %err, "orchestrator: intent rejected");
            match kind.failure_message() {
                Some(key) => ctx.notifications.error_key(key),
                None => ctx.notifications.error_text(err.user_message()),
            };
            Some(err)
        }
    };

    drop(lock_guard);
    settle(ctx, ticket, kind, error)
}

fn settle(
    ctx: &Context,
    ticket: u64,
    kind: IntentKind,
    error: Option<OrchestratorError>,
) -> IntentOutcome {
    let phase = if error.is_none() {
        IntentPhase::Resolved
    } else {
        IntentPhase::Rejected
    };
    info!(ticket, intent = kind.name(), ?phase, "orchestrator: intent settled");
    ctx.emit(ClientEvent::IntentPhase {
        ticket,
        kind,
        phase,
    });
    IntentOutcome {
        ticket,
        kind,
        phase,
        error,
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
