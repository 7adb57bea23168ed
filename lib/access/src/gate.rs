//! The access gate driver.
//!
//! One worker task owns the [`GateState`] and handles events one at a time
//! from a single funnel:
//! 1. Subscribe to the session stream (live changes feed the funnel)
//! 2. Restore the current session and handle it like any other event
//! 3. Drain the funnel: session events, lookup results, login/logout
//!
//! Allow-list lookups run as separate tasks and post their outcome back
//! into the funnel, tagged with the ticket they were issued for. The
//! worker publishes every state change on a `watch` channel for the UI.

use crate::auth::LoginInitiation;
use crate::config::GateConfig;
use crate::session::Session;
use crate::source::{AllowList, AuthChange, AuthEvent, SessionSource};
use crate::state::{Effect, GateState, LookupCompletion, LookupOutcome, LookupTicket};
use allowgate_core::IdentityId;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Where a session event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionOrigin {
    Restored,
    Live(AuthEvent),
    Injected,
}

enum GateEvent {
    Session {
        origin: SessionOrigin,
        session: Option<Session>,
    },
    LookupFinished {
        ticket: LookupTicket,
        outcome: LookupOutcome,
    },
    Login {
        reply: oneshot::Sender<Option<LoginInitiation>>,
    },
    LoginFailed,
    Logout {
        reply: oneshot::Sender<()>,
    },
    Settle {
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a running access gate.
///
/// Dropping the handle stops the gate and releases its session
/// subscription. Use [`AccessGate::shutdown`] to wait for that to finish.
pub struct AccessGate {
    events: mpsc::UnboundedSender<GateEvent>,
    state: watch::Receiver<GateState>,
    worker: JoinHandle<()>,
}

impl AccessGate {
    /// Starts a gate over the given collaborators.
    ///
    /// `redirect_to` is where the identity provider sends the user back
    /// after login, normally the application's own origin.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<S, A>(
        source: Arc<S>,
        allow_list: Arc<A>,
        config: GateConfig,
        redirect_to: impl Into<String>,
    ) -> Self
    where
        S: SessionSource + 'static,
        A: AllowList + 'static,
    {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(GateState::new());

        let worker = GateWorker {
            source,
            allow_list,
            config,
            redirect_to: redirect_to.into(),
            state: GateState::new(),
            publisher: state_tx,
            funnel: events_tx.clone(),
            lookup: None,
        };
        let worker = tokio::spawn(worker.run(events_rx));

        Self {
            events: events_tx,
            state: state_rx,
            worker,
        }
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> GateState {
        self.state.borrow().clone()
    }

    /// Returns a receiver that observes every published state.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<GateState> {
        self.state.clone()
    }

    /// Feeds a session event into the gate from outside the session stream.
    pub fn notify(&self, session: Option<Session>) {
        self.send(GateEvent::Session {
            origin: SessionOrigin::Injected,
            session,
        });
    }

    /// Starts an OAuth login.
    ///
    /// Returns where to send the user. Returns `None` if a user is already
    /// admitted, or if the login could not be started (the state then
    /// carries a login-failure notice).
    pub async fn login(&self) -> Option<LoginInitiation> {
        let (reply, response) = oneshot::channel();
        self.send(GateEvent::Login { reply });
        response.await.ok().flatten()
    }

    /// Records that the login round trip failed after it was started.
    pub fn report_login_failure(&self) {
        self.send(GateEvent::LoginFailed);
    }

    /// Ends the session and resets the gate to signed out.
    pub async fn logout(&self) {
        let (reply, response) = oneshot::channel();
        self.send(GateEvent::Logout { reply });
        let _ = response.await;
    }

    /// Waits until every event queued before this call has been handled.
    pub async fn settled(&self) {
        let (reply, response) = oneshot::channel();
        self.send(GateEvent::Settle { reply });
        let _ = response.await;
    }

    /// Stops the gate and waits for its subscription to be released.
    pub async fn shutdown(self) {
        let (reply, response) = oneshot::channel();
        self.send(GateEvent::Shutdown { reply });
        let _ = response.await;
    }

    fn send(&self, event: GateEvent) {
        if self.events.send(event).is_err() {
            debug!("access gate already stopped, dropping event");
        }
    }
}

impl Drop for AccessGate {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

struct GateWorker<S, A> {
    source: Arc<S>,
    allow_list: Arc<A>,
    config: GateConfig,
    redirect_to: String,
    state: GateState,
    publisher: watch::Sender<GateState>,
    funnel: mpsc::UnboundedSender<GateEvent>,
    lookup: Option<(u64, JoinHandle<()>)>,
}

impl<S, A> GateWorker<S, A>
where
    S: SessionSource + 'static,
    A: AllowList + 'static,
{
    async fn run(mut self, mut events: mpsc::UnboundedReceiver<GateEvent>) {
        let funnel = self.funnel.clone();
        let subscription = self.source.subscribe(Arc::new(move |change: AuthChange| {
            // The worker may already be gone; nothing to deliver to then.
            let _ = funnel.send(GateEvent::Session {
                origin: SessionOrigin::Live(change.event),
                session: change.session,
            });
        }));
        debug!("access gate subscribed to session changes");

        let restored = match self.source.current_session().await {
            Ok(session) => session,
            Err(report) => {
                warn!(error = %report, "failed to restore session, starting signed out");
                None
            }
        };
        self.handle_session(SessionOrigin::Restored, restored).await;

        let mut shutdown_reply = None;
        while let Some(event) = events.recv().await {
            match event {
                GateEvent::Session { origin, session } => {
                    self.handle_session(origin, session).await;
                }
                GateEvent::LookupFinished { ticket, outcome } => {
                    self.handle_lookup_finished(ticket, outcome).await;
                }
                GateEvent::Login { reply } => {
                    let initiation = self.handle_login().await;
                    let _ = reply.send(initiation);
                }
                GateEvent::LoginFailed => {
                    self.state.login_failed();
                    self.publish();
                }
                GateEvent::Logout { reply } => {
                    self.handle_logout().await;
                    let _ = reply.send(());
                }
                GateEvent::Settle { reply } => {
                    let _ = reply.send(());
                }
                GateEvent::Shutdown { reply } => {
                    shutdown_reply = Some(reply);
                    break;
                }
            }
        }

        drop(subscription);
        self.cancel_lookup();
        debug!("access gate stopped");
        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
    }

    async fn handle_session(&mut self, origin: SessionOrigin, session: Option<Session>) {
        debug!(
            ?origin,
            identity = session.as_ref().and_then(Session::identity).map(IdentityId::as_str),
            "session event"
        );

        let effect = self.state.observe_session(session.as_ref());
        self.reap_stale_lookup();
        self.publish();

        if let Some(effect) = effect {
            self.perform(effect).await;
        }
    }

    async fn handle_lookup_finished(&mut self, ticket: LookupTicket, outcome: LookupOutcome) {
        let identity = ticket.identity().clone();
        if let LookupOutcome::Failed { reason } = &outcome {
            error!(identity = %identity, error = %reason, "allow-list lookup failed");
        }

        match self.state.complete_lookup(ticket, outcome) {
            LookupCompletion::Stale => {
                debug!(identity = %identity, "discarding stale allow-list result");
            }
            LookupCompletion::Applied(effect) => {
                self.lookup = None;
                match self.state.denial() {
                    Some(reason) => {
                        warn!(identity = %identity, ?reason, "access denied");
                    }
                    None => info!(identity = %identity, "access granted"),
                }
                self.publish();
                if let Some(effect) = effect {
                    self.perform(effect).await;
                }
            }
        }
    }

    async fn handle_login(&mut self) -> Option<LoginInitiation> {
        if !self.state.begin_login() {
            debug!("user already admitted, not starting a login");
            return None;
        }
        self.publish();

        let provider = self.config.provider();
        match self
            .source
            .begin_oauth_login(provider, &self.redirect_to)
            .await
        {
            Ok(initiation) => {
                info!(%provider, "OAuth login started");
                Some(initiation)
            }
            Err(report) => {
                error!(%provider, error = %report, "failed to start OAuth login");
                self.state.login_failed();
                self.publish();
                None
            }
        }
    }

    async fn handle_logout(&mut self) {
        if let Err(report) = self.source.end_session().await {
            warn!(error = %report, "failed to end session remotely, signing out locally");
        }
        self.state.sign_out();
        self.reap_stale_lookup();
        self.publish();
        info!("signed out");
    }

    async fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::Lookup(ticket) => self.spawn_lookup(ticket),
            Effect::EndSession => {
                if let Err(report) = self.source.end_session().await {
                    warn!(error = %report, "failed to end session after denial");
                }
            }
        }
    }

    fn spawn_lookup(&mut self, ticket: LookupTicket) {
        self.cancel_lookup();

        let epoch = ticket.epoch;
        let allow_list = Arc::clone(&self.allow_list);
        let table = self.config.allow_list_table().to_string();
        let timeout = self.config.lookup_timeout();
        let funnel = self.funnel.clone();

        debug!(identity = %ticket.identity(), epoch, "checking allow-list");
        let handle = tokio::spawn(async move {
            let outcome = run_lookup(allow_list.as_ref(), &table, ticket.identity(), timeout).await;
            let _ = funnel.send(GateEvent::LookupFinished { ticket, outcome });
        });
        self.lookup = Some((epoch, handle));
    }

    fn reap_stale_lookup(&mut self) {
        let current = self.state.epoch();
        if self
            .lookup
            .as_ref()
            .is_some_and(|(epoch, _)| *epoch != current)
        {
            self.cancel_lookup();
        }
    }

    fn cancel_lookup(&mut self) {
        if let Some((epoch, handle)) = self.lookup.take() {
            if !handle.is_finished() {
                debug!(epoch, "abandoning superseded allow-list lookup");
            }
            handle.abort();
        }
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }
}

impl<S, A> Drop for GateWorker<S, A> {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.lookup.take() {
            handle.abort();
        }
    }
}

async fn run_lookup<A>(
    allow_list: &A,
    table: &str,
    identity: &IdentityId,
    timeout: Option<Duration>,
) -> LookupOutcome
where
    A: AllowList + ?Sized,
{
    let lookup = AssertUnwindSafe(allow_list.lookup_by_id(table, identity)).catch_unwind();
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, lookup).await {
            Ok(result) => result,
            Err(_) => return LookupOutcome::TimedOut,
        },
        None => lookup.await,
    };

    match result {
        Ok(Ok(rows)) => LookupOutcome::Rows(rows),
        Ok(Err(report)) => LookupOutcome::Failed {
            reason: report.to_string(),
        },
        Err(_) => LookupOutcome::Panicked,
    }
}
