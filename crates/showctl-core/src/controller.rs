// ── Controller abstraction ──
//
// Lifecycle management for one show-server connection. Owns the mirror,
// drains transport events on a single background task, and turns
// outbound commands into text frames.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use showctl_api::{TransportEvent, WebSocketHandle};

use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::model::{
    ClockDescription, ClockId, FixtureId, Knob, KnobAddress, KnobEdit, PatchItem,
    WiggleDescription, WiggleId,
};
use crate::protocol::{Command, Response, decode_response, encode_command};
use crate::session::{ConnectionState, Notice, Session};
use crate::store::{Mirror, ShowState};
use crate::stream::MirrorStream;

const NOTICE_CHANNEL_SIZE: usize = 256;
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. All mirror mutation
/// happens on one event task, in delivery order; readers take snapshots
/// through `watch` receivers.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    mirror: watch::Sender<Arc<Mirror>>,
    session: watch::Sender<Session>,
    notices: broadcast::Sender<Notice>,
    /// When the mirror last became fully synced. Cleared while a resync
    /// is in flight.
    synced_at: watch::Sender<Option<DateTime<Utc>>>,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    cancel: CancellationToken,
    /// Child token for the current connection, replaced on disconnect so
    /// the controller can connect again.
    cancel_child: Mutex<CancellationToken>,
    ws_handle: Mutex<Option<WebSocketHandle>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a controller. Does NOT connect; call
    /// [`connect()`](Self::connect) or [`attach()`](Self::attach).
    pub fn new(config: ControllerConfig) -> Self {
        let (mirror, _) = watch::channel(Arc::new(Mirror::new()));
        let (session, _) = watch::channel(Session::default());
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_SIZE);
        let (synced_at, _) = watch::channel(None);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ControllerInner {
                config,
                mirror,
                session,
                notices,
                synced_at,
                outbound: Mutex::new(None),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                ws_handle: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Open the websocket transport and start draining its events.
    ///
    /// Returns as soon as the background tasks are running; the socket
    /// handshake and the initial resync happen asynchronously. Use
    /// [`wait_synced()`](Self::wait_synced) to wait for a full mirror.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let cancel = self.inner.cancel_child.lock().await.clone();
        let url = self.inner.config.url.clone();

        let (handle, events) = WebSocketHandle::connect(
            url.clone(),
            self.inner.config.reconnect.clone(),
            cancel.child_token(),
        )
        .map_err(|e| match CoreError::from(e) {
            CoreError::ConnectionFailed { reason, .. } => CoreError::ConnectionFailed {
                url: url.to_string(),
                reason,
            },
            other => other,
        })?;

        let outbound = handle.sender();
        *self.inner.ws_handle.lock().await = Some(handle);
        self.attach(events, outbound).await;
        info!(%url, "transport spawned (handshake in progress)");
        Ok(())
    }

    /// Drive the controller from any transport.
    ///
    /// `events` is drained on a background task; `outbound` receives one
    /// encoded frame per command.
    pub async fn attach(
        &self,
        mut events: mpsc::Receiver<TransportEvent>,
        outbound: mpsc::UnboundedSender<String>,
    ) {
        *self.inner.outbound.lock().await = Some(outbound);

        let cancel = self.inner.cancel_child.lock().await.clone();
        let this = self.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    event = events.recv() => match event {
                        Some(event) => this.handle_transport_event(event).await,
                        None => {
                            debug!("transport event stream ended");
                            break;
                        }
                    }
                }
            }
        });
        self.inner.task_handles.lock().await.push(handle);
    }

    /// Stop background tasks and drop the transport.
    ///
    /// A live socket is shut down first so frames already queued are
    /// flushed and its close is applied to the session before the event
    /// task stops.
    pub async fn disconnect(&self) {
        let transport = self.inner.ws_handle.lock().await.take();
        let had_transport = transport.is_some();
        if let Some(handle) = transport {
            handle.shutdown();
        }
        *self.inner.outbound.lock().await = None;

        let previous = {
            let mut guard = self.inner.cancel_child.lock().await;
            std::mem::replace(&mut *guard, self.inner.cancel.child_token())
        };

        let mut handles = self.inner.task_handles.lock().await;
        for mut handle in handles.drain(..) {
            if had_transport
                && tokio::time::timeout(DISCONNECT_GRACE, &mut handle)
                    .await
                    .is_ok()
            {
                continue;
            }
            previous.cancel();
            let _ = handle.await;
        }
        previous.cancel();
        drop(handles);

        self.inner.session.send_if_modified(|session| {
            if session.is_open() {
                session.on_close(Some("disconnected by client".into()));
                true
            } else {
                false
            }
        });
        debug!("disconnected");
    }

    /// One-shot: connect, wait for the initial resync, run `f`,
    /// disconnect.
    pub async fn oneshot<F, Fut, T, E>(config: ControllerConfig, f: F) -> Result<T, E>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: From<CoreError>,
    {
        let timeout = config.sync_timeout;
        let controller = Controller::new(config);
        controller.connect().await.map_err(E::from)?;

        let result = match controller.wait_synced(timeout).await {
            Ok(_) => f(controller.clone()).await,
            Err(e) => Err(E::from(e)),
        };
        controller.disconnect().await;
        result
    }

    /// Wait until every collection has received its full state.
    pub async fn wait_synced(&self, timeout: Duration) -> Result<Arc<Mirror>, CoreError> {
        let mut rx = self.inner.mirror.subscribe();
        let waited = tokio::time::timeout(timeout, async {
            rx.wait_for(|m| m.is_synced())
                .await
                .map(|m| Arc::clone(&m))
        })
        .await;

        match waited {
            Ok(Ok(mirror)) => Ok(mirror),
            Ok(Err(_)) => Err(CoreError::Disconnected),
            Err(_) => Err(CoreError::Timeout {
                timeout_secs: timeout.as_secs(),
                waiting_for: "the initial show state".into(),
            }),
        }
    }

    // ── Transport events ─────────────────────────────────────────

    async fn handle_transport_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => {
                let mut queries = Vec::new();
                self.inner
                    .session
                    .send_modify(|session| queries = session.on_open());
                let opens = self.inner.session.borrow().opens();
                self.inner
                    .mirror
                    .send_modify(|m| Arc::make_mut(m).begin_resync());
                self.refresh_synced_at();

                info!(opens, "connection open, resyncing");
                self.notify(Notice::ConnectionOpened { opens });
                for query in queries {
                    self.send_logged(query).await;
                }
            }
            TransportEvent::Message(text) => match decode_response(&text) {
                Ok(response) => self.apply_response(response).await,
                Err(e) => warn!(error = %e, "dropping undecodable frame"),
            },
            TransportEvent::Closed { reason } => {
                self.inner
                    .session
                    .send_modify(|session| session.on_close(reason.clone()));
                info!(reason = reason.as_deref().unwrap_or("none"), "connection closed");
                self.notify(Notice::ConnectionClosed { reason });
            }
            TransportEvent::SendFailed { reason } => {
                warn!(%reason, "frame could not be sent");
            }
        }
    }

    async fn apply_response(&self, response: Response) {
        let family = response.family();
        let mut outcome = None;
        self.inner.mirror.send_if_modified(|m| {
            let result = Arc::make_mut(m).apply(response);
            let changed = result.is_ok();
            outcome = Some(result);
            changed
        });

        match outcome {
            Some(Ok(effects)) => {
                self.refresh_synced_at();
                for notice in effects.notices {
                    self.notify(notice);
                }
                for command in effects.commands {
                    self.send_logged(command).await;
                }
            }
            Some(Err(e)) => warn!(error = %e, family, "event dropped"),
            None => {}
        }
    }

    fn refresh_synced_at(&self) {
        let synced = self.inner.mirror.borrow().is_synced();
        self.inner.synced_at.send_if_modified(|at| match (synced, at.is_some()) {
            (true, false) => {
                *at = Some(Utc::now());
                true
            }
            (false, true) => {
                *at = None;
                true
            }
            _ => false,
        });
    }

    fn notify(&self, notice: Notice) {
        // No subscribers is fine.
        let _ = self.inner.notices.send(notice);
    }

    // ── Command execution ────────────────────────────────────────

    /// Send a command to the server.
    ///
    /// Fire-and-forget: the result arrives later as a broadcast response.
    /// Fails with [`CoreError::Disconnected`] unless the session is open;
    /// nothing is queued.
    pub async fn execute(&self, command: Command) -> Result<(), CoreError> {
        self.ensure_open()?;
        self.send(command).await
    }

    /// Apply a local knob edit to the mirror, then tell the server.
    pub async fn edit_knob(&self, address: KnobAddress, edit: KnobEdit) -> Result<(), CoreError> {
        self.ensure_open()?;

        let mut outcome = None;
        self.inner.mirror.send_if_modified(|m| {
            let result = Arc::make_mut(m).edit_knob(address, edit);
            let changed = result.is_ok();
            outcome = Some(result);
            changed
        });

        match outcome {
            Some(Ok(command)) => self.send(command).await,
            Some(Err(e)) => Err(e),
            None => Err(CoreError::Disconnected),
        }
    }

    fn ensure_open(&self) -> Result<(), CoreError> {
        if self.inner.session.borrow().is_open() {
            Ok(())
        } else {
            Err(CoreError::Disconnected)
        }
    }

    async fn send(&self, command: Command) -> Result<(), CoreError> {
        let description = command.describe();
        let text = encode_command(command)?;

        let guard = self.inner.outbound.lock().await;
        let outbound = guard.as_ref().ok_or(CoreError::Disconnected)?;
        outbound.send(text).map_err(|_| CoreError::Disconnected)?;
        debug!(command = %description, "command sent");
        Ok(())
    }

    async fn send_logged(&self, command: Command) {
        if let Err(e) = self.send(command).await {
            warn!(error = %e, "follow-up command not sent");
        }
    }

    // ── State observation ────────────────────────────────────────

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.session.borrow().state()
    }

    /// Subscribe to session changes.
    pub fn session(&self) -> watch::Receiver<Session> {
        self.inner.session.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    /// Current mirror snapshot.
    pub fn mirror(&self) -> Arc<Mirror> {
        Arc::clone(&self.inner.mirror.borrow())
    }

    pub fn subscribe(&self) -> MirrorStream {
        MirrorStream::new(self.inner.mirror.subscribe())
    }

    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        *self.inner.synced_at.borrow()
    }

    // ── Snapshot accessors ───────────────────────────────────────

    pub fn clocks_snapshot(&self) -> Vec<(ClockId, ClockDescription)> {
        self.inner.mirror.borrow().clocks().entries().to_vec()
    }

    pub fn wiggles_snapshot(&self) -> Vec<(WiggleId, WiggleDescription)> {
        self.inner.mirror.borrow().wiggles().entries().to_vec()
    }

    pub fn knobs_snapshot(&self) -> Vec<(KnobAddress, Knob)> {
        self.inner.mirror.borrow().knobs().entries().to_vec()
    }

    pub fn patches_snapshot(&self) -> Vec<(FixtureId, PatchItem)> {
        self.inner.mirror.borrow().patches().entries().to_vec()
    }

    pub fn show_snapshot(&self) -> ShowState {
        self.inner.mirror.borrow().show().clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use url::Url;

    use super::*;
    use crate::model::{KnobDatatype, KnobDescription, KnobValue};
    use crate::protocol::{
        ClockResponse, KnobCommand, KnobResponse, PatchCommand, PatchResponse, ResponseFilter,
        ServerCommand, WiggleResponse,
    };
    use crate::session::initial_queries;

    struct Harness {
        controller: Controller,
        events: mpsc::Sender<TransportEvent>,
        outbound: mpsc::UnboundedReceiver<String>,
    }

    impl Harness {
        async fn new() -> Self {
            let url = Url::parse("ws://127.0.0.1:9/ws").unwrap();
            let controller = Controller::new(ControllerConfig::new(url));
            let (events_tx, events_rx) = mpsc::channel(64);
            let (out_tx, out_rx) = mpsc::unbounded_channel();
            controller.attach(events_rx, out_tx).await;
            Self {
                controller,
                events: events_tx,
                outbound: out_rx,
            }
        }

        async fn push(&self, event: TransportEvent) {
            self.events.send(event).await.unwrap();
        }

        async fn push_response(&self, response: &Response) {
            self.push(TransportEvent::Message(serde_json::to_string(response).unwrap()))
                .await;
        }

        async fn next_frame(&mut self) -> ServerCommand {
            let text = self.outbound.recv().await.unwrap();
            serde_json::from_str(&text).unwrap()
        }

        /// Open the socket and swallow the resync queries.
        async fn open(&mut self) {
            self.push(TransportEvent::Opened).await;
            for _ in initial_queries() {
                self.next_frame().await;
            }
        }

        async fn sync_with_knobs(&self, knobs: Vec<(KnobAddress, Knob)>) {
            self.push_response(&Response::Clock(ClockResponse::State(vec![])))
                .await;
            self.push_response(&Response::Wiggle(WiggleResponse::State(vec![])))
                .await;
            self.push_response(&Response::Knob(KnobResponse::State(knobs)))
                .await;
            self.push_response(&Response::Patch(PatchResponse::PatchState(vec![])))
                .await;
        }
    }

    fn level() -> Knob {
        Knob::new(KnobDescription {
            name: "level".into(),
            datatype: KnobDatatype::UFloat,
        })
    }

    #[tokio::test]
    async fn commands_fail_before_open() {
        let h = Harness::new().await;
        assert_eq!(h.controller.connection_state(), ConnectionState::Waiting);
        let err = h
            .controller
            .execute(Command::Patch(PatchCommand::AddUniverse))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Disconnected));
    }

    #[tokio::test]
    async fn open_sends_initial_queries_in_order() {
        let mut h = Harness::new().await;
        h.push(TransportEvent::Opened).await;

        for expected in initial_queries() {
            let frame = h.next_frame().await;
            assert_eq!(frame.filter, ResponseFilter::Exclusive);
            assert_eq!(frame.command, expected);
        }
        assert_eq!(h.controller.connection_state(), ConnectionState::Open);
    }

    #[tokio::test]
    async fn full_state_marks_mirror_synced() {
        let mut h = Harness::new().await;
        h.open().await;
        h.sync_with_knobs(vec![]).await;

        let mirror = h
            .controller
            .wait_synced(Duration::from_secs(5))
            .await
            .unwrap();
        assert!(mirror.is_synced());
        assert!(h.controller.synced_at().is_some());
    }

    #[tokio::test]
    async fn undecodable_frames_are_dropped() {
        let mut h = Harness::new().await;
        h.open().await;
        h.push(TransportEvent::Message("{garbage".into())).await;
        h.sync_with_knobs(vec![]).await;

        h.controller
            .wait_synced(Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(h.controller.connection_state(), ConnectionState::Open);
    }

    #[tokio::test]
    async fn knob_edit_applies_locally_and_excludes_sender() {
        let mut h = Harness::new().await;
        let address = KnobAddress::Wiggle(WiggleId::new(0, 3), 1);
        h.open().await;
        h.sync_with_knobs(vec![(address, level())]).await;
        h.controller
            .wait_synced(Duration::from_secs(5))
            .await
            .unwrap();

        h.controller
            .edit_knob(address, KnobEdit::Drag(0.5))
            .await
            .unwrap();

        assert_eq!(
            h.controller.mirror().knobs().get(&address).unwrap().value,
            KnobValue::UFloat(0.5)
        );
        let frame = h.next_frame().await;
        assert_eq!(frame.filter, ResponseFilter::AllButSelf);
        assert_eq!(
            frame.command,
            Command::Knob(KnobCommand::Set(address, KnobValue::UFloat(0.5)))
        );
    }

    #[tokio::test]
    async fn server_errors_reach_notice_subscribers() {
        let mut h = Harness::new().await;
        let mut notices = h.controller.notices();
        h.open().await;
        assert_eq!(
            notices.recv().await.unwrap(),
            Notice::ConnectionOpened { opens: 1 }
        );

        h.push_response(&Response::Error("universe 3 has no port".into()))
            .await;
        assert_eq!(
            notices.recv().await.unwrap(),
            Notice::ServerError("universe 3 has no port".into())
        );
    }

    #[tokio::test]
    async fn close_blocks_commands_until_reopen() {
        let mut h = Harness::new().await;
        h.open().await;

        let mut session = h.controller.session();
        h.push(TransportEvent::Closed {
            reason: Some("reset".into()),
        })
        .await;
        session.wait_for(|s| !s.is_open()).await.unwrap();

        let err = h
            .controller
            .execute(Command::Patch(PatchCommand::AddUniverse))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Disconnected));

        h.open().await;
        assert_eq!(h.controller.session().borrow().opens(), 2);
        h.controller
            .execute(Command::Patch(PatchCommand::AddUniverse))
            .await
            .unwrap();
        assert_eq!(
            h.next_frame().await.command,
            Command::Patch(PatchCommand::AddUniverse)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn wait_synced_times_out() {
        let mut h = Harness::new().await;
        h.open().await;
        let err = h
            .controller
            .wait_synced(Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 2, .. }));
    }

    #[tokio::test]
    async fn disconnect_stops_the_event_task() {
        let mut h = Harness::new().await;
        h.open().await;
        h.controller.disconnect().await;

        assert_eq!(h.controller.connection_state(), ConnectionState::Closed);
        assert!(h.outbound.recv().await.is_none());
    }
}
