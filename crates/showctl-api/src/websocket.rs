//! Console socket with auto-reconnect.
//!
//! Connects to the show server's websocket endpoint and turns the raw
//! socket lifecycle into an ordered stream of [`TransportEvent`]s. Text
//! frames queued on the handle are written to whichever connection is
//! current. Reconnection uses exponential backoff + jitter.
//!
//! # Example
//!
//! ```rust,ignore
//! use showctl_api::websocket::{ReconnectConfig, TransportEvent, WebSocketHandle};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let url = Url::parse("ws://127.0.0.1:4000/ws")?;
//! let (handle, mut events) =
//!     WebSocketHandle::connect(url, ReconnectConfig::default(), CancellationToken::new())?;
//!
//! while let Some(event) = events.recv().await {
//!     if event == TransportEvent::Opened {
//!         handle.send(r#"{"filter":"Exclusive","command":{"Clock":"State"}}"#.into())?;
//!     }
//! }
//! ```

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── Channel capacity ─────────────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ── TransportEvent ───────────────────────────────────────────────────

/// Lifecycle and payload events surfaced by the transport.
///
/// Events arrive in socket order. Every `Opened` is eventually followed
/// by a `Closed` before the next `Opened`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A connection was established.
    Opened,
    /// A text frame arrived.
    Message(String),
    /// The current connection ended.
    Closed { reason: Option<String> },
    /// A queued frame could not be written.
    SendFailed { reason: String },
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for reconnection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum consecutive failed attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── WebSocketHandle ──────────────────────────────────────────────────

/// Handle to a running console socket.
///
/// Cheaply cloneable. Call [`shutdown`](Self::shutdown) to tear down the
/// background task; the event receiver then yields a final `Closed` and ends.
#[derive(Debug, Clone)]
pub struct WebSocketHandle {
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl WebSocketHandle {
    /// Validate the URL and spawn the reconnection loop.
    ///
    /// Returns immediately. The first connection attempt happens in the
    /// background; watch the returned receiver for [`TransportEvent::Opened`].
    /// Must be called from within a tokio runtime.
    pub fn connect(
        ws_url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>), Error> {
        match ws_url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(Error::UnsupportedScheme {
                    scheme: other.to_owned(),
                });
            }
        }

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            ws_loop(ws_url, event_tx, outbound_rx, reconnect, task_cancel).await;
        });

        Ok((
            Self {
                outbound: outbound_tx,
                cancel,
            },
            event_rx,
        ))
    }

    /// Queue a text frame for the current connection.
    pub fn send(&self, text: String) -> Result<(), Error> {
        self.outbound.send(text).map_err(|_| Error::ChannelClosed)
    }

    /// A sender that feeds the same outbound queue as [`send`](Self::send).
    pub fn sender(&self) -> mpsc::UnboundedSender<String> {
        self.outbound.clone()
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Why a single connection stopped pumping.
enum PumpEnd {
    /// Shutdown requested, or every outbound sender was dropped.
    Cancelled,
    /// The socket went away; reconnect.
    Closed(Option<String>),
    /// Nobody is listening for events any more.
    ReceiverGone,
}

/// Main loop: connect → pump → on failure, backoff → reconnect.
async fn ws_loop(
    ws_url: Url,
    event_tx: mpsc::Sender<TransportEvent>,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        let opened = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = open_socket(&ws_url) => result,
        };

        let socket = match opened {
            Ok(socket) => socket,
            Err(e) => {
                tracing::warn!(error = %e, attempt, "WebSocket connect failed");

                if let Some(max) = reconnect.max_retries {
                    if attempt >= max {
                        tracing::error!(
                            max_retries = max,
                            "show server unreachable, retry limit reached"
                        );
                        break;
                    }
                }

                let delay = backoff_delay(attempt, &reconnect);
                tracing::info!(
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    attempt,
                    "Waiting before reconnect"
                );

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }

                attempt += 1;
                continue;
            }
        };

        attempt = 0;
        if event_tx.send(TransportEvent::Opened).await.is_err() {
            break;
        }

        match pump(socket, &event_tx, &mut outbound_rx, &cancel).await {
            PumpEnd::Cancelled => {
                let _ = event_tx.send(TransportEvent::Closed { reason: None }).await;
                break;
            }
            PumpEnd::Closed(reason) => {
                tracing::info!(
                    reason = reason.as_deref().unwrap_or(""),
                    "WebSocket disconnected, reconnecting"
                );
                if event_tx.send(TransportEvent::Closed { reason }).await.is_err() {
                    break;
                }
            }
            PumpEnd::ReceiverGone => break,
        }
    }

    tracing::debug!("WebSocket loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

async fn open_socket(url: &Url) -> Result<Socket, Error> {
    tracing::info!(url = %url, "connecting to show server");

    let (socket, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::info!("show server socket open");
    Ok(socket)
}

/// Shuttle frames in both directions until the connection drops.
async fn pump(
    socket: Socket,
    event_tx: &mpsc::Sender<TransportEvent>,
    outbound_rx: &mut mpsc::UnboundedReceiver<String>,
    cancel: &CancellationToken,
) -> PumpEnd {
    let (mut write, mut read) = socket.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                // Frames queued before shutdown still go out.
                while let Ok(text) = outbound_rx.try_recv() {
                    if write.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                let _ = write.close().await;
                return PumpEnd::Cancelled;
            }
            outgoing = outbound_rx.recv() => {
                let Some(text) = outgoing else {
                    let _ = write.close().await;
                    return PumpEnd::Cancelled;
                };
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    let reason = Error::Send(e.to_string()).to_string();
                    tracing::warn!(error = %reason, "WebSocket write failed");
                    if event_tx
                        .send(TransportEvent::SendFailed { reason: reason.clone() })
                        .await
                        .is_err()
                    {
                        return PumpEnd::ReceiverGone;
                    }
                    return PumpEnd::Closed(Some(reason));
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if event_tx
                            .send(TransportEvent::Message(text.as_str().to_owned()))
                            .await
                            .is_err()
                        {
                            return PumpEnd::ReceiverGone;
                        }
                    }
                    Some(Ok(Message::Ping(_))) => {
                        tracing::trace!("ping from show server");
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame.map(|cf| {
                            Error::WebSocketClosed {
                                code: u16::from(cf.code),
                                reason: cf.reason.as_str().to_owned(),
                            }
                            .to_string()
                        });
                        tracing::info!(
                            reason = reason.as_deref().unwrap_or(""),
                            "WebSocket close frame received"
                        );
                        return PumpEnd::Closed(reason);
                    }
                    Some(Err(e)) => {
                        return PumpEnd::Closed(Some(e.to_string()));
                    }
                    None => {
                        tracing::info!("show server closed the stream");
                        return PumpEnd::Closed(None);
                    }
                    Some(Ok(_)) => {
                        // Binary, Pong, Frame -- the console protocol is text only
                    }
                }
            }
        }
    }
}

// ── Backoff ──────────────────────────────────────────────────────────

/// Delay before reconnect attempt `attempt` (zero based).
///
/// Doubles from `initial_delay` until it reaches `max_delay`, then gets a
/// spread of up to 25% either way. The spread is a fixed function of
/// `attempt`, so successive retries differ but two clients on the same
/// attempt wait the same time. Saturates at `Duration::MAX`.
fn backoff_delay(attempt: u32, config: &ReconnectConfig) -> Duration {
    let capped = config
        .initial_delay
        .checked_mul(1_u32 << attempt.min(31))
        .map_or(config.max_delay, |d| d.min(config.max_delay));

    // Spread in [-0.25, 0.25), derived from the attempt number.
    let bucket = attempt.wrapping_mul(2_654_435_761) % 1000;
    let spread = f64::from(bucket) / 2000.0 - 0.25;
    Duration::try_from_secs_f64(capped.as_secs_f64() * (1.0 + spread)).unwrap_or(Duration::MAX)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn within_spread(actual: Duration, nominal: Duration) -> bool {
        let ratio = actual.as_secs_f64() / nominal.as_secs_f64();
        (0.749..=1.251).contains(&ratio)
    }

    #[test]
    fn defaults_retry_forever() {
        let reconnect = ReconnectConfig::default();
        assert_eq!(reconnect.max_retries, None);
        assert!(reconnect.initial_delay < reconnect.max_delay);
    }

    #[test]
    fn delays_double_until_the_cap() {
        let reconnect = ReconnectConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
            max_retries: None,
        };
        for attempt in 0..6 {
            let nominal = Duration::from_millis(100 * (1 << attempt));
            let actual = backoff_delay(attempt, &reconnect);
            assert!(
                within_spread(actual, nominal),
                "attempt {attempt}: {actual:?} is not near {nominal:?}"
            );
        }
    }

    #[test]
    fn delays_stay_near_the_cap() {
        let reconnect = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            max_retries: None,
        };
        for attempt in [4, 10, 31, 32, u32::MAX] {
            let actual = backoff_delay(attempt, &reconnect);
            assert!(
                within_spread(actual, Duration::from_secs(8)),
                "attempt {attempt}: {actual:?} strays from the 8s cap"
            );
        }
    }

    #[test]
    fn huge_delays_saturate() {
        let reconnect = ReconnectConfig {
            initial_delay: Duration::MAX,
            max_delay: Duration::MAX,
            max_retries: None,
        };
        for attempt in (0..64).chain([u32::MAX]) {
            let actual = backoff_delay(attempt, &reconnect);
            assert!(actual > Duration::from_secs(u64::MAX / 2), "attempt {attempt}: {actual:?}");
        }
    }

    #[test]
    fn spread_is_a_function_of_the_attempt() {
        let reconnect = ReconnectConfig::default();
        assert_eq!(backoff_delay(3, &reconnect), backoff_delay(3, &reconnect));
        assert_ne!(backoff_delay(20, &reconnect), backoff_delay(21, &reconnect));
    }

    #[tokio::test]
    async fn connect_rejects_http_scheme() {
        let url = Url::parse("http://127.0.0.1:4000/ws").unwrap();
        let err =
            WebSocketHandle::connect(url, ReconnectConfig::default(), CancellationToken::new())
                .unwrap_err();
        assert!(matches!(err, Error::UnsupportedScheme { ref scheme } if scheme == "http"));
    }

    #[tokio::test]
    async fn gives_up_after_retry_limit() {
        let url = Url::parse("ws://127.0.0.1:1/ws").unwrap();
        let config = ReconnectConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            max_retries: Some(0),
        };
        let (_handle, mut events) =
            WebSocketHandle::connect(url, config, CancellationToken::new()).unwrap();

        let next = tokio::time::timeout(Duration::from_secs(10), events.recv())
            .await
            .unwrap();
        assert_eq!(next, None, "loop should end without ever opening");
    }

    #[tokio::test]
    async fn shutdown_ends_event_stream() {
        let url = Url::parse("ws://127.0.0.1:1/ws").unwrap();
        let cancel = CancellationToken::new();
        let (handle, mut events) =
            WebSocketHandle::connect(url, ReconnectConfig::default(), cancel).unwrap();

        handle.shutdown();
        let next = tokio::time::timeout(Duration::from_secs(10), events.recv())
            .await
            .unwrap();
        assert_eq!(next, None);
        assert!(handle.send("late".into()).is_err());
    }
}
