//! Per-bot gateway session: endpoint acquisition, the long-lived websocket
//! under the heartbeat contract, and unbounded reconnection.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use crate::bot::{DodoBot, EventHandler};
use crate::event::{decode_frame, DispatchResult};
use crate::model::BotInfo;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
const RECONNECT_INTERVAL: Duration = Duration::from_secs(5);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection state of one gateway session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Connected,
    Disconnected,
    Stopped,
}

type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Owns one bot's realtime connection. Created by the runtime, runs as one
/// task until shutdown.
pub struct GatewaySession {
    bot: Arc<DodoBot>,
    handler: Arc<dyn EventHandler>,
    state: watch::Sender<SessionState>,
    heartbeat_interval: Duration,
    reconnect_interval: Duration,
}

impl GatewaySession {
    pub fn new(bot: Arc<DodoBot>, handler: Arc<dyn EventHandler>) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            bot,
            handler,
            state,
            heartbeat_interval: HEARTBEAT_INTERVAL,
            reconnect_interval: RECONNECT_INTERVAL,
        }
    }

    /// Overrides the heartbeat cadence (tests compress time with this).
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Overrides the reconnect delay (tests compress time with this).
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Observes state transitions; usable before [`run`](Self::run) consumes
    /// the session. The channel closes when the session task is gone.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: SessionState) {
        debug!(client_id = %self.bot.client_id(), state = ?state, "session state");
        self.state.send_replace(state);
    }

    /// Runs the session to completion. Identity and endpoint are fetched
    /// once; a failure there stops the session (a bad credential will not
    /// self-heal). After that the connect/receive cycle retries forever.
    pub async fn run(self) {
        self.set_state(SessionState::Connecting);

        let bot_info = match self.bot.get_bot_info().await {
            Ok(info) => info,
            Err(e) => {
                error!(client_id = %self.bot.client_id(), error = %e, "failed to get bot info, session stopped");
                self.set_state(SessionState::Stopped);
                return;
            }
        };
        let endpoint = match self.bot.get_websocket_connection().await {
            Ok(connection) => connection.endpoint,
            Err(e) => {
                error!(client_id = %self.bot.client_id(), error = %e, "failed to get websocket url, session stopped");
                self.set_state(SessionState::Stopped);
                return;
            }
        };

        // Outstanding per-event dispatches. Dropped with the session, which
        // aborts whatever is still running at shutdown.
        let mut dispatches = JoinSet::new();

        loop {
            match timeout(CONNECT_TIMEOUT, connect_async(endpoint.as_str())).await {
                Ok(Ok((stream, _))) => {
                    debug!(endpoint = %endpoint, "websocket connection established");
                    self.set_state(SessionState::Connected);
                    self.handler.on_connect(&bot_info).await;

                    let (writer, reader) = stream.split();
                    let heartbeat =
                        tokio::spawn(heartbeat_loop(writer, self.heartbeat_interval));

                    self.receive_loop(reader, &bot_info, &mut dispatches).await;

                    heartbeat.abort();
                    self.set_state(SessionState::Disconnected);
                    self.handler.on_disconnect(&bot_info).await;
                }
                Ok(Err(e)) => {
                    error!(endpoint = %endpoint, error = %e, "error while opening websocket, trying to reconnect");
                    self.set_state(SessionState::Disconnected);
                }
                Err(_) => {
                    error!(endpoint = %endpoint, "websocket open timed out, trying to reconnect");
                    self.set_state(SessionState::Disconnected);
                }
            }
            sleep(self.reconnect_interval).await;
            self.set_state(SessionState::Connecting);
        }
    }

    /// Consumes inbound frames in arrival order until close or I/O error.
    /// Each decoded event is handed off to its own task so a slow handler
    /// never stalls frame consumption or the heartbeat cadence.
    async fn receive_loop(
        &self,
        mut reader: WsReader,
        bot_info: &BotInfo,
        dispatches: &mut JoinSet<()>,
    ) {
        while let Some(frame) = reader.next().await {
            // Reap finished dispatch tasks as we go.
            while dispatches.try_join_next().is_some() {}

            let text = match frame {
                Ok(WsMessage::Text(text)) => text,
                Ok(WsMessage::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => {
                        warn!("discarding non-utf8 binary frame");
                        continue;
                    }
                },
                Ok(WsMessage::Close(close)) => {
                    warn!(close = ?close, "websocket closed by server");
                    return;
                }
                Ok(_) => continue,
                Err(e) => {
                    error!(error = %e, "websocket read error");
                    return;
                }
            };

            match decode_frame(&text) {
                DispatchResult::Heartbeat => {
                    trace!("received heartbeat ack");
                }
                DispatchResult::Event(mut event) => {
                    event.prepare(&bot_info.dodo_source_id);
                    let handler = self.handler.clone();
                    let bot = self.bot.clone();
                    dispatches.spawn(async move {
                        handler.dispatch(bot, event).await;
                    });
                }
                DispatchResult::DecodeError { payload, error } => {
                    warn!(error = %error, payload = %payload, "failed to parse event frame");
                }
            }
        }
    }
}

/// Sends the `{"type":1}` heartbeat frame on a fixed cadence for the lifetime
/// of one connection. Only this task writes to the connection.
async fn heartbeat_loop(mut writer: WsWriter, interval: Duration) {
    loop {
        sleep(interval).await;
        if let Err(e) = writer.send(WsMessage::Text(r#"{"type":1}"#.to_string())).await {
            warn!(error = %e, "failed to send heartbeat");
            return;
        }
        trace!("sent heartbeat");
    }
}
