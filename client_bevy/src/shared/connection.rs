use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::time::Duration;

use bevy::log::{debug, error};
use bevy::prelude::Resource;
use volley_shared::protocol::{ClientMsg, ServerMsg, PROTOCOL_VERSION};

const INITIAL_RECONNECT_DELAY: Duration = Duration::from_millis(1000);
const MAX_RECONNECT_DELAY: Duration = Duration::from_millis(30_000);

#[derive(Debug, Clone)]
pub enum NetEvent {
    Connected,
    Disconnected,
    Message(ServerMsg),
    ProtocolMismatch { server: u32, client: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

type CmdSender = tokio::sync::mpsc::UnboundedSender<ClientMsg>;

/// WebSocket link to the relay server.
///
/// The socket lives on its own thread with a tokio runtime and reconnects
/// with backoff until the server turns out to speak another protocol
/// version. The schedule drains events with [`ServerConnection::poll_events`].
#[derive(Resource)]
pub struct ServerConnection {
    pub state: ConnectionState,
    pub protocol_mismatch: bool,
    event_rx: Mutex<Receiver<NetEvent>>,
    cmd_tx: Option<CmdSender>,
}

impl ServerConnection {
    pub fn new(url: String) -> Self {
        let (event_tx, event_rx) = mpsc::channel::<NetEvent>();
        let cmd_tx = Some(spawn_network_thread(url, event_tx));

        Self {
            state: ConnectionState::Connecting,
            protocol_mismatch: false,
            event_rx: Mutex::new(event_rx),
            cmd_tx,
        }
    }

    pub fn poll_events(&mut self) -> Vec<NetEvent> {
        let mut out = Vec::new();
        if let Ok(rx) = self.event_rx.lock() {
            while let Ok(evt) = rx.try_recv() {
                out.push(evt);
            }
        }
        out
    }

    pub fn send(&self, msg: ClientMsg) {
        if let Some(tx) = &self.cmd_tx {
            let _ = tx.send(msg);
        }
    }

    /// Connection without a socket; events are injected through the returned sender.
    #[cfg(test)]
    pub fn test_stub_with_sender() -> (Self, Sender<NetEvent>) {
        let (event_tx, event_rx) = mpsc::channel::<NetEvent>();
        let conn = Self {
            state: ConnectionState::Connecting,
            protocol_mismatch: false,
            event_rx: Mutex::new(event_rx),
            cmd_tx: None,
        };
        (conn, event_tx)
    }

    /// Like [`test_stub_with_sender`](Self::test_stub_with_sender), also
    /// capturing outbound messages.
    #[cfg(test)]
    pub fn test_stub_with_outbox() -> (
        Self,
        Sender<NetEvent>,
        tokio::sync::mpsc::UnboundedReceiver<ClientMsg>,
    ) {
        let (mut conn, event_tx) = Self::test_stub_with_sender();
        let (cmd_tx, cmd_rx) = tokio::sync::mpsc::unbounded_channel();
        conn.cmd_tx = Some(cmd_tx);
        (conn, event_tx, cmd_rx)
    }
}

fn spawn_network_thread(url: String, event_tx: Sender<NetEvent>) -> CmdSender {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    let (cmd_tx, mut cmd_rx) = tokio::sync::mpsc::unbounded_channel::<ClientMsg>();

    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_io()
            .enable_time()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to build network runtime: {}", e);
                let _ = event_tx.send(NetEvent::Disconnected);
                return;
            }
        };

        rt.block_on(async move {
            let mut reconnect_delay = INITIAL_RECONNECT_DELAY;

            loop {
                let _ = event_tx.send(NetEvent::Disconnected);

                let (ws_stream, _) = match tokio_tungstenite::connect_async(url.as_str()).await {
                    Ok(x) => x,
                    Err(e) => {
                        debug!("Connect to {} failed: {}", url, e);
                        tokio::time::sleep(reconnect_delay).await;
                        reconnect_delay = reconnect_delay.mul_f32(1.5).min(MAX_RECONNECT_DELAY);
                        continue;
                    }
                };

                reconnect_delay = INITIAL_RECONNECT_DELAY;
                let _ = event_tx.send(NetEvent::Connected);

                let (mut write, mut read) = ws_stream.split();
                let mut incompatible = false;

                loop {
                    tokio::select! {
                        biased;

                        Some(cmd) = cmd_rx.recv() => {
                            if let Ok(text) = serde_json::to_string(&cmd) {
                                if write.send(Message::Text(text.into())).await.is_err() {
                                    break;
                                }
                            }
                        }

                        msg = read.next() => {
                            match msg {
                                Some(Ok(Message::Text(txt))) => {
                                    let server_msg = match serde_json::from_str::<ServerMsg>(&txt) {
                                        Ok(m) => m,
                                        Err(e) => {
                                            debug!("Dropping malformed server message: {}", e);
                                            continue;
                                        }
                                    };
                                    if let ServerMsg::PlayerId(p) = &server_msg {
                                        if p.protocol_version != PROTOCOL_VERSION {
                                            let _ = event_tx.send(NetEvent::ProtocolMismatch {
                                                server: p.protocol_version,
                                                client: PROTOCOL_VERSION,
                                            });
                                            let _ = write.close().await;
                                            incompatible = true;
                                            break;
                                        }
                                    }
                                    let _ = event_tx.send(NetEvent::Message(server_msg));
                                }
                                Some(Ok(Message::Close(_))) | None => break,
                                Some(Ok(_)) => {}
                                Some(Err(_)) => break,
                            }
                        }
                    }
                }

                let _ = event_tx.send(NetEvent::Disconnected);
                if incompatible {
                    // Reconnecting cannot fix a version mismatch
                    return;
                }
                tokio::time::sleep(reconnect_delay).await;
                reconnect_delay = reconnect_delay.mul_f32(1.5).min(MAX_RECONNECT_DELAY);
            }
        });
    });

    cmd_tx
}
