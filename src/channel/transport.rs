//! WebSocket transport.
//!
//! Each connection attempt runs on its own thread with a blocking tungstenite
//! socket. Reads poll with a short timeout so the thread can interleave
//! outbound payloads; everything observed is reported to the client loop as
//! [`ChannelEvent`]s.
//!
//! ```text
//! client loop --OutboundLink--> [crossbeam] --> ws thread --> server
//!      ^                                            |
//!      +------------- ChannelEvent (mpsc) ----------+
//! ```

use std::io::ErrorKind;
use std::net::TcpStream;
use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;
use tungstenite::protocol::Message;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Error as WsError, WebSocket};
use url::Url;

use super::{ChannelEvent, Connector, OutboundLink};

/// How long a read blocks before outbound payloads get a turn
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct WsConnector {
    url: Url,
}

impl WsConnector {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Connector for WsConnector {
    fn connect(&self, events: mpsc::UnboundedSender<ChannelEvent>) {
        let url = self.url.clone();
        let fallback = events.clone();
        let spawned = std::thread::Builder::new()
            .name("reserve-ws".into())
            .spawn(move || run_connection(&url, &events));

        if let Err(e) = spawned {
            crate::log!("error"; "cannot start connection thread: {}", e);
            let _ = fallback.send(ChannelEvent::Closed { unsent: Vec::new() });
        }
    }
}

fn run_connection(url: &Url, events: &mpsc::UnboundedSender<ChannelEvent>) {
    let closed = |unsent| {
        let _ = events.send(ChannelEvent::Closed { unsent });
    };

    let mut ws = match open(url) {
        Ok(ws) => ws,
        Err(e) => {
            crate::debug!("channel"; "connect to {} failed: {}", url, e);
            return closed(Vec::new());
        }
    };

    let (link, outbox) = OutboundLink::channel();
    if events.send(ChannelEvent::Open(link)).is_err() {
        // Client is gone
        let _ = ws.close(None);
        return;
    }
    crate::debug!("channel"; "connected to {}", url);

    let unsent = pump(&mut ws, &outbox, events);
    let _ = ws.close(None);
    closed(unsent)
}

/// Connect and handshake, over TLS for `wss`.
///
/// The read timeout goes on once the handshake is done, through a clone of
/// the socket, so it covers plain and TLS streams alike.
fn open(url: &Url) -> anyhow::Result<WebSocket<MaybeTlsStream<TcpStream>>> {
    let addrs = url.socket_addrs(|| match url.scheme() {
        "wss" => Some(443),
        _ => Some(80),
    })?;
    let stream = TcpStream::connect(&*addrs)?;
    let socket = stream.try_clone()?;

    let (ws, _) = tungstenite::client_tls(url.as_str(), stream)
        .map_err(|e| anyhow::anyhow!("handshake failed: {e}"))?;
    socket.set_read_timeout(Some(POLL_INTERVAL))?;
    Ok(ws)
}

/// Shuttle frames until the connection ends.
///
/// Returns the payload that was being written when the connection failed.
fn pump(
    ws: &mut WebSocket<MaybeTlsStream<TcpStream>>,
    outbox: &Receiver<String>,
    events: &mpsc::UnboundedSender<ChannelEvent>,
) -> Vec<String> {
    loop {
        while let Ok(payload) = outbox.try_recv() {
            if let Err(e) = ws.send(Message::Text(payload.clone().into())) {
                crate::debug!("channel"; "send failed: {}", e);
                return vec![payload];
            }
        }

        match ws.read() {
            Ok(Message::Text(text)) => {
                if events.send(ChannelEvent::Frame(text.as_str().to_owned())).is_err() {
                    return Vec::new();
                }
            }
            Ok(Message::Close(_)) => {
                crate::debug!("channel"; "server closed the connection");
                return Vec::new();
            }
            // Ping/pong are answered by tungstenite; binary frames carry nothing for us
            Ok(_) => {}
            Err(WsError::Io(ref e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) => {
                crate::debug!("channel"; "connection lost: {}", e);
                return Vec::new();
            }
        }
    }
}
