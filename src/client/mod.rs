//! Live Client
//!
//! Root component: owns the handler cache, the ignore filter, the hook
//! registry, the outbound queue and the channel state machine, and drives
//! them from one event loop.
//!
//! ```text
//!                 ChannelEvent               change
//! Connector ------------------> LiveClient ---------> Handler --> Page
//!                                  ^   |
//!          ClientMsg (broadcast,   |   +--> Outbound --> Connector
//!          shutdown)               |
//!            Page / ClientHandle --+
//! ```
//!
//! # Module Structure
//!
//! - `messages` - `ClientMsg`
//! - `dispatch` - inbound frame and change handling

mod dispatch;
mod messages;


use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Sleep;

pub use dispatch::ChangeOutcome;
pub use messages::ClientMsg;

use crate::channel::{ChannelEvent, ChannelState, Connector, Outbound, WsConnector, encode_broadcast};
use crate::config::{ClientConfig, ConfigError};
use crate::hooks::{HandlerCache, HookRegistry};
use crate::ignore::{IgnoreFilter, IgnoreObserver};
use crate::net::{HttpFetcher, ResourceFetcher};
use crate::page::{ReloadKind, SharedPage};
use crate::swap::{ModuleCache, SwapEngine};
use crate::{debug, log};

// =============================================================================
// LiveClient
// =============================================================================

pub struct LiveClient {
    config: Arc<ClientConfig>,
    page: SharedPage,
    hooks: HookRegistry,
    handlers: HandlerCache,
    ignore: Arc<IgnoreFilter>,
    swap: SwapEngine,
    connector: Arc<dyn Connector>,
    outbound: Outbound,
    state: ChannelState,
    /// Whether any connection attempt has opened so far
    was_open: bool,
    /// Pending reconnect, armed on close
    reconnect: Option<Pin<Box<Sleep>>>,
    events_tx: mpsc::UnboundedSender<ChannelEvent>,
    events_rx: mpsc::UnboundedReceiver<ChannelEvent>,
    msg_rx: mpsc::UnboundedReceiver<ClientMsg>,
}

impl LiveClient {
    pub fn builder(config: Arc<ClientConfig>, page: SharedPage) -> LiveClientBuilder {
        LiveClientBuilder {
            config,
            page,
            connector: None,
            fetcher: None,
            modules: None,
            hooks: HookRegistry::with_defaults(),
        }
    }

    #[inline]
    pub fn page(&self) -> &SharedPage {
        &self.page
    }

    #[inline]
    pub fn state(&self) -> ChannelState {
        self.state
    }

    #[inline]
    pub fn handlers(&self) -> &HandlerCache {
        &self.handlers
    }

    #[inline]
    pub fn ignore(&self) -> &Arc<IgnoreFilter> {
        &self.ignore
    }

    #[inline]
    pub fn swap(&self) -> &SwapEngine {
        &self.swap
    }

    /// Payloads waiting for the channel to open.
    pub fn pending_broadcasts(&self) -> usize {
        self.outbound.len()
    }

    /// Run until shut down through a [`ClientHandle`].
    pub async fn run(mut self) {
        self.ignore.reload().await;
        self.connect();

        loop {
            tokio::select! {
                Some(event) = self.events_rx.recv() => self.on_channel_event(event).await,
                msg = self.msg_rx.recv() => match msg {
                    Some(ClientMsg::SendBroadcast(payload)) => self.send_broadcast(&payload),
                    Some(ClientMsg::Shutdown) | None => break,
                },
                () = reconnect_due(&mut self.reconnect) => {
                    self.reconnect = None;
                    self.connect();
                }
            }
        }

        debug!("channel"; "client stopped");
    }

    /// Serialize a payload and send it, or queue it while the channel is down.
    pub fn send_broadcast(&mut self, payload: &Value) {
        self.outbound.send(encode_broadcast(payload));
    }

    fn connect(&mut self) {
        self.state = ChannelState::Connecting;
        debug!("channel"; "connecting");
        self.connector.connect(self.events_tx.clone());
    }

    async fn on_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Open(link) => {
                self.state = ChannelState::Open;
                let flushed = self.outbound.open(link);
                log!("channel"; "connected");
                if flushed > 0 {
                    debug!("channel"; "flushed {} queued broadcast(s)", flushed);
                }

                if self.was_open && self.config.channel.reload_on_reconnect {
                    self.page.lock().reload(ReloadKind::Hard);
                }
                self.was_open = true;
            }
            ChannelEvent::Frame(text) => self.handle_frame(&text).await,
            ChannelEvent::Closed { unsent } => {
                if self.state == ChannelState::Open {
                    log!("channel"; "disconnected, retrying");
                }
                self.state = ChannelState::Closed;
                self.outbound.close(unsent);

                let delay = self.config.channel.reconnect_delay();
                self.reconnect = Some(Box::pin(tokio::time::sleep(delay)));
            }
        }
    }
}

/// Resolves when the armed reconnect timer fires; never, if none is armed.
async fn reconnect_due(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

impl fmt::Debug for LiveClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveClient")
            .field("state", &self.state)
            .field("hooks", &self.hooks)
            .field("handlers", &self.handlers.len())
            .field("outbound", &self.outbound)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Collaborators default to the real ones: websocket connector on the page's
/// host, HTTP fetcher, empty module cache, `html` and `js` hooks.
pub struct LiveClientBuilder {
    config: Arc<ClientConfig>,
    page: SharedPage,
    connector: Option<Arc<dyn Connector>>,
    fetcher: Option<Arc<dyn ResourceFetcher>>,
    modules: Option<Arc<ModuleCache>>,
    hooks: HookRegistry,
}

impl LiveClientBuilder {
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Fetcher for the ignore resource.
    pub fn fetcher(mut self, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Module cache shared with the embedder.
    pub fn modules(mut self, modules: Arc<ModuleCache>) -> Self {
        self.modules = Some(modules);
        self
    }

    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    /// Wire the client into the page.
    ///
    /// Registers the ignore filter as a source-change observer and attaches
    /// the broadcast sender. URLs derive from the page location.
    pub fn build(self) -> Result<(LiveClient, ClientHandle), ConfigError> {
        let location = self.page.lock().location().clone();

        let connector = match self.connector {
            Some(connector) => connector,
            None => Arc::new(WsConnector::new(self.config.socket_url(&location)?)),
        };
        let fetcher = self
            .fetcher
            .unwrap_or_else(|| Arc::new(HttpFetcher::new()));
        let ignore = Arc::new(IgnoreFilter::new(
            self.config.ignore_url(&location)?,
            fetcher,
        ));
        let modules = self.modules.unwrap_or_default();
        let swap = SwapEngine::new(modules).with_timeout(self.config.swap.timeout());

        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        {
            let mut page = self.page.lock();
            page.add_observer(Arc::new(IgnoreObserver(Arc::clone(&ignore))));
            page.attach_client(msg_tx.clone());
        }

        let handle = ClientHandle {
            tx: msg_tx,
            page: Arc::clone(&self.page),
        };
        let client = LiveClient {
            config: self.config,
            page: self.page,
            hooks: self.hooks,
            handlers: HandlerCache::new(),
            ignore,
            swap,
            connector,
            outbound: Outbound::new(),
            state: ChannelState::Connecting,
            was_open: false,
            reconnect: None,
            events_tx,
            events_rx,
            msg_rx,
        };
        Ok((client, handle))
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Cloneable handle to a running client.
#[derive(Clone)]
pub struct ClientHandle {
    tx: mpsc::UnboundedSender<ClientMsg>,
    page: SharedPage,
}

impl ClientHandle {
    /// Send (or queue) a broadcast. Returns false once the client stopped.
    pub fn send_broadcast(&self, payload: Value) -> bool {
        self.tx.send(ClientMsg::SendBroadcast(payload)).is_ok()
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(ClientMsg::Shutdown);
    }

    #[inline]
    pub fn page(&self) -> &SharedPage {
        &self.page
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}
