//! WebSocket Gateway
//!
//! Single-writer actor around the [`EventRouter`]. Socket handlers submit
//! commands over an unbounded queue; the actor applies them in arrival
//! order and fans the resulting deliveries out to per-connection senders.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::application::services::{Dispatch, EventRouter};
use crate::domain::{ClientEvent, ConnectionId, ServerEvent};
use crate::infrastructure::metrics;

/// Outbound half of a connection, drained by its socket writer.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ServerEvent>;

/// Commands processed by the gateway actor.
#[derive(Debug)]
pub enum GatewayCommand {
    Connect { connection_id: ConnectionId },
    Event { connection_id: ConnectionId, event: ClientEvent },
    Disconnect { connection_id: ConnectionId },
}

/// Handle to the gateway actor.
#[derive(Debug, Clone)]
pub struct Gateway {
    commands: mpsc::UnboundedSender<GatewayCommand>,
    senders: Arc<DashMap<ConnectionId, EventSender>>,
    online_users: Arc<AtomicUsize>,
}

impl Gateway {
    /// Start the actor on the current tokio runtime.
    pub fn spawn() -> Self {
        let (commands, inbox) = mpsc::unbounded_channel();
        let senders = Arc::new(DashMap::new());
        let online_users = Arc::new(AtomicUsize::new(0));

        let actor = GatewayActor {
            router: EventRouter::new(),
            senders: senders.clone(),
            online_users: online_users.clone(),
        };
        tokio::spawn(actor.run(inbox));

        Self {
            commands,
            senders,
            online_users,
        }
    }

    /// Register a new transport connection and return its outbound stream.
    pub fn connect(&self, connection_id: ConnectionId) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(connection_id, tx);
        self.submit(GatewayCommand::Connect { connection_id });
        rx
    }

    pub fn dispatch(&self, connection_id: ConnectionId, event: ClientEvent) {
        self.submit(GatewayCommand::Event { connection_id, event });
    }

    pub fn disconnect(&self, connection_id: ConnectionId) {
        self.submit(GatewayCommand::Disconnect { connection_id });
    }

    /// Open transport connections.
    pub fn session_count(&self) -> usize {
        self.senders.len()
    }

    /// Users with a live registry entry, as of the last processed command.
    pub fn online_user_count(&self) -> usize {
        self.online_users.load(Ordering::Relaxed)
    }

    fn submit(&self, command: GatewayCommand) {
        if self.commands.send(command).is_err() {
            tracing::error!("Gateway actor has stopped");
        }
    }
}

struct GatewayActor {
    router: EventRouter,
    senders: Arc<DashMap<ConnectionId, EventSender>>,
    online_users: Arc<AtomicUsize>,
}

impl GatewayActor {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<GatewayCommand>) {
        tracing::info!("Gateway actor started");
        while let Some(command) = inbox.recv().await {
            self.handle(command);
        }
        tracing::info!("Gateway actor stopped");
    }

    fn handle(&mut self, command: GatewayCommand) {
        let dispatch = match command {
            GatewayCommand::Connect { connection_id } => {
                self.router.connect(connection_id);
                tracing::debug!(connection_id = %connection_id, "Connection opened");
                Dispatch::default()
            }
            GatewayCommand::Event { connection_id, event } => {
                let name = event.event_name();
                metrics::record_realtime_event(name);
                tracing::trace!(connection_id = %connection_id, event = name, "Inbound event");
                self.router.dispatch(connection_id, event)
            }
            GatewayCommand::Disconnect { connection_id } => {
                self.senders.remove(&connection_id);
                let user_id = self
                    .router
                    .connection(connection_id)
                    .and_then(|c| c.user_id.clone());
                tracing::debug!(
                    connection_id = %connection_id,
                    user_id = ?user_id,
                    "Connection closed"
                );
                self.router.disconnect(connection_id)
            }
        };

        self.publish_stats();
        self.deliver(dispatch);
    }

    fn deliver(&self, dispatch: Dispatch) {
        metrics::record_dropped_deliveries("offline", dispatch.dropped);

        let mut closed = 0;
        for delivery in dispatch.deliveries {
            let sent = self
                .senders
                .get(&delivery.target)
                .map(|sender| sender.send(delivery.event).is_ok())
                .unwrap_or(false);
            if !sent {
                tracing::debug!(connection_id = %delivery.target, "Dropping delivery to closed connection");
                closed += 1;
            }
        }
        metrics::record_dropped_deliveries("closed", closed);
    }

    fn publish_stats(&self) {
        let online = self.router.registry().len();
        self.online_users.store(online, Ordering::Relaxed);
        metrics::set_websocket_connections(self.router.connection_count(), online);
    }
}
