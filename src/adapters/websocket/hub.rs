//! Connection hub: the authoritative registry of live client connections.
//!
//! Connections are indexed three ways, all mutated under one lock:
//!
//! ```text
//! by_id      connection-1 ─► ClientConnection { user: u-1, tenant: acme, queue }
//!            connection-2 ─► ClientConnection { user: u-2, tenant: acme, queue }
//! by_user    u-1 ─► connection-1      u-2 ─► connection-2
//! by_tenant  acme ─► {connection-1, connection-2}
//! ```
//!
//! Every send is a non-blocking `try_send` into the recipient's bounded
//! queue. A full queue drops the message for that recipient and bumps the
//! dropped-message counter; the sender never waits.
//!
//! Broadcasts go through an internal queue drained by the task spawned in
//! [`ConnectionHub::start`], so each broadcast is applied against a registry
//! snapshot taken when it is processed.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::foundation::{TenantId, UserId};

use super::messages::OutboundMessage;

/// Unique identifier for a client connection.
///
/// Generated server-side when a client connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Create a new random connection ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receiving end of a connection's outbound queue, drained by its session.
pub type OutboundReceiver = mpsc::Receiver<Arc<OutboundMessage>>;

/// A registered client.
///
/// Holds the only sender of the connection's outbound queue, so dropping
/// the registry entry is what closes the queue.
#[derive(Debug)]
pub struct ClientConnection {
    id: ConnectionId,
    user_id: UserId,
    tenant_id: Option<TenantId>,
    sender: mpsc::Sender<Arc<OutboundMessage>>,
}

impl ClientConnection {
    /// Create a connection with a bounded outbound queue of `capacity` messages.
    pub fn new(
        user_id: UserId,
        tenant_id: Option<TenantId>,
        capacity: usize,
    ) -> (Self, OutboundReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let conn = Self {
            id: ConnectionId::new(),
            user_id,
            tenant_id,
            sender,
        };
        (conn, receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn tenant_id(&self) -> Option<&TenantId> {
        self.tenant_id.as_ref()
    }

    fn try_deliver(&self, message: &Arc<OutboundMessage>, dropped: &AtomicU64) -> bool {
        match self.sender.try_send(Arc::clone(message)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    connection_id = %self.id,
                    user_id = %self.user_id,
                    message_type = ?message.message_type,
                    "Outbound queue full, dropping message"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                dropped.fetch_add(1, Ordering::Relaxed);
                debug!(connection_id = %self.id, "Session already gone, dropping message");
                false
            }
        }
    }
}

#[derive(Default)]
struct Registry {
    by_id: HashMap<ConnectionId, ClientConnection>,
    by_user: HashMap<UserId, ConnectionId>,
    by_tenant: HashMap<TenantId, HashSet<ConnectionId>>,
}

/// Registry and router for live client connections.
///
/// # Thread Safety
///
/// One std `RwLock` guards all three indexes. Routing takes it in read mode
/// and never awaits while holding it; registration and unregistration take
/// it in write mode.
pub struct ConnectionHub {
    registry: RwLock<Registry>,
    broadcast_tx: mpsc::Sender<Arc<OutboundMessage>>,
    broadcast_rx: Mutex<Option<mpsc::Receiver<Arc<OutboundMessage>>>>,
    shutdown: watch::Sender<bool>,
    dropped: AtomicU64,
}

impl ConnectionHub {
    /// Create a hub whose broadcast queue holds `broadcast_capacity` messages.
    pub fn new(broadcast_capacity: usize) -> Self {
        let (broadcast_tx, broadcast_rx) = mpsc::channel(broadcast_capacity.max(1));
        let (shutdown, _) = watch::channel(false);
        Self {
            registry: RwLock::new(Registry::default()),
            broadcast_tx,
            broadcast_rx: Mutex::new(Some(broadcast_rx)),
            shutdown,
            dropped: AtomicU64::new(0),
        }
    }

    /// Spawn the broadcast loop.
    ///
    /// Returns `None` if the hub was already started.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let mut rx = self
            .broadcast_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        let mut shutdown = self.shutdown.subscribe();
        let hub = Arc::clone(self);

        info!("Connection hub started");
        Some(tokio::spawn(async move {
            if *shutdown.borrow() {
                return;
            }
            loop {
                tokio::select! {
                    message = rx.recv() => match message {
                        Some(message) => hub.fan_out(&message),
                        None => break,
                    },
                    _ = shutdown.changed() => break,
                }
            }
            info!("Connection hub broadcast loop stopped");
        }))
    }

    /// Stop the broadcast loop. Registered connections are left alone.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    /// Add a connection to all indexes.
    ///
    /// A second connection for the same user takes over the by-user entry.
    pub fn register(&self, conn: ClientConnection) -> ConnectionId {
        let id = conn.id;
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);

        registry.by_user.insert(conn.user_id.clone(), id);
        if let Some(tenant_id) = &conn.tenant_id {
            registry
                .by_tenant
                .entry(tenant_id.clone())
                .or_default()
                .insert(id);
        }
        info!(
            connection_id = %id,
            user_id = %conn.user_id,
            tenant_id = ?conn.tenant_id.as_ref().map(TenantId::as_str),
            "Client registered"
        );
        registry.by_id.insert(id, conn);
        id
    }

    /// Remove a connection from all indexes and close its outbound queue.
    ///
    /// Returns false if the connection was not registered.
    pub fn unregister(&self, id: &ConnectionId) -> bool {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);

        let Some(conn) = registry.by_id.remove(id) else {
            return false;
        };

        if registry.by_user.get(&conn.user_id) == Some(id) {
            registry.by_user.remove(&conn.user_id);
        }
        if let Some(tenant_id) = &conn.tenant_id {
            if let Some(members) = registry.by_tenant.get_mut(tenant_id) {
                members.remove(id);
                if members.is_empty() {
                    registry.by_tenant.remove(tenant_id);
                }
            }
        }
        drop(registry);

        info!(connection_id = %id, user_id = %conn.user_id, "Client unregistered");
        // Dropping the only sender closes the queue.
        drop(conn);
        true
    }

    /// Deliver to the user's connection, if any. Returns true if enqueued.
    pub fn send_to_user(&self, user_id: &UserId, message: OutboundMessage) -> bool {
        let message = Arc::new(message);
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);

        registry
            .by_user
            .get(user_id)
            .and_then(|id| registry.by_id.get(id))
            .map(|conn| conn.try_deliver(&message, &self.dropped))
            .unwrap_or(false)
    }

    /// Deliver to every connection of a tenant. Returns how many enqueued it.
    pub fn send_to_tenant(&self, tenant_id: &TenantId, message: OutboundMessage) -> usize {
        let message = Arc::new(message);
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);

        let Some(members) = registry.by_tenant.get(tenant_id) else {
            return 0;
        };
        members
            .iter()
            .filter_map(|id| registry.by_id.get(id))
            .filter(|conn| conn.try_deliver(&message, &self.dropped))
            .count()
    }

    /// Deliver to one specific connection. Returns true if enqueued.
    pub fn send_to_connection(&self, id: &ConnectionId, message: OutboundMessage) -> bool {
        let message = Arc::new(message);
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);

        registry
            .by_id
            .get(id)
            .map(|conn| conn.try_deliver(&message, &self.dropped))
            .unwrap_or(false)
    }

    /// Queue a message for every registered connection.
    ///
    /// Returns false if the message was dropped, either because the queue
    /// was full or because the hub was stopped and nothing drains it.
    pub fn broadcast(&self, message: OutboundMessage) -> bool {
        if *self.shutdown.borrow() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!("Hub stopped, dropping broadcast");
            return false;
        }
        match self.broadcast_tx.try_send(Arc::new(message)) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Broadcast queue full, dropping message");
                false
            }
        }
    }

    fn fan_out(&self, message: &Arc<OutboundMessage>) {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        let delivered = registry
            .by_id
            .values()
            .filter(|conn| conn.try_deliver(message, &self.dropped))
            .count();
        debug!(
            message_type = ?message.message_type,
            delivered,
            total = registry.by_id.len(),
            "Broadcast delivered"
        );
    }

    /// Number of registered connections.
    pub fn online_count(&self) -> usize {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .len()
    }

    /// Number of registered connections for a tenant.
    pub fn tenant_online_count(&self, tenant_id: &TenantId) -> usize {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_tenant
            .get(tenant_id)
            .map(HashSet::len)
            .unwrap_or(0)
    }

    /// Returns true if the user currently has a connection.
    pub fn is_user_online(&self, user_id: &UserId) -> bool {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_user
            .contains_key(user_id)
    }

    /// Messages dropped so far because a queue was full or closed.
    pub fn dropped_messages(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
