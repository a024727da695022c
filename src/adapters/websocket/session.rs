//! Per-connection client session.
//!
//! Bridges one client transport to the hub with two independent pumps:
//!
//! - **read pump**: reads frames under an idle deadline, answers `ping`
//!   messages with `pong` through the hub, ignores anything it doesn't
//!   understand, and tears down on close, error, oversize frame or timeout.
//! - **write pump**: drains the connection's outbound queue, writes each
//!   frame under a deadline and sends a transport ping every `ping_period`.
//!
//! Whichever pump finishes first unregisters the connection. Unregistering
//! closes the outbound queue, which in turn ends the write pump; if the write
//! pump dies first the read pump is aborted.

use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::hub::{ConnectionHub, ConnectionId, OutboundReceiver};
use super::messages::{ClientMessage, OutboundMessage};
use crate::config::HubConfig;
use crate::ports::{Frame, FrameSink, FrameStream, TransportError};

/// Timing and size limits for one client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Deadline for each outbound write.
    pub write_timeout: Duration,
    /// Idle read deadline, reset by every received frame.
    pub pong_wait: Duration,
    /// Interval between transport pings. Must be shorter than `pong_wait`.
    pub ping_period: Duration,
    /// Largest inbound frame accepted.
    pub max_message_bytes: usize,
    /// Capacity of the connection's outbound queue.
    pub send_queue_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&HubConfig::default())
    }
}

impl From<&HubConfig> for SessionSettings {
    fn from(config: &HubConfig) -> Self {
        Self {
            write_timeout: config.write_timeout(),
            pong_wait: config.pong_wait(),
            ping_period: config.ping_period(),
            max_message_bytes: config.max_message_bytes,
            send_queue_capacity: config.send_queue_capacity,
        }
    }
}

/// One live client connection's read/write loops.
pub struct ClientSession {
    hub: Arc<ConnectionHub>,
    connection_id: ConnectionId,
    settings: SessionSettings,
}

impl ClientSession {
    pub fn new(hub: Arc<ConnectionHub>, connection_id: ConnectionId, settings: SessionSettings) -> Self {
        Self {
            hub,
            connection_id,
            settings,
        }
    }

    /// Run both pumps until the connection is torn down.
    ///
    /// The connection must already be registered with the hub and `outbound`
    /// must be the receiver returned alongside it.
    pub async fn run<S, R>(self, sink: S, stream: R, outbound: OutboundReceiver)
    where
        S: FrameSink,
        R: FrameStream,
    {
        let id = self.connection_id;
        debug!(connection_id = %id, "Client session started");

        let mut read_task = tokio::spawn(read_pump(
            Arc::clone(&self.hub),
            id,
            self.settings.clone(),
            stream,
        ));
        let mut write_task = tokio::spawn(write_pump(
            Arc::clone(&self.hub),
            id,
            self.settings.clone(),
            sink,
            outbound,
        ));

        tokio::select! {
            result = &mut write_task => {
                read_task.abort();
                if let Err(e) = result {
                    warn!(connection_id = %id, error = %e, "Write pump ended abnormally");
                }
            }
            result = &mut read_task => {
                if let Err(e) = result {
                    warn!(connection_id = %id, error = %e, "Read pump ended abnormally");
                }
                if let Err(e) = write_task.await {
                    warn!(connection_id = %id, error = %e, "Write pump ended abnormally");
                }
            }
        }

        // Either pump may have been cut short; make sure the hub forgot us.
        self.hub.unregister(&id);
        debug!(connection_id = %id, "Client session ended");
    }
}

async fn read_pump<R: FrameStream>(
    hub: Arc<ConnectionHub>,
    id: ConnectionId,
    settings: SessionSettings,
    mut stream: R,
) {
    loop {
        let frame = match timeout(settings.pong_wait, stream.next()).await {
            Err(_) => {
                debug!(connection_id = %id, "Read deadline exceeded");
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(TransportError::Closed))) => break,
            Ok(Some(Err(e))) => {
                warn!(connection_id = %id, error = %e, "Client read failed");
                break;
            }
            Ok(Some(Ok(frame))) => frame,
        };

        if let Err(e) = check_frame_size(&frame, settings.max_message_bytes) {
            warn!(connection_id = %id, error = %e, "Rejecting inbound frame");
            break;
        }

        match frame {
            Frame::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Ping) => {
                    hub.send_to_connection(&id, OutboundMessage::pong());
                }
                Ok(_) => {}
                Err(e) => debug!(connection_id = %id, error = %e, "Ignoring malformed client frame"),
            },
            Frame::Binary(_) => debug!(connection_id = %id, "Ignoring binary client frame"),
            Frame::Ping(_) | Frame::Pong(_) => {}
            Frame::Close => break,
        }
    }

    hub.unregister(&id);
}

fn check_frame_size(frame: &Frame, limit: usize) -> Result<(), TransportError> {
    let size = frame.len();
    if size > limit {
        return Err(TransportError::FrameTooLarge { size, limit });
    }
    Ok(())
}

async fn write_pump<S: FrameSink>(
    hub: Arc<ConnectionHub>,
    id: ConnectionId,
    settings: SessionSettings,
    mut sink: S,
    mut outbound: OutboundReceiver,
) {
    let mut ticker = interval_at(Instant::now() + settings.ping_period, settings.ping_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            message = outbound.recv() => match message {
                Some(message) => {
                    let text = match message.to_json() {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(connection_id = %id, error = %e, "Failed to serialize outbound message");
                            continue;
                        }
                    };
                    if let Err(e) = write_frame(&mut sink, Frame::Text(text), settings.write_timeout).await {
                        warn!(connection_id = %id, error = %e, "Client write failed");
                        break;
                    }
                }
                None => {
                    // Queue closed: the hub already dropped this connection.
                    let _ = write_frame(&mut sink, Frame::Close, settings.write_timeout).await;
                    break;
                }
            },
            _ = ticker.tick() => {
                if let Err(e) = write_frame(&mut sink, Frame::Ping(Vec::new()), settings.write_timeout).await {
                    warn!(connection_id = %id, error = %e, "Client ping failed");
                    break;
                }
            }
        }
    }

    hub.unregister(&id);
    let _ = timeout(settings.write_timeout, sink.close()).await;
}

async fn write_frame<S: FrameSink>(
    sink: &mut S,
    frame: Frame,
    deadline: Duration,
) -> Result<(), TransportError> {
    match timeout(deadline, sink.send(frame)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Io("write deadline exceeded".to_string())),
    }
}
