use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::Backoff;
use crate::codec::{decode_server, encode_client};
use crate::protocol::{ClientMsg, ServerMsg};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(label)
    }
}

/// Identifies one socket. Callbacks from an older socket are ignored.
pub type Generation = u64;

/// Socket and timer callbacks as reported by a `ChannelHost`, tagged with the
/// generation they belong to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened(Generation),
    Closed(Generation),
    Message(Generation, String),
    ReconnectDue,
}

/// Transport side of the broadcast channel. Implementations report socket
/// events back as `ChannelEvent`s carrying the generation passed to `open`, and
/// report `ChannelEvent::ReconnectDue` when the timer fires.
pub trait ChannelHost {
    fn open(&mut self, generation: Generation);
    fn send_text(&mut self, text: &str) -> bool;
    fn close(&mut self);
    /// Replaces any previously scheduled reconnect.
    fn schedule_reconnect(&mut self, delay: Duration);
    fn cancel_reconnect(&mut self);
}

pub struct SyncChannel<H: ChannelHost> {
    host: H,
    client_id: String,
    state: ConnectionState,
    backoff: Backoff,
    generation: Generation,
    reconnect_scheduled: bool,
}

impl<H: ChannelHost> SyncChannel<H> {
    pub fn new(host: H, client_id: impl Into<String>, backoff: Backoff) -> Self {
        Self {
            host,
            client_id: client_id.into(),
            state: ConnectionState::Disconnected,
            backoff,
            generation: 0,
            reconnect_scheduled: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    pub fn reconnect_scheduled(&self) -> bool {
        self.reconnect_scheduled
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Starts a fresh attempt, abandoning any socket or timer already in
    /// flight.
    pub fn connect(&mut self) {
        self.host.cancel_reconnect();
        self.reconnect_scheduled = false;
        if self.state != ConnectionState::Disconnected {
            self.host.close();
        }
        self.generation = self.generation.wrapping_add(1);
        self.state = ConnectionState::Connecting;
        tracing::info!(generation = self.generation, "connecting");
        self.host.open(self.generation);
    }

    /// Returns true when the open belonged to the current attempt.
    pub fn handle_open(&mut self, generation: Generation) -> bool {
        if generation != self.generation || self.state != ConnectionState::Connecting {
            tracing::debug!(generation, "ignoring stale open");
            return false;
        }
        self.state = ConnectionState::Connected;
        self.backoff.reset();
        tracing::info!(generation, "connected");
        let register = ClientMsg::Register {
            client_id: self.client_id.clone(),
        };
        if !self.send(&register) {
            tracing::warn!("register message was not sent");
        }
        true
    }

    /// Returns true when the close belonged to the current attempt and a
    /// reconnect was scheduled.
    pub fn handle_close(&mut self, generation: Generation) -> bool {
        if generation != self.generation || self.state == ConnectionState::Disconnected {
            tracing::debug!(generation, "ignoring stale close");
            return false;
        }
        self.state = ConnectionState::Disconnected;
        let delay = self.backoff.next_delay();
        self.reconnect_scheduled = true;
        tracing::info!(generation, delay_ms = delay.as_millis() as u64, "disconnected, retrying");
        self.host.schedule_reconnect(delay);
        true
    }

    pub fn handle_reconnect_due(&mut self) {
        self.reconnect_scheduled = false;
        if self.state == ConnectionState::Disconnected {
            self.connect();
        }
    }

    /// Decodes an inbound frame. Malformed frames are logged and dropped.
    pub fn handle_message(&mut self, generation: Generation, text: &str) -> Option<ServerMsg> {
        if generation != self.generation {
            return None;
        }
        match decode_server(text) {
            Ok(msg) => Some(msg),
            Err(err) => {
                tracing::warn!(%err, "dropping malformed broadcast");
                None
            }
        }
    }

    /// Sends only while connected. Returns whether the frame went out.
    pub fn send(&mut self, msg: &ClientMsg) -> bool {
        if !self.is_connected() {
            return false;
        }
        let text = match encode_client(msg) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(%err, "failed to encode client message");
                return false;
            }
        };
        self.host.send_text(&text)
    }

    /// Closes without scheduling a reconnect.
    pub fn disconnect(&mut self) {
        self.host.cancel_reconnect();
        self.reconnect_scheduled = false;
        self.generation = self.generation.wrapping_add(1);
        if self.state != ConnectionState::Disconnected {
            self.host.close();
        }
        self.state = ConnectionState::Disconnected;
    }
}
