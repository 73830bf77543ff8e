use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::api::PixelApi;
use crate::backoff::Backoff;
use crate::bus::{EventBus, Subscription};
use crate::channel::{ChannelEvent, ChannelHost, ConnectionState, Generation, SyncChannel};
use crate::color::Color;
use crate::grid::{cells_from_wire, CellCoord};
use crate::pending::PendingWrites;
use crate::protocol::{PixelUpdate, PlacePixelRequest, ServerMsg, WriteIntent};
use crate::store::ClientStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeOrigin {
    Local,
    Remote,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WriteOutcome {
    Queued,
    Placed,
    Cooldown(f64),
    Rejected(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ClientEvent {
    Connection(ConnectionState),
    Registered { client_id: String },
    PixelChanged { update: PixelUpdate, origin: ChangeOrigin },
    OnlineUsers(u64),
    WriteQueued { intent: WriteIntent, pending: usize },
    WritePlaced { intent: WriteIntent, total_placed: u64 },
    WriteCooldown { intent: WriteIntent, seconds: f64 },
    WriteRejected { intent: WriteIntent, message: String },
}

/// One client session: the broadcast channel, the offline write queue and
/// the confirmable write path, with everything observable through `events`.
pub struct PixelClient<H: ChannelHost, A: PixelApi> {
    channel: RefCell<SyncChannel<H>>,
    pending: RefCell<PendingWrites>,
    api: A,
    store: Rc<dyn ClientStore>,
    events: EventBus<ClientEvent>,
    client_id: String,
    flushing: Cell<bool>,
}

impl<H: ChannelHost, A: PixelApi> PixelClient<H, A> {
    pub fn new(host: H, api: A, store: Rc<dyn ClientStore>, backoff: Backoff) -> Self {
        let client_id = store.client_id();
        Self {
            channel: RefCell::new(SyncChannel::new(host, client_id.clone(), backoff)),
            pending: RefCell::new(PendingWrites::new()),
            api,
            store,
            events: EventBus::new(),
            client_id,
            flushing: Cell::new(false),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn events(&self) -> &EventBus<ClientEvent> {
        &self.events
    }

    pub fn subscribe(&self, listener: impl Fn(&ClientEvent) + 'static) -> Subscription<ClientEvent> {
        self.events.subscribe(listener)
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &Rc<dyn ClientStore> {
        &self.store
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.channel.borrow().state()
    }

    pub fn generation(&self) -> Generation {
        self.channel.borrow().generation()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn pixels_placed(&self) -> u64 {
        self.store.pixels_placed()
    }

    pub fn with_host<R>(&self, action: impl FnOnce(&mut H) -> R) -> R {
        action(self.channel.borrow_mut().host_mut())
    }

    pub fn connect(&self) {
        self.channel.borrow_mut().connect();
        self.publish_state();
    }

    pub fn shutdown(&self) {
        self.channel.borrow_mut().disconnect();
        self.publish_state();
    }

    /// Routes one host callback to the matching handler.
    pub async fn dispatch(&self, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened(generation) => self.on_open(generation).await,
            ChannelEvent::Closed(generation) => self.on_close(generation),
            ChannelEvent::Message(generation, text) => self.on_message(generation, &text),
            ChannelEvent::ReconnectDue => self.on_reconnect_due(),
        }
    }

    /// Socket opened: registers, then replays queued writes in order.
    pub async fn on_open(&self, generation: Generation) {
        let accepted = self.channel.borrow_mut().handle_open(generation);
        if !accepted {
            return;
        }
        self.publish_state();
        self.flush_pending().await;
    }

    pub fn on_close(&self, generation: Generation) {
        let accepted = self.channel.borrow_mut().handle_close(generation);
        if accepted {
            self.publish_state();
        }
    }

    pub fn on_reconnect_due(&self) {
        self.channel.borrow_mut().handle_reconnect_due();
        self.publish_state();
    }

    pub fn on_message(&self, generation: Generation, text: &str) {
        let msg = self.channel.borrow_mut().handle_message(generation, text);
        let Some(msg) = msg else {
            return;
        };
        match msg {
            ServerMsg::RegisterConfirm(confirm) => {
                tracing::info!(client_id = %confirm.client_id, "registration confirmed");
                self.events.publish(&ClientEvent::Registered {
                    client_id: confirm.client_id,
                });
            }
            ServerMsg::PixelUpdate(update) => {
                self.events.publish(&ClientEvent::PixelChanged {
                    update,
                    origin: ChangeOrigin::Remote,
                });
            }
            ServerMsg::UserCount(count) => {
                self.events.publish(&ClientEvent::OnlineUsers(count.count));
            }
            ServerMsg::Unknown(tag) => {
                tracing::debug!(%tag, "ignoring unknown message type");
            }
        }
    }

    /// Places a pixel, or queues it while offline. Writes issued during a
    /// replay queue behind it to keep submission order.
    pub async fn submit_write(&self, intent: WriteIntent) -> WriteOutcome {
        let online = self.channel.borrow().is_connected();
        if !online || self.flushing.get() {
            let pending = {
                let mut queue = self.pending.borrow_mut();
                queue.push(intent.clone());
                queue.len()
            };
            tracing::debug!(x = intent.x, y = intent.y, pending, "write queued");
            self.events
                .publish(&ClientEvent::WriteQueued { intent, pending });
            return WriteOutcome::Queued;
        }
        self.place(intent).await
    }

    /// Replays queued writes one at a time. Stops early if the channel drops;
    /// the rest stay queued for the next open. Returns how many were sent.
    pub async fn flush_pending(&self) -> usize {
        if self.flushing.replace(true) {
            return 0;
        }
        let mut sent = 0;
        loop {
            if !self.channel.borrow().is_connected() {
                break;
            }
            let next = self.pending.borrow().front().cloned();
            let Some(intent) = next else {
                break;
            };
            // Removed only once the authority has answered.
            self.place(intent).await;
            self.pending.borrow_mut().pop();
            sent += 1;
        }
        self.flushing.set(false);
        if sent > 0 {
            tracing::info!(sent, "replayed queued writes");
        }
        sent
    }

    /// Bulk read of the current grid. A failed read leaves the grid empty.
    pub async fn load_initial_grid(&self) -> HashMap<CellCoord, Color> {
        match self.api.fetch_grid().await {
            Ok(response) => cells_from_wire(&response.grid),
            Err(err) => {
                tracing::warn!(%err, "failed to fetch initial grid");
                HashMap::new()
            }
        }
    }

    async fn place(&self, intent: WriteIntent) -> WriteOutcome {
        let request = PlacePixelRequest::new(&intent, &self.client_id);
        match self.api.place_pixel(&request).await {
            Ok(()) => {
                let total_placed = self.store.record_pixel_placed();
                tracing::info!(x = intent.x, y = intent.y, total_placed, "pixel placed");
                self.events.publish(&ClientEvent::PixelChanged {
                    update: intent.clone().into_update(),
                    origin: ChangeOrigin::Local,
                });
                self.events
                    .publish(&ClientEvent::WritePlaced { intent, total_placed });
                WriteOutcome::Placed
            }
            Err(err) => {
                if let Some(seconds) = err.cooldown() {
                    tracing::info!(seconds, "write hit cooldown");
                    self.events
                        .publish(&ClientEvent::WriteCooldown { intent, seconds });
                    return WriteOutcome::Cooldown(seconds);
                }
                let message = err.to_string();
                tracing::warn!(%message, x = intent.x, y = intent.y, "write rejected");
                self.events.publish(&ClientEvent::WriteRejected {
                    intent,
                    message: message.clone(),
                });
                WriteOutcome::Rejected(message)
            }
        }
    }

    fn publish_state(&self) {
        let state = self.connection_state();
        self.events.publish(&ClientEvent::Connection(state));
    }
}
