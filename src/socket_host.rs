use std::rc::Rc;
use std::time::Duration;

use gloo::timers::callback::Timeout;
use pixelbattle_core::{ChannelEvent, ChannelHost, Generation};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

pub(crate) type EventSink = Rc<dyn Fn(ChannelEvent)>;

#[allow(dead_code)]
struct SocketHandlers {
    onopen: Closure<dyn FnMut(Event)>,
    onmessage: Closure<dyn FnMut(MessageEvent)>,
    onerror: Closure<dyn FnMut(Event)>,
    onclose: Closure<dyn FnMut(CloseEvent)>,
}

/// `WebSocket` transport. Every callback is forwarded to `sink` tagged with
/// the generation the socket was opened for.
pub(crate) struct BrowserHost {
    url: String,
    sink: EventSink,
    socket: Option<WebSocket>,
    handlers: Option<SocketHandlers>,
    reconnect: Option<Timeout>,
}

impl BrowserHost {
    pub(crate) fn new(url: String, sink: EventSink) -> Self {
        Self {
            url,
            sink,
            socket: None,
            handlers: None,
            reconnect: None,
        }
    }
}

impl ChannelHost for BrowserHost {
    fn open(&mut self, generation: Generation) {
        self.close();
        let socket = match WebSocket::new(&self.url) {
            Ok(socket) => socket,
            Err(err) => {
                tracing::warn!(url = %self.url, ?err, "failed to open websocket");
                // The channel is mid-transition; report the failure later.
                let sink = self.sink.clone();
                spawn_local(async move { sink(ChannelEvent::Closed(generation)) });
                return;
            }
        };

        let onopen = {
            let sink = self.sink.clone();
            Closure::wrap(Box::new(move |_event: Event| {
                sink(ChannelEvent::Opened(generation));
            }) as Box<dyn FnMut(Event)>)
        };
        let onmessage = {
            let sink = self.sink.clone();
            Closure::wrap(Box::new(move |event: MessageEvent| {
                let Some(text) = event.data().as_string() else {
                    tracing::debug!("ignoring non-text frame");
                    return;
                };
                sink(ChannelEvent::Message(generation, text));
            }) as Box<dyn FnMut(MessageEvent)>)
        };
        let onerror = {
            let url = self.url.clone();
            Closure::wrap(Box::new(move |_event: Event| {
                tracing::warn!(%url, "websocket error");
            }) as Box<dyn FnMut(Event)>)
        };
        let onclose = {
            let sink = self.sink.clone();
            Closure::wrap(Box::new(move |event: CloseEvent| {
                tracing::info!(code = event.code(), reason = %event.reason(), "websocket closed");
                sink(ChannelEvent::Closed(generation));
            }) as Box<dyn FnMut(CloseEvent)>)
        };

        socket.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        socket.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        socket.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        socket.set_onclose(Some(onclose.as_ref().unchecked_ref()));

        self.socket = Some(socket);
        self.handlers = Some(SocketHandlers {
            onopen,
            onmessage,
            onerror,
            onclose,
        });
    }

    fn send_text(&mut self, text: &str) -> bool {
        let Some(socket) = &self.socket else {
            return false;
        };
        if socket.ready_state() != WebSocket::OPEN {
            return false;
        }
        socket.send_with_str(text).is_ok()
    }

    fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            socket.set_onopen(None);
            socket.set_onmessage(None);
            socket.set_onerror(None);
            socket.set_onclose(None);
            let _ = socket.close();
        }
        self.handlers = None;
    }

    fn schedule_reconnect(&mut self, delay: Duration) {
        let sink = self.sink.clone();
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        self.reconnect = Some(Timeout::new(millis, move || {
            sink(ChannelEvent::ReconnectDue);
        }));
    }

    fn cancel_reconnect(&mut self) {
        // Dropping the timeout clears it.
        self.reconnect = None;
    }
}

impl Drop for BrowserHost {
    fn drop(&mut self) {
        self.close();
        self.cancel_reconnect();
    }
}
